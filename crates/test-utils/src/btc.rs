//! Builders for base chain blocks and transactions used in tests.

use bitcoin::{
    absolute::LockTime,
    block::{Header, Version as BlockVersion},
    hashes::Hash as _,
    opcodes::all::OP_RETURN,
    script::{Builder, PushBytesBuf},
    transaction::Version,
    Amount, Block, BlockHash, CompactTarget, OutPoint, PubkeyHash, ScriptBuf, Sequence,
    Transaction, TxIn, TxMerkleNode, TxOut, Txid, Witness,
};

/// Regtest style initial subsidy.
pub const INITIAL_SUBSIDY: Amount = Amount::from_sat(50 * 100_000_000);

/// A P2PKH script over a repeated byte.
pub fn p2pkh_script(byte: u8) -> ScriptBuf {
    ScriptBuf::new_p2pkh(&PubkeyHash::from_byte_array([byte; 20]))
}

/// `OP_RETURN <data>` with a single push.
pub fn op_return_push(data: &[u8]) -> ScriptBuf {
    let push = PushBytesBuf::try_from(data.to_vec()).expect("test: push too large");
    Builder::new()
        .push_opcode(OP_RETURN)
        .push_slice(push)
        .into_script()
}

/// An outpoint with a synthetic txid.
pub fn outpoint(byte: u8, vout: u32) -> OutPoint {
    OutPoint {
        txid: Txid::from_byte_array([byte; 32]),
        vout,
    }
}

pub fn make_tx(inputs: &[OutPoint], outputs: Vec<TxOut>) -> Transaction {
    Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: inputs
            .iter()
            .map(|prev| TxIn {
                previous_output: *prev,
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: Witness::new(),
            })
            .collect(),
        output: outputs,
    }
}

pub fn txout(sats: u64, script_pubkey: ScriptBuf) -> TxOut {
    TxOut {
        value: Amount::from_sat(sats),
        script_pubkey,
    }
}

/// A coinbase paying `reward` first, followed by zero valued message outputs.
pub fn make_coinbase(height: u64, reward: Amount, messages: Vec<ScriptBuf>) -> Transaction {
    let mut output = vec![TxOut {
        value: reward,
        script_pubkey: p2pkh_script(0xcb),
    }];
    output.extend(messages.into_iter().map(|script_pubkey| TxOut {
        value: Amount::ZERO,
        script_pubkey,
    }));

    Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output: OutPoint::null(),
            script_sig: Builder::new().push_int(height as i64).into_script(),
            sequence: Sequence::MAX,
            witness: Witness::new(),
        }],
        output,
    }
}

/// Assembles a block with a valid merkle root. No proof of work.
pub fn make_block(prev: BlockHash, time: u32, txdata: Vec<Transaction>) -> Block {
    let mut block = Block {
        header: Header {
            version: BlockVersion::TWO,
            prev_blockhash: prev,
            merkle_root: TxMerkleNode::all_zeros(),
            time,
            bits: CompactTarget::from_consensus(0x207f_ffff),
            nonce: 0,
        },
        txdata,
    };
    if let Some(root) = block.compute_merkle_root() {
        block.header.merkle_root = root;
    }
    block
}

/// Builds `n` empty blocks on top of `prev`, each with just a coinbase.
pub fn make_chain(prev: BlockHash, start_height: u64, n: usize) -> Vec<Block> {
    let mut prev = prev;
    let mut blocks = Vec::with_capacity(n);
    for i in 0..n as u64 {
        let height = start_height + i;
        let cb = make_coinbase(height, INITIAL_SUBSIDY, vec![]);
        let block = make_block(prev, 1_600_000_000 + height as u32, vec![cb]);
        prev = block.block_hash();
        blocks.push(block);
    }
    blocks
}
