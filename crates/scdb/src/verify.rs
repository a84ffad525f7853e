//! Deposit and BMM verification against stored blocks.

use std::{collections::BTreeMap, sync::Arc};

use bitcoin::Block;
use drivechain_db_types::traits::BlockArchiveDatabase;
use drivechain_primitives::Buf32;
use drivechain_scdb_types::{extract_bmm_hash, Sidechain, SidechainDeposit};

use crate::{
    ctip::decode_deposit,
    errors::{ScdbError, ScdbResult},
};

/// Read access to the base chain. Unknown blocks are `None`, never an error.
pub trait ChainView: Send + Sync + 'static {
    fn block_by_hash(&self, hash: &Buf32) -> ScdbResult<Option<Block>>;

    fn is_on_active_chain(&self, hash: &Buf32) -> ScdbResult<bool>;

    /// Height of the active tip, `None` before any block is known.
    fn current_height(&self) -> ScdbResult<Option<u64>>;

    fn block_hash_at_height(&self, height: u64) -> ScdbResult<Option<Buf32>>;
}

/// [`ChainView`] over the node's block archive.
#[derive(Debug)]
pub struct ArchiveChainView<D> {
    db: Arc<D>,
}

impl<D> ArchiveChainView<D> {
    pub fn new(db: Arc<D>) -> Self {
        Self { db }
    }
}

impl<D: BlockArchiveDatabase> ChainView for ArchiveChainView<D> {
    fn block_by_hash(&self, hash: &Buf32) -> ScdbResult<Option<Block>> {
        Ok(self.db.get_block(*hash)?)
    }

    fn is_on_active_chain(&self, hash: &Buf32) -> ScdbResult<bool> {
        let Some(height) = self.db.get_block_height(*hash)? else {
            return Ok(false);
        };
        Ok(self.db.get_canonical_hash(height)? == Some(*hash))
    }

    fn current_height(&self) -> ScdbResult<Option<u64>> {
        Ok(self.db.get_canonical_tip()?.map(|(h, _)| h))
    }

    fn block_hash_at_height(&self, height: u64) -> ScdbResult<Option<Buf32>> {
        Ok(self.db.get_canonical_hash(height)?)
    }
}

/// Where an h* commitment was found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BmmProof {
    /// Coinbase txid.
    pub txid: Buf32,
    /// Block timestamp.
    pub time: u32,
}

/// Looks for a BMM commitment to `h_star` in the coinbase of `hash_block`.
pub fn verify_bmm(
    chain: &dyn ChainView,
    hash_block: &Buf32,
    h_star: &Buf32,
) -> ScdbResult<BmmProof> {
    let block = chain
        .block_by_hash(hash_block)?
        .ok_or_else(|| ScdbError::not_found("Block not found"))?;
    let coinbase = block
        .txdata
        .first()
        .ok_or_else(|| ScdbError::not_found("No txns in block"))?;

    coinbase
        .output
        .iter()
        .filter_map(|o| extract_bmm_hash(&o.script_pubkey))
        .find(|h| h == h_star)
        .map(|_| BmmProof {
            txid: coinbase.compute_txid().into(),
            time: block.header.time,
        })
        .ok_or_else(|| ScdbError::not_found("h* not found in block"))
}

/// Checks a cached deposit against the block it claims to be in.
pub fn verify_deposit(
    chain: &dyn ChainView,
    deposits: &[SidechainDeposit],
    sidechains: &BTreeMap<u8, Sidechain>,
    hash_block: &Buf32,
    txid: &Buf32,
    n_tx: u32,
) -> ScdbResult<SidechainDeposit> {
    let block = chain
        .block_by_hash(hash_block)?
        .ok_or_else(|| ScdbError::not_found("Block not found"))?;
    if !chain.is_on_active_chain(hash_block)? {
        return Err(ScdbError::not_found("Block is not on the active chain"));
    }

    let cached = deposits
        .iter()
        .find(|d| d.txid() == *txid && d.hash_block == *hash_block && d.n_tx == n_tx)
        .ok_or_else(|| ScdbError::not_found("SCDB does not know deposit"))?;

    if block.txdata.is_empty() {
        return Err(ScdbError::not_found("No txns in block"));
    }
    let tx = block
        .txdata
        .get(n_tx as usize)
        .ok_or_else(|| ScdbError::invalid_input("nTx out of range for block"))?;
    if Buf32::from(tx.compute_txid()) != *txid {
        return Err(ScdbError::invalid_input(
            "Transaction at block index specified does not match txid",
        ));
    }

    match decode_deposit(tx, sidechains) {
        Some(d)
            if d.n_sidechain == cached.n_sidechain && d.n_burn_index == cached.n_burn_index =>
        {
            Ok(cached.clone())
        }
        _ => Err(ScdbError::rejected("Invalid deposit transaction format")),
    }
}
