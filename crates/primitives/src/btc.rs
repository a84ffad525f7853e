//! Wrappers around [`bitcoin`] types that implement the traits our records need.

use std::io::{self, Read, Write};

use arbitrary::{Arbitrary, Unstructured};
use bitcoin::{
    absolute::LockTime, consensus, hashes::Hash as _, transaction::Version, Amount, OutPoint,
    ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid, Witness,
};
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

/// A wrapper around [`bitcoin::OutPoint`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BitcoinOutPoint(OutPoint);

impl BitcoinOutPoint {
    pub fn new(txid: Txid, vout: u32) -> Self {
        Self(OutPoint { txid, vout })
    }

    pub fn outpoint(&self) -> &OutPoint {
        &self.0
    }
}

impl From<OutPoint> for BitcoinOutPoint {
    fn from(value: OutPoint) -> Self {
        Self(value)
    }
}

impl From<BitcoinOutPoint> for OutPoint {
    fn from(value: BitcoinOutPoint) -> Self {
        value.0
    }
}

impl BorshSerialize for BitcoinOutPoint {
    fn serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(self.0.txid.as_byte_array())?;
        BorshSerialize::serialize(&self.0.vout, writer)
    }
}

impl BorshDeserialize for BitcoinOutPoint {
    fn deserialize_reader<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut txid = [0u8; 32];
        reader.read_exact(&mut txid)?;
        let vout = u32::deserialize_reader(reader)?;
        Ok(Self::new(Txid::from_byte_array(txid), vout))
    }
}

impl<'a> Arbitrary<'a> for BitcoinOutPoint {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        let txid = <[u8; 32]>::arbitrary(u)?;
        let vout = u32::arbitrary(u)?;
        Ok(Self::new(Txid::from_byte_array(txid), vout))
    }
}

/// A wrapper around [`bitcoin::ScriptBuf`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BitcoinScript(ScriptBuf);

impl BitcoinScript {
    pub fn inner(&self) -> &ScriptBuf {
        &self.0
    }
}

impl From<ScriptBuf> for BitcoinScript {
    fn from(value: ScriptBuf) -> Self {
        Self(value)
    }
}

impl From<BitcoinScript> for ScriptBuf {
    fn from(value: BitcoinScript) -> Self {
        value.0
    }
}

impl BorshSerialize for BitcoinScript {
    fn serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        BorshSerialize::serialize(self.0.as_bytes(), writer)
    }
}

impl BorshDeserialize for BitcoinScript {
    fn deserialize_reader<R: Read>(reader: &mut R) -> io::Result<Self> {
        let bytes = Vec::<u8>::deserialize_reader(reader)?;
        Ok(Self(ScriptBuf::from(bytes)))
    }
}

impl<'a> Arbitrary<'a> for BitcoinScript {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        let len = u.int_in_range(0..=64)?;
        Ok(Self(ScriptBuf::from(u.bytes(len)?.to_vec())))
    }
}

/// A wrapper around [`bitcoin::Transaction`], persisted in consensus encoding.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BitcoinTx(Transaction);

impl BitcoinTx {
    pub fn inner(&self) -> &Transaction {
        &self.0
    }

    pub fn compute_txid(&self) -> Txid {
        self.0.compute_txid()
    }
}

impl From<Transaction> for BitcoinTx {
    fn from(value: Transaction) -> Self {
        Self(value)
    }
}

impl From<BitcoinTx> for Transaction {
    fn from(value: BitcoinTx) -> Self {
        value.0
    }
}

impl BorshSerialize for BitcoinTx {
    fn serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let raw = consensus::serialize(&self.0);
        BorshSerialize::serialize(&raw, writer)
    }
}

impl BorshDeserialize for BitcoinTx {
    fn deserialize_reader<R: Read>(reader: &mut R) -> io::Result<Self> {
        let raw = Vec::<u8>::deserialize_reader(reader)?;
        let tx = consensus::deserialize::<Transaction>(&raw)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
        Ok(Self(tx))
    }
}

impl<'a> Arbitrary<'a> for BitcoinTx {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        // At least one input so the encoding is never mistaken for a segwit marker.
        let prevout = BitcoinOutPoint::arbitrary(u)?;
        let input = vec![TxIn {
            previous_output: prevout.into(),
            script_sig: ScriptBuf::new(),
            sequence: Sequence::MAX,
            witness: Witness::new(),
        }];

        let n_out = u.int_in_range(1..=3)?;
        let mut output = Vec::with_capacity(n_out);
        for _ in 0..n_out {
            let value = u.int_in_range(0..=21_000_000 * 100_000_000u64)?;
            let script = BitcoinScript::arbitrary(u)?;
            output.push(TxOut {
                value: Amount::from_sat(value),
                script_pubkey: script.into(),
            });
        }

        Ok(Self(Transaction {
            version: Version::TWO,
            lock_time: LockTime::ZERO,
            input,
            output,
        }))
    }
}
