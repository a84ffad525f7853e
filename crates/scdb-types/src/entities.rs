//! Records tracked by the sidechain database.

use std::{
    fmt,
    io::{self, Read, Write},
    str::FromStr,
};

use arbitrary::Arbitrary;
use borsh::{BorshDeserialize, BorshSerialize};
use drivechain_primitives::{
    hash::{compute_borsh_hash, sha256d},
    BitcoinAmount, BitcoinOutPoint, BitcoinScript, BitcoinTx, Buf20, Buf32,
};
use serde::{Deserialize, Serialize};

use crate::{
    constants::{
        DB_SIDECHAIN_BLOCK_OP, SIDECHAIN_MIN_WORKSCORE, SIDECHAIN_VERIFICATION_PERIOD,
        SIDECHAIN_VERSION_CURRENT,
    },
    errors::CodecError,
};

/// A sidechain slot, either proposed or active.
#[derive(
    Clone, Debug, PartialEq, Eq, Arbitrary, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct Sidechain {
    pub active: bool,
    pub n_sidechain: u8,
    pub version: i32,
    /// Hex hash160 of the deposit pubkey.
    pub key_id: String,
    /// WIF encoded deposit key.
    pub priv_key: String,
    pub script_pubkey: BitcoinScript,
    pub title: String,
    pub description: String,
    pub hash_id1: Buf32,
    pub hash_id2: Buf20,
}

impl Default for Sidechain {
    fn default() -> Self {
        Self {
            active: false,
            n_sidechain: 0,
            version: SIDECHAIN_VERSION_CURRENT,
            key_id: String::new(),
            priv_key: String::new(),
            script_pubkey: BitcoinScript::default(),
            title: String::new(),
            description: String::new(),
            hash_id1: Buf32::zero(),
            hash_id2: Buf20::zero(),
        }
    }
}

impl Sidechain {
    /// Proposal encoding: the record without the `active` flag.
    pub fn encode_proposal(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.write_proposal(&mut buf)
            .expect("sidechain: write proposal to vec");
        buf
    }

    fn write_proposal<W: Write>(&self, w: &mut W) -> io::Result<()> {
        BorshSerialize::serialize(&self.n_sidechain, w)?;
        BorshSerialize::serialize(&self.version, w)?;
        BorshSerialize::serialize(&self.key_id, w)?;
        BorshSerialize::serialize(&self.priv_key, w)?;
        BorshSerialize::serialize(&self.script_pubkey, w)?;
        BorshSerialize::serialize(&self.title, w)?;
        BorshSerialize::serialize(&self.description, w)?;
        BorshSerialize::serialize(&self.hash_id1, w)?;
        BorshSerialize::serialize(&self.hash_id2, w)
    }

    /// Decodes a proposal. The result is never active.
    pub fn decode_proposal(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut r = bytes;
        let sc = Self::read_proposal(&mut r)?;
        if !r.is_empty() {
            return Err(CodecError::TrailingBytes(r.len()));
        }
        Ok(sc)
    }

    fn read_proposal<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(Self {
            active: false,
            n_sidechain: u8::deserialize_reader(r)?,
            version: i32::deserialize_reader(r)?,
            key_id: String::deserialize_reader(r)?,
            priv_key: String::deserialize_reader(r)?,
            script_pubkey: BitcoinScript::deserialize_reader(r)?,
            title: String::deserialize_reader(r)?,
            description: String::deserialize_reader(r)?,
            hash_id1: Buf32::deserialize_reader(r)?,
            hash_id2: Buf20::deserialize_reader(r)?,
        })
    }

    /// Hash identifying the proposal, independent of activation.
    pub fn proposal_hash(&self) -> Buf32 {
        sha256d(&self.encode_proposal())
    }
}

/// A pending proposal with its voting counters.
#[derive(
    Clone, Debug, PartialEq, Eq, Arbitrary, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct SidechainActivationStatus {
    pub n_age: i32,
    pub n_fail: i32,
    pub proposal: Sidechain,
}

impl SidechainActivationStatus {
    pub fn new(proposal: Sidechain) -> Self {
        Self {
            n_age: 0,
            n_fail: 0,
            proposal,
        }
    }
}

/// Verification progress of a pending withdrawal bundle.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Arbitrary,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct SidechainWTPrimeState {
    pub n_sidechain: u8,
    pub n_blocks_left: u16,
    pub n_work_score: u16,
    pub hash_wt_prime: Buf32,
}

impl SidechainWTPrimeState {
    /// Fresh state at the start of the verification period.
    pub fn new(n_sidechain: u8, hash_wt_prime: Buf32) -> Self {
        Self {
            n_sidechain,
            n_blocks_left: SIDECHAIN_VERIFICATION_PERIOD,
            n_work_score: 0,
            hash_wt_prime,
        }
    }

    pub fn is_payout_eligible(&self) -> bool {
        self.n_work_score >= SIDECHAIN_MIN_WORKSCORE
    }
}

#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Arbitrary,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct SidechainSpentWTPrime {
    pub n_sidechain: u8,
    pub hash_wt_prime: Buf32,
    pub hash_block: Buf32,
}

#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Arbitrary,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct SidechainFailedWTPrime {
    pub n_sidechain: u8,
    pub hash_wt_prime: Buf32,
}

/// The single output holding a sidechain's pooled funds.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Arbitrary,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct SidechainCtip {
    pub out: BitcoinOutPoint,
    pub amount: BitcoinAmount,
}

/// A deposit into a sidechain, as seen in a connected block.
#[derive(
    Clone, Debug, PartialEq, Eq, Arbitrary, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct SidechainDeposit {
    pub n_sidechain: u8,
    pub str_dest: String,
    pub tx: BitcoinTx,
    /// Output paying the sidechain script.
    pub n_burn_index: u32,
    /// Position of the transaction in its block.
    pub n_tx: u32,
    pub hash_block: Buf32,
}

impl SidechainDeposit {
    pub fn txid(&self) -> Buf32 {
        self.tx.compute_txid().into()
    }
}

/// A miner vote on a WT^.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Arbitrary, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WtPrimeVote {
    Upvote,
    Downvote,
    Abstain,
}

impl WtPrimeVote {
    pub const fn as_char(self) -> char {
        match self {
            Self::Upvote => 'u',
            Self::Downvote => 'd',
            Self::Abstain => 'a',
        }
    }

    pub fn from_char(c: char) -> Result<Self, CodecError> {
        match c {
            'u' => Ok(Self::Upvote),
            'd' => Ok(Self::Downvote),
            'a' => Ok(Self::Abstain),
            other => Err(CodecError::InvalidVote(other)),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Upvote => "upvote",
            Self::Downvote => "downvote",
            Self::Abstain => "abstain",
        }
    }
}

impl fmt::Display for WtPrimeVote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WtPrimeVote {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upvote" => Ok(Self::Upvote),
            "downvote" => Ok(Self::Downvote),
            "abstain" => Ok(Self::Abstain),
            _ => Err(CodecError::Malformed(format!("unknown vote '{s}'"))),
        }
    }
}

// Persisted as the vote character so stored records keep the on-chain byte.
impl BorshSerialize for WtPrimeVote {
    fn serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&[self.as_char() as u8])
    }
}

impl BorshDeserialize for WtPrimeVote {
    fn deserialize_reader<R: Read>(reader: &mut R) -> io::Result<Self> {
        let b = u8::deserialize_reader(reader)?;
        Self::from_char(b as char)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))
    }
}

/// Operator override of the default vote for one WT^.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Arbitrary,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct SidechainCustomVote {
    pub vote: WtPrimeVote,
    pub n_sidechain: u8,
    pub hash_wt_prime: Buf32,
}

/// What the node believed about the sidechains after connecting a block.
#[derive(
    Clone, Debug, PartialEq, Eq, Arbitrary, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct SidechainBlockData {
    pub sidechain_op: u8,
    pub wt_prime_status: Vec<Vec<SidechainWTPrimeState>>,
    pub spent_wt_primes: Vec<SidechainSpentWTPrime>,
    pub activation_status: Vec<SidechainActivationStatus>,
    pub sidechains: Vec<Sidechain>,
    pub hash_mt: Buf32,
}

impl SidechainBlockData {
    pub fn new(
        wt_prime_status: Vec<Vec<SidechainWTPrimeState>>,
        spent_wt_primes: Vec<SidechainSpentWTPrime>,
        activation_status: Vec<SidechainActivationStatus>,
        sidechains: Vec<Sidechain>,
    ) -> Self {
        let hash_mt = compute_borsh_hash(&(
            &wt_prime_status,
            &spent_wt_primes,
            &activation_status,
            &sidechains,
        ));
        Self {
            sidechain_op: DB_SIDECHAIN_BLOCK_OP,
            wt_prime_status,
            spent_wt_primes,
            activation_status,
            sidechains,
            hash_mt,
        }
    }

    /// Checks the record discriminant and the commitment over its contents.
    pub fn is_well_formed(&self) -> bool {
        if self.sidechain_op != DB_SIDECHAIN_BLOCK_OP {
            return false;
        }
        let expected = compute_borsh_hash(&(
            &self.wt_prime_status,
            &self.spent_wt_primes,
            &self.activation_status,
            &self.sidechains,
        ));
        expected == self.hash_mt
    }
}
