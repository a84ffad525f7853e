use arbitrary::Arbitrary;
use borsh::{BorshDeserialize, BorshSerialize};
use drivechain_primitives::Buf32;
use serde::{Deserialize, Serialize};

use crate::entities::{
    Sidechain, SidechainActivationStatus, SidechainCtip, SidechainFailedWTPrime,
    SidechainSpentWTPrime, SidechainWTPrimeState,
};

/// Consensus state checkpoint, written with every block so the node can resume.
///
/// Node-local caches are not part of the checkpoint.
#[derive(
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    Arbitrary,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct ScdbStateSnapshot {
    pub sidechains: Vec<Sidechain>,
    pub activation_status: Vec<SidechainActivationStatus>,
    pub wt_prime_states: Vec<SidechainWTPrimeState>,
    pub ctips: Vec<(u8, SidechainCtip)>,
    pub spent_wt_primes: Vec<SidechainSpentWTPrime>,
    pub failed_wt_primes: Vec<SidechainFailedWTPrime>,
    /// Hash and height of the last connected block.
    pub last_block: Option<(u64, Buf32)>,
}
