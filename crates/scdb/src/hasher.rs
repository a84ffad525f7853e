//! Commitments over SCDB state.

use std::collections::BTreeMap;

use borsh::BorshSerialize;
use drivechain_primitives::{
    hash::{compute_borsh_hash, sha256d},
    Buf32,
};
use drivechain_scdb_types::{Sidechain, SidechainCtip, SidechainWTPrimeState};

use crate::ctip::CtipLedger;

#[derive(BorshSerialize)]
struct ScdbCommitment<'a> {
    wt_primes: Vec<&'a [SidechainWTPrimeState]>,
    ctips: Vec<(u8, &'a SidechainCtip)>,
    sidechains: Vec<&'a Sidechain>,
}

/// Hash of the pending WT^s per active sidechain, the CTIPs and the active sidechains,
/// all in slot order.
pub fn scdb_hash(
    sidechains: &BTreeMap<u8, Sidechain>,
    wt_primes: &BTreeMap<u8, Vec<SidechainWTPrimeState>>,
    ctips: &CtipLedger,
) -> Buf32 {
    let commitment = ScdbCommitment {
        wt_primes: sidechains
            .keys()
            .map(|n| wt_primes.get(n).map_or(&[][..], Vec::as_slice))
            .collect(),
        ctips: ctips.iter().collect(),
        sidechains: sidechains.values().collect(),
    };
    compute_borsh_hash(&commitment)
}

/// Chains the stored block data records, oldest first:
/// `acc = sha256d(acc || sha256d(record))`, starting from zero.
pub fn total_scdb_hash<I, B>(history: I) -> Buf32
where
    I: IntoIterator<Item = B>,
    B: AsRef<[u8]>,
{
    let mut acc = Buf32::zero();
    let mut buf = [0u8; 64];
    for record in history {
        buf[..32].copy_from_slice(acc.as_slice());
        buf[32..].copy_from_slice(sha256d(record.as_ref()).as_slice());
        acc = sha256d(&buf);
    }
    acc
}
