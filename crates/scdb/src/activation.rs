//! Sidechain proposal voting.
//!
//! Every pending proposal ages by one per connected block. An ACK in the block lowers its
//! failure count (never below zero), a missing ACK raises it. Proposals reaching
//! [`SIDECHAIN_ACTIVATION_MAX_FAILURES`] are dropped, proposals reaching
//! [`SIDECHAIN_ACTIVATION_PERIOD`] are handed back for promotion.

use std::collections::{BTreeMap, HashSet};

use drivechain_primitives::Buf32;
use drivechain_scdb_types::{
    constants::{
        SIDECHAIN_ACTIVATION_MAX_ACTIVE, SIDECHAIN_ACTIVATION_MAX_FAILURES,
        SIDECHAIN_ACTIVATION_PERIOD,
    },
    Sidechain, SidechainActivationStatus,
};
use tracing::{debug, warn};

/// Proposals that left the pending set during one advance.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ActivationOutcome {
    /// Proposals that completed the activation period, in pending order.
    pub ready: Vec<Sidechain>,

    /// Hashes of proposals dropped for too many failures.
    pub discarded: Vec<Buf32>,
}

/// Advances every pending status by one block.
pub fn advance(
    pending: &mut Vec<SidechainActivationStatus>,
    acks: &HashSet<Buf32>,
) -> ActivationOutcome {
    let mut outcome = ActivationOutcome::default();

    pending.retain_mut(|status| {
        let hash = status.proposal.proposal_hash();
        status.n_age += 1;
        if acks.contains(&hash) {
            status.n_fail = (status.n_fail - 1).max(0);
        } else {
            status.n_fail += 1;
        }

        if status.n_fail >= SIDECHAIN_ACTIVATION_MAX_FAILURES {
            debug!(%hash, n_age = %status.n_age, "scdb: discarding sidechain proposal");
            outcome.discarded.push(hash);
            return false;
        }
        if status.n_age >= SIDECHAIN_ACTIVATION_PERIOD {
            outcome.ready.push(status.proposal.clone());
            return false;
        }
        true
    });

    outcome
}

/// Adds a proposal seen in a block. Returns `false` if the same proposal is already
/// pending.
pub fn add_proposal(pending: &mut Vec<SidechainActivationStatus>, proposal: Sidechain) -> bool {
    let hash = proposal.proposal_hash();
    if pending.iter().any(|s| s.proposal.proposal_hash() == hash) {
        return false;
    }
    pending.push(SidechainActivationStatus::new(proposal));
    true
}

/// Moves a ready proposal into the active set. Returns `false` and logs if the slot is
/// taken or the active set is full.
pub fn promote(active: &mut BTreeMap<u8, Sidechain>, mut proposal: Sidechain) -> bool {
    let slot = proposal.n_sidechain;
    if active.contains_key(&slot) {
        warn!(%slot, title = %proposal.title, "scdb: sidechain slot already active, dropping proposal");
        return false;
    }
    if active.len() >= SIDECHAIN_ACTIVATION_MAX_ACTIVE {
        warn!(%slot, "scdb: too many active sidechains, dropping proposal");
        return false;
    }

    proposal.active = true;
    debug!(%slot, title = %proposal.title, "scdb: activated sidechain");
    active.insert(slot, proposal);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proposal(n: u8, title: &str) -> Sidechain {
        Sidechain {
            n_sidechain: n,
            title: title.to_owned(),
            description: "d".to_owned(),
            ..Default::default()
        }
    }

    fn run_blocks(
        pending: &mut Vec<SidechainActivationStatus>,
        acks: &HashSet<Buf32>,
        n: usize,
    ) -> ActivationOutcome {
        let mut total = ActivationOutcome::default();
        for _ in 0..n {
            let out = advance(pending, acks);
            total.ready.extend(out.ready);
            total.discarded.extend(out.discarded);
        }
        total
    }

    #[test]
    fn test_acked_every_block_promotes_at_period() {
        let sc = proposal(0, "alpha");
        let acks = HashSet::from([sc.proposal_hash()]);
        let mut pending = Vec::new();
        assert!(add_proposal(&mut pending, sc.clone()));

        let early = run_blocks(&mut pending, &acks, SIDECHAIN_ACTIVATION_PERIOD as usize - 1);
        assert!(early.ready.is_empty());
        assert_eq!(pending[0].n_age, SIDECHAIN_ACTIVATION_PERIOD - 1);
        assert_eq!(pending[0].n_fail, 0);

        let last = advance(&mut pending, &acks);
        assert_eq!(last.ready, vec![sc]);
        assert!(pending.is_empty());
    }

    #[test]
    fn test_unacked_proposal_discarded() {
        let sc = proposal(1, "beta");
        let mut pending = vec![SidechainActivationStatus::new(sc.clone())];

        let first = advance(&mut pending, &HashSet::new());
        assert!(first.discarded.is_empty());
        assert_eq!(pending[0].n_fail, 1);

        let second = advance(&mut pending, &HashSet::new());
        assert_eq!(second.discarded, vec![sc.proposal_hash()]);
        assert!(pending.is_empty());
    }

    #[test]
    fn test_fail_count_saturates_at_zero() {
        let sc = proposal(2, "gamma");
        let acks = HashSet::from([sc.proposal_hash()]);
        let mut pending = vec![SidechainActivationStatus::new(sc)];
        run_blocks(&mut pending, &acks, 3);
        assert_eq!(pending[0].n_fail, 0);
        assert_eq!(pending[0].n_age, 3);
    }

    #[test]
    fn test_alternating_acks_survive() {
        let sc = proposal(3, "delta");
        let acks = HashSet::from([sc.proposal_hash()]);
        let mut pending = vec![SidechainActivationStatus::new(sc.clone())];
        let mut ready = Vec::new();
        for i in 0..SIDECHAIN_ACTIVATION_PERIOD {
            let set = if i % 2 == 0 { HashSet::new() } else { acks.clone() };
            ready.extend(advance(&mut pending, &set).ready);
        }
        assert_eq!(ready, vec![sc]);
    }

    #[test]
    fn test_duplicate_proposal_ignored() {
        let sc = proposal(4, "eps");
        let mut pending = Vec::new();
        assert!(add_proposal(&mut pending, sc.clone()));
        assert!(!add_proposal(&mut pending, sc));
        assert_eq!(pending.len(), 1);
    }

    #[test]
    fn test_promote_rejects_taken_slot() {
        let mut active = BTreeMap::new();
        assert!(promote(&mut active, proposal(7, "first")));
        assert!(active[&7].active);
        assert!(!promote(&mut active, proposal(7, "second")));
        assert_eq!(active[&7].title, "first");
    }
}
