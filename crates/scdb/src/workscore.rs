//! WT^ workscore accrual.

use drivechain_primitives::Buf32;
use drivechain_scdb_types::{
    constants::{SIDECHAIN_MIN_WORKSCORE, SIDECHAIN_VERIFICATION_PERIOD},
    DefaultVotePolicy, SidechainCustomVote, SidechainFailedWTPrime, SidechainWTPrimeState,
    WtPrimeVote,
};
use tracing::debug;

/// Votes that apply to one block, in precedence order.
#[derive(Debug, Clone, Copy)]
pub struct VoteSources<'a> {
    /// Votes committed in the block's coinbase.
    pub block: &'a [SidechainCustomVote],
    /// Operator overrides.
    pub custom: &'a [SidechainCustomVote],
    pub policy: DefaultVotePolicy,
}

impl VoteSources<'_> {
    fn lookup(votes: &[SidechainCustomVote], n_sidechain: u8, hash: &Buf32) -> Option<WtPrimeVote> {
        votes
            .iter()
            .rev()
            .find(|v| v.n_sidechain == n_sidechain && v.hash_wt_prime == *hash)
            .map(|v| v.vote)
    }

    /// Resolves the vote for `state`. `is_newest` marks the most recently announced WT^
    /// of its sidechain.
    pub fn resolve(&self, state: &SidechainWTPrimeState, is_newest: bool) -> WtPrimeVote {
        let (n, hash) = (state.n_sidechain, &state.hash_wt_prime);
        if let Some(v) = Self::lookup(self.block, n, hash) {
            return v;
        }
        if let Some(v) = Self::lookup(self.custom, n, hash) {
            return v;
        }
        match self.policy {
            DefaultVotePolicy::UpvoteNewest if is_newest => WtPrimeVote::Upvote,
            _ => WtPrimeVote::Abstain,
        }
    }
}

pub fn apply_vote(score: u16, vote: WtPrimeVote) -> u16 {
    match vote {
        WtPrimeVote::Upvote => score.saturating_add(1).min(SIDECHAIN_VERIFICATION_PERIOD),
        WtPrimeVote::Downvote => score.saturating_sub(1),
        WtPrimeVote::Abstain => score,
    }
}

/// Advances the pending WT^s of one sidechain by one block.
///
/// `states` must be in announcement order. States whose verification period ran out
/// below [`SIDECHAIN_MIN_WORKSCORE`] are removed and returned.
pub fn advance(
    states: &mut Vec<SidechainWTPrimeState>,
    votes: &VoteSources<'_>,
) -> Vec<SidechainFailedWTPrime> {
    let mut failed = Vec::new();
    states.retain_mut(|state| {
        state.n_blocks_left = state.n_blocks_left.saturating_sub(1);
        if state.n_blocks_left == 0 && state.n_work_score < SIDECHAIN_MIN_WORKSCORE {
            debug!(hash = %state.hash_wt_prime, n_sidechain = %state.n_sidechain, "scdb: WT^ verification period expired");
            failed.push(SidechainFailedWTPrime {
                n_sidechain: state.n_sidechain,
                hash_wt_prime: state.hash_wt_prime,
            });
            return false;
        }
        true
    });

    let newest = states.len().checked_sub(1);
    for (i, state) in states.iter_mut().enumerate() {
        let vote = votes.resolve(state, Some(i) == newest);
        state.n_work_score = apply_vote(state.n_work_score, vote);
    }

    failed
}
