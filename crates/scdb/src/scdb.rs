//! The sidechain database: consensus state plus the node-local caches.

use std::collections::{BTreeMap, HashSet};

use bitcoin::{Block, Transaction};
use drivechain_primitives::{BitcoinTx, Buf32};
use drivechain_scdb_types::{
    errors::CodecError, CoinbaseMessage, DefaultVotePolicy, ScdbStateSnapshot, Sidechain,
    SidechainActivationStatus, SidechainBlockData, SidechainCtip, SidechainCustomVote,
    SidechainDeposit, SidechainFailedWTPrime, SidechainSpentWTPrime, SidechainWTPrimeState,
};
use tracing::{debug, info, warn};

use crate::{
    activation,
    ctip::{decode_deposit, wt_prime_return, CtipLedger},
    errors::{ScdbError, ScdbResult},
    hasher,
    workscore::{self, VoteSources},
};

/// Sidechain messages found in one coinbase.
#[derive(Debug, Default)]
struct BlockUpdate {
    proposals: Vec<Sidechain>,
    acks: HashSet<Buf32>,
    announcements: Vec<(u8, Buf32)>,
    votes: Vec<SidechainCustomVote>,
}

impl BlockUpdate {
    fn from_coinbase(coinbase: &Transaction) -> Self {
        let mut update = Self::default();
        for (vout, out) in coinbase.output.iter().enumerate() {
            let msg = match CoinbaseMessage::parse(&out.script_pubkey) {
                Ok(msg) => msg,
                // Payouts and BMM commitments.
                Err(CodecError::NotOpReturn | CodecError::UnknownHeader(_)) => continue,
                Err(err) => {
                    warn!(%vout, %err, "scdb: ignoring malformed coinbase message");
                    continue;
                }
            };

            match msg {
                CoinbaseMessage::Proposal(sc) => update.proposals.push(sc),
                CoinbaseMessage::Ack(hash) => {
                    update.acks.insert(hash);
                }
                CoinbaseMessage::WtPrimeAnnounce {
                    n_sidechain,
                    hash_wt_prime,
                } => update.announcements.push((n_sidechain, hash_wt_prime)),
                CoinbaseMessage::Votes { votes, malformed } => {
                    if malformed > 0 {
                        warn!(%vout, %malformed, "scdb: ignoring malformed WT^ votes");
                    }
                    update.votes.extend(votes);
                }
            }
        }
        update
    }
}

#[derive(Clone, Debug, Default)]
pub struct Scdb {
    policy: DefaultVotePolicy,

    /// Active sidechains by slot.
    sidechains: BTreeMap<u8, Sidechain>,
    activation_status: Vec<SidechainActivationStatus>,
    /// Pending WT^s per sidechain, in announcement order.
    wt_primes: BTreeMap<u8, Vec<SidechainWTPrimeState>>,
    ctips: CtipLedger,
    spent: Vec<SidechainSpentWTPrime>,
    failed: Vec<SidechainFailedWTPrime>,
    last_block: Option<(u64, Buf32)>,

    // Node-local, not persisted.
    proposals: Vec<Sidechain>,
    acks: Vec<Buf32>,
    wt_prime_txs: Vec<(u8, BitcoinTx)>,
    custom_votes: Vec<SidechainCustomVote>,
    deposits: Vec<SidechainDeposit>,
    removed_bmm: Vec<Buf32>,
}

impl Scdb {
    pub fn new(policy: DefaultVotePolicy) -> Self {
        Self {
            policy,
            ..Default::default()
        }
    }

    /// Restores the consensus state from a checkpoint. Caches start empty.
    pub fn from_snapshot(
        snapshot: ScdbStateSnapshot,
        policy: DefaultVotePolicy,
    ) -> ScdbResult<Self> {
        let mut sidechains = BTreeMap::new();
        for sc in snapshot.sidechains {
            if !sc.active {
                return Err(ScdbError::Internal(format!(
                    "checkpoint lists inactive sidechain {}",
                    sc.n_sidechain
                )));
            }
            if sidechains.insert(sc.n_sidechain, sc).is_some() {
                return Err(ScdbError::Internal("checkpoint repeats a sidechain slot".into()));
            }
        }

        let mut wt_primes: BTreeMap<u8, Vec<SidechainWTPrimeState>> = BTreeMap::new();
        for state in snapshot.wt_prime_states {
            wt_primes.entry(state.n_sidechain).or_default().push(state);
        }

        let mut slots = HashSet::new();
        if !snapshot.ctips.iter().all(|(n, _)| slots.insert(*n)) {
            return Err(ScdbError::Internal("checkpoint repeats a CTIP slot".into()));
        }

        Ok(Self {
            policy,
            sidechains,
            activation_status: snapshot.activation_status,
            wt_primes,
            ctips: CtipLedger::from_entries(snapshot.ctips),
            spent: snapshot.spent_wt_primes,
            failed: snapshot.failed_wt_primes,
            last_block: snapshot.last_block,
            ..Default::default()
        })
    }

    pub fn to_snapshot(&self) -> ScdbStateSnapshot {
        ScdbStateSnapshot {
            sidechains: self.sidechains.values().cloned().collect(),
            activation_status: self.activation_status.clone(),
            wt_prime_states: self.wt_primes.values().flatten().copied().collect(),
            ctips: self.ctips.iter().map(|(n, c)| (n, *c)).collect(),
            spent_wt_primes: self.spent.clone(),
            failed_wt_primes: self.failed.clone(),
            last_block: self.last_block,
        }
    }

    pub fn policy(&self) -> DefaultVotePolicy {
        self.policy
    }

    /// Height and hash of the last connected block.
    pub fn last_block(&self) -> Option<(u64, Buf32)> {
        self.last_block
    }

    pub fn is_active(&self, n_sidechain: u8) -> bool {
        self.sidechains.contains_key(&n_sidechain)
    }

    pub fn sidechain(&self, n_sidechain: u8) -> Option<&Sidechain> {
        self.sidechains.get(&n_sidechain)
    }

    /// Active sidechains in slot order.
    pub fn active_sidechains(&self) -> impl Iterator<Item = &Sidechain> + '_ {
        self.sidechains.values()
    }

    pub(crate) fn sidechain_map(&self) -> &BTreeMap<u8, Sidechain> {
        &self.sidechains
    }

    pub fn activation_status(&self) -> &[SidechainActivationStatus] {
        &self.activation_status
    }

    pub fn ctip(&self, n_sidechain: u8) -> Option<&SidechainCtip> {
        self.ctips.get(n_sidechain)
    }

    pub fn wt_prime_states(&self, n_sidechain: u8) -> &[SidechainWTPrimeState] {
        self.wt_primes
            .get(&n_sidechain)
            .map_or(&[][..], Vec::as_slice)
    }

    pub fn wt_prime_state(&self, n_sidechain: u8, hash: &Buf32) -> Option<&SidechainWTPrimeState> {
        self.wt_prime_states(n_sidechain)
            .iter()
            .find(|s| s.hash_wt_prime == *hash)
    }

    pub fn spent_wt_primes(&self) -> &[SidechainSpentWTPrime] {
        &self.spent
    }

    pub fn failed_wt_primes(&self) -> &[SidechainFailedWTPrime] {
        &self.failed
    }

    pub fn have_spent_wt_prime(&self, hash: &Buf32, n_sidechain: u8) -> bool {
        self.spent
            .iter()
            .any(|s| s.n_sidechain == n_sidechain && s.hash_wt_prime == *hash)
    }

    pub fn have_failed_wt_prime(&self, hash: &Buf32, n_sidechain: u8) -> bool {
        self.failed
            .iter()
            .any(|s| s.n_sidechain == n_sidechain && s.hash_wt_prime == *hash)
    }

    fn knows_wt_prime(&self, n_sidechain: u8, hash: &Buf32) -> bool {
        self.wt_prime_state(n_sidechain, hash).is_some()
            || self.have_spent_wt_prime(hash, n_sidechain)
            || self.have_failed_wt_prime(hash, n_sidechain)
            || self
                .wt_prime_txs
                .iter()
                .any(|(n, tx)| *n == n_sidechain && Buf32::from(tx.compute_txid()) == *hash)
    }

    pub fn scdb_hash(&self) -> Buf32 {
        hasher::scdb_hash(&self.sidechains, &self.wt_primes, &self.ctips)
    }

    /// Caches a sidechain proposal for inclusion in blocks. Returns `false` for a
    /// duplicate.
    pub fn cache_proposal(&mut self, proposal: Sidechain) -> bool {
        let hash = proposal.proposal_hash();
        if self.proposals.iter().any(|p| p.proposal_hash() == hash) {
            return false;
        }
        self.proposals.push(proposal);
        true
    }

    pub fn cached_proposals(&self) -> &[Sidechain] {
        &self.proposals
    }

    /// Caches a proposal hash to ACK in blocks. Returns `false` for a duplicate.
    pub fn cache_ack(&mut self, hash: Buf32) -> bool {
        if self.acks.contains(&hash) {
            return false;
        }
        self.acks.push(hash);
        true
    }

    pub fn cached_acks(&self) -> &[Buf32] {
        &self.acks
    }

    fn forget_proposal(&mut self, hash: &Buf32) {
        self.acks.retain(|h| h != hash);
        self.proposals.retain(|p| p.proposal_hash() != *hash);
    }

    /// Records an operator vote, replacing any earlier vote on the same WT^.
    pub fn set_custom_vote(&mut self, vote: SidechainCustomVote) {
        self.custom_votes.retain(|v| {
            v.n_sidechain != vote.n_sidechain || v.hash_wt_prime != vote.hash_wt_prime
        });
        self.custom_votes.push(vote);
    }

    pub fn clear_custom_votes(&mut self) {
        self.custom_votes.clear();
    }

    pub fn custom_votes(&self) -> &[SidechainCustomVote] {
        &self.custom_votes
    }

    /// Cached WT^ transactions of a sidechain, oldest first.
    pub fn cached_wt_prime_txs(&self, n_sidechain: u8) -> impl Iterator<Item = &BitcoinTx> + '_ {
        self.wt_prime_txs
            .iter()
            .filter(move |(n, _)| *n == n_sidechain)
            .map(|(_, tx)| tx)
    }

    /// All cached deposits, in arrival order.
    pub fn deposits(&self) -> &[SidechainDeposit] {
        &self.deposits
    }

    /// Deposits of a sidechain, newest first.
    pub fn deposits_for(&self, n_sidechain: u8) -> impl Iterator<Item = &SidechainDeposit> + '_ {
        self.deposits
            .iter()
            .rev()
            .filter(move |d| d.n_sidechain == n_sidechain)
    }

    pub fn cache_removed_bmm(&mut self, txid: Buf32) {
        if !self.removed_bmm.contains(&txid) {
            self.removed_bmm.push(txid);
        }
    }

    pub fn removed_bmm(&self) -> &[Buf32] {
        &self.removed_bmm
    }

    /// Accepts a WT^ for verification and starts tracking it. Returns its hash.
    pub fn receive_wt_prime(&mut self, n_sidechain: u8, tx: Transaction) -> ScdbResult<Buf32> {
        let sc = self
            .sidechains
            .get(&n_sidechain)
            .ok_or_else(|| ScdbError::invalid_input("Invalid sidechain number!"))?;
        if sc.script_pubkey.inner().is_empty() {
            return Err(ScdbError::not_found("Cannot get script for sidechain!"));
        }
        let ctip = self
            .ctips
            .get(n_sidechain)
            .ok_or_else(|| ScdbError::rejected("Rejecting WT^: No CTIP found!"))?;

        // An overflowing total exceeds any CTIP.
        let total = tx
            .output
            .iter()
            .try_fold(0u64, |acc, o| acc.checked_add(o.value.to_sat()));
        if !total.is_some_and(|total| total <= ctip.amount.to_sat()) {
            return Err(ScdbError::rejected(
                "Rejecting WT^: Withdrawn amount greater than CTIP amount!",
            ));
        }
        wt_prime_return(&tx)?;

        let hash = Buf32::from(tx.compute_txid());
        if self.knows_wt_prime(n_sidechain, &hash) {
            return Err(ScdbError::rejected("WT^ rejected from cache (duplicate?)"));
        }

        self.wt_prime_txs.push((n_sidechain, tx.into()));
        self.wt_primes
            .entry(n_sidechain)
            .or_default()
            .push(SidechainWTPrimeState::new(n_sidechain, hash));
        info!(%n_sidechain, %hash, "scdb: received WT^");
        Ok(hash)
    }

    /// Settles a payout-eligible WT^ paid out in `hash_block`. The other pending WT^s of
    /// the sidechain fail as superseded.
    pub fn mark_spent(
        &mut self,
        n_sidechain: u8,
        tx: &Transaction,
        hash_block: Buf32,
    ) -> ScdbResult<()> {
        let hash = Buf32::from(tx.compute_txid());
        let state = self
            .wt_prime_state(n_sidechain, &hash)
            .ok_or_else(|| ScdbError::not_found("No WT^(s) in SCDB for sidechain"))?;
        if !state.is_payout_eligible() {
            return Err(ScdbError::rejected("WT^ workscore below minimum"));
        }

        let ctip = self.ctips.apply_withdrawal(n_sidechain, tx)?;
        debug!(%n_sidechain, %hash, ?ctip, "scdb: applied WT^ payout");

        let settled = self.wt_primes.remove(&n_sidechain).unwrap_or_default();
        for s in settled {
            if s.hash_wt_prime == hash {
                self.spent.push(SidechainSpentWTPrime {
                    n_sidechain,
                    hash_wt_prime: hash,
                    hash_block,
                });
            } else {
                self.failed.push(SidechainFailedWTPrime {
                    n_sidechain,
                    hash_wt_prime: s.hash_wt_prime,
                });
            }
        }
        self.wt_prime_txs.retain(|(n, _)| *n != n_sidechain);
        Ok(())
    }

    fn eligible_wt_prime(&self, txid: &Buf32) -> Option<u8> {
        self.wt_primes
            .iter()
            .find(|(_, states)| {
                states
                    .iter()
                    .any(|s| s.hash_wt_prime == *txid && s.is_payout_eligible())
            })
            .map(|(n, _)| *n)
    }

    fn drop_cached_txs(&mut self, failed: &[SidechainFailedWTPrime]) {
        self.wt_prime_txs.retain(|(n, tx)| {
            let hash = Buf32::from(tx.compute_txid());
            !failed
                .iter()
                .any(|f| f.n_sidechain == *n && f.hash_wt_prime == hash)
        });
    }

    /// Applies a block on top of the last connected one and returns its sidechain data.
    ///
    /// Errors are returned before any mutation. Invalid payouts and deposits inside the
    /// block are logged and skipped.
    pub fn connect_block(
        &mut self,
        block: &Block,
        height: u64,
    ) -> ScdbResult<SidechainBlockData> {
        let hash = Buf32::from(block.block_hash());
        if let Some((tip_height, tip)) = self.last_block {
            let parent = Buf32::from(block.header.prev_blockhash);
            if height != tip_height + 1 || parent != tip {
                return Err(ScdbError::invalid_input(format!(
                    "block {hash} at height {height} does not extend SCDB tip {tip}"
                )));
            }
        }
        let coinbase = block
            .txdata
            .first()
            .ok_or_else(|| ScdbError::invalid_input("No txns in block"))?;
        let update = BlockUpdate::from_coinbase(coinbase);

        // Proposals.
        let outcome = activation::advance(&mut self.activation_status, &update.acks);
        for sc in outcome.ready {
            let proposal_hash = sc.proposal_hash();
            activation::promote(&mut self.sidechains, sc);
            self.forget_proposal(&proposal_hash);
        }
        for proposal_hash in &outcome.discarded {
            self.forget_proposal(proposal_hash);
        }
        for proposal in update.proposals {
            activation::add_proposal(&mut self.activation_status, proposal);
        }

        // Announcements.
        for (n, wt_hash) in update.announcements {
            if !self.is_active(n) {
                debug!(%n, %wt_hash, "scdb: WT^ announced for inactive sidechain");
                continue;
            }
            if self.knows_wt_prime(n, &wt_hash) {
                continue;
            }
            self.wt_primes
                .entry(n)
                .or_default()
                .push(SidechainWTPrimeState::new(n, wt_hash));
        }

        // Workscores.
        let sources = VoteSources {
            block: &update.votes,
            custom: &self.custom_votes,
            policy: self.policy,
        };
        let mut failed = Vec::new();
        for states in self.wt_primes.values_mut() {
            failed.extend(workscore::advance(states, &sources));
        }
        self.wt_primes.retain(|_, states| !states.is_empty());
        self.drop_cached_txs(&failed);
        self.failed.extend(failed);

        // Payouts and deposits.
        let spent_before = self.spent.len();
        for (n_tx, tx) in block.txdata.iter().enumerate().skip(1) {
            let txid = Buf32::from(tx.compute_txid());
            if let Some(n) = self.eligible_wt_prime(&txid) {
                if let Err(err) = self.mark_spent(n, tx, hash) {
                    warn!(%n, %txid, %err, "scdb: ignoring invalid WT^ payout");
                }
                continue;
            }

            let Some(decoded) = decode_deposit(tx, &self.sidechains) else {
                continue;
            };
            let deposit = SidechainDeposit {
                n_sidechain: decoded.n_sidechain,
                str_dest: decoded.str_dest,
                tx: tx.clone().into(),
                n_burn_index: decoded.n_burn_index,
                n_tx: n_tx as u32,
                hash_block: hash,
            };
            match self.ctips.apply_deposit(true, &deposit) {
                Ok(ctip) => {
                    debug!(n = %deposit.n_sidechain, %txid, amount = %ctip.amount, "scdb: deposit");
                    self.deposits.push(deposit);
                }
                Err(err) => {
                    warn!(n = %deposit.n_sidechain, %txid, %err, "scdb: ignoring invalid deposit")
                }
            }
        }

        self.last_block = Some((height, hash));
        Ok(self.block_data(self.spent[spent_before..].to_vec()))
    }

    fn block_data(&self, spent: Vec<SidechainSpentWTPrime>) -> SidechainBlockData {
        let wt_prime_status = self
            .sidechains
            .keys()
            .map(|n| self.wt_prime_states(*n).to_vec())
            .collect();
        SidechainBlockData::new(
            wt_prime_status,
            spent,
            self.activation_status.clone(),
            self.sidechains.values().cloned().collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use bitcoin::{hashes::Hash as _, BlockHash, ScriptBuf};
    use drivechain_primitives::BitcoinAmount;
    use drivechain_scdb_types::{
        constants::{
            SIDECHAIN_ACTIVATION_PERIOD, SIDECHAIN_MIN_WORKSCORE, SIDECHAIN_VERIFICATION_PERIOD,
        },
        WtPrimeVote,
    };
    use drivechain_test_utils::btc::{
        make_block, make_coinbase, make_tx, op_return_push, outpoint, p2pkh_script, txout,
        INITIAL_SUBSIDY,
    };

    use super::*;
    use crate::keys::derive_sidechain_keys;

    const SC: u8 = 5;
    const TEN_BTC: u64 = 10 * 100_000_000;

    struct Harness {
        scdb: Scdb,
        prev: BlockHash,
        height: u64,
    }

    impl Harness {
        fn new(scdb: Scdb) -> Self {
            Self {
                scdb,
                prev: BlockHash::all_zeros(),
                height: 0,
            }
        }

        fn block(&self, messages: Vec<ScriptBuf>, txs: Vec<Transaction>) -> Block {
            let mut txdata = vec![make_coinbase(self.height, INITIAL_SUBSIDY, messages)];
            txdata.extend(txs);
            make_block(self.prev, self.height as u32, txdata)
        }

        fn connect(
            &mut self,
            messages: Vec<ScriptBuf>,
            txs: Vec<Transaction>,
        ) -> SidechainBlockData {
            let block = self.block(messages, txs);
            let data = self.scdb.connect_block(&block, self.height).unwrap();
            self.prev = block.block_hash();
            self.height += 1;
            data
        }

        fn connect_empty(&mut self, n: u16) {
            for _ in 0..n {
                self.connect(vec![], vec![]);
            }
        }
    }

    fn sidechain_script() -> ScriptBuf {
        p2pkh_script(0x55)
    }

    fn active_sidechain() -> Sidechain {
        Sidechain {
            active: true,
            n_sidechain: SC,
            script_pubkey: sidechain_script().into(),
            title: "T".to_owned(),
            description: "test sidechain".to_owned(),
            ..Default::default()
        }
    }

    /// An active sidechain funded with a 10 BTC CTIP.
    fn funded() -> Harness {
        let snapshot = ScdbStateSnapshot {
            sidechains: vec![active_sidechain()],
            ..Default::default()
        };
        let scdb = Scdb::from_snapshot(snapshot, DefaultVotePolicy::UpvoteNewest).unwrap();
        let mut h = Harness::new(scdb);
        let deposit = make_tx(
            &[outpoint(1, 0)],
            vec![txout(TEN_BTC, sidechain_script()), txout(0, op_return_push(b"sc-addr"))],
        );
        h.connect(vec![], vec![deposit]);
        assert_eq!(h.scdb.ctip(SC).unwrap().amount, BitcoinAmount::from_sat(TEN_BTC));
        h
    }

    fn wt_prime_tx(h: &Harness, change: u64, payout: u64) -> Transaction {
        let ctip = h.scdb.ctip(SC).unwrap();
        make_tx(
            &[*ctip.out.outpoint()],
            vec![txout(change, op_return_push(b"D")), txout(payout, p2pkh_script(0x77))],
        )
    }

    fn upvote(hash: Buf32) -> ScriptBuf {
        CoinbaseMessage::Votes {
            votes: vec![SidechainCustomVote {
                vote: WtPrimeVote::Upvote,
                n_sidechain: SC,
                hash_wt_prime: hash,
            }],
            malformed: 0,
        }
        .to_script()
    }

    #[test]
    fn test_proposal_activates_after_acked_period() {
        let key_hash = Buf32::new([0x11; 32]);
        let keys = derive_sidechain_keys(&key_hash, bitcoin::Network::Regtest).unwrap();
        let proposal = Sidechain {
            n_sidechain: SC,
            key_id: keys.key_id,
            priv_key: keys.priv_key,
            script_pubkey: keys.script_pubkey.into(),
            title: "T".to_owned(),
            description: "d".to_owned(),
            ..Default::default()
        };
        let hash = proposal.proposal_hash();

        let mut h = Harness::new(Scdb::new(DefaultVotePolicy::UpvoteNewest));
        assert!(h.scdb.cache_proposal(proposal.clone()));
        assert!(h.scdb.cache_ack(hash));
        h.connect(vec![CoinbaseMessage::Proposal(proposal.clone()).to_script()], vec![]);
        assert_eq!(h.scdb.activation_status().len(), 1);

        let ack = CoinbaseMessage::Ack(hash).to_script();
        for _ in 0..SIDECHAIN_ACTIVATION_PERIOD - 1 {
            h.connect(vec![ack.clone()], vec![]);
        }
        assert!(!h.scdb.is_active(SC));
        assert_eq!(h.scdb.activation_status()[0].n_fail, 0);

        let data = h.connect(vec![ack], vec![]);
        assert!(h.scdb.is_active(SC));
        assert!(h.scdb.activation_status().is_empty());
        let active: Vec<_> = h.scdb.active_sidechains().collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].title, "T");
        assert!(active[0].active);
        assert_eq!(data.sidechains, vec![active[0].clone()]);

        // Caches forget the proposal once it is decided.
        assert!(h.scdb.cached_proposals().is_empty());
        assert!(h.scdb.cached_acks().is_empty());
    }

    #[test]
    fn test_upvoted_wt_prime_is_paid_out() {
        let mut h = funded();
        let wt = wt_prime_tx(&h, 6 * 100_000_000, 39 * 10_000_000);
        let hash = h.scdb.receive_wt_prime(SC, wt.clone()).unwrap();
        assert_eq!(hash, Buf32::from(wt.compute_txid()));

        for _ in 0..SIDECHAIN_MIN_WORKSCORE {
            h.connect(vec![upvote(hash)], vec![]);
        }
        let state = h.scdb.wt_prime_state(SC, &hash).unwrap();
        assert_eq!(state.n_work_score, SIDECHAIN_MIN_WORKSCORE);
        assert!(state.is_payout_eligible());

        let data = h.connect(vec![], vec![wt.clone()]);
        assert!(h.scdb.have_spent_wt_prime(&hash, SC));
        assert!(!h.scdb.have_failed_wt_prime(&hash, SC));
        assert!(h.scdb.wt_prime_states(SC).is_empty());
        assert_eq!(h.scdb.cached_wt_prime_txs(SC).count(), 0);
        assert_eq!(data.spent_wt_primes.len(), 1);
        assert_eq!(data.spent_wt_primes[0].hash_wt_prime, hash);

        let ctip = h.scdb.ctip(SC).unwrap();
        assert_eq!(ctip.amount, BitcoinAmount::from_sat(6 * 100_000_000));
        assert_eq!(ctip.out.outpoint().txid, wt.compute_txid());
    }

    #[test]
    fn test_unvoted_wt_prime_fails() {
        let mut h = funded();
        let older = h.scdb.receive_wt_prime(SC, wt_prime_tx(&h, 100, 1_000)).unwrap();
        let newer = h.scdb.receive_wt_prime(SC, wt_prime_tx(&h, 200, 1_000)).unwrap();

        h.connect_empty(SIDECHAIN_VERIFICATION_PERIOD - 1);
        assert!(!h.scdb.have_failed_wt_prime(&older, SC));

        h.connect_empty(1);
        assert!(h.scdb.have_failed_wt_prime(&older, SC));
        assert!(h.scdb.wt_prime_state(SC, &older).is_none());
        assert_eq!(h.scdb.cached_wt_prime_txs(SC).count(), 1);

        // The newest bundle got the default upvote every block.
        let state = h.scdb.wt_prime_state(SC, &newer).unwrap();
        assert!(state.is_payout_eligible());
        assert_eq!(state.n_blocks_left, 0);
    }

    #[test]
    fn test_wt_prime_above_ctip_rejected_without_mutation() {
        let mut h = funded();
        let before = h.scdb.to_snapshot();
        let too_much = wt_prime_tx(&h, 100, TEN_BTC);

        let err = h.scdb.receive_wt_prime(SC, too_much).unwrap_err();
        assert!(matches!(err, ScdbError::ConsensusViolation(_)));
        assert_eq!(err.code(), -26);
        assert_eq!(
            err.to_string(),
            "Rejecting WT^: Withdrawn amount greater than CTIP amount!"
        );
        assert_eq!(h.scdb.to_snapshot(), before);
        assert_eq!(h.scdb.cached_wt_prime_txs(SC).count(), 0);
    }

    #[test]
    fn test_wt_prime_with_overflowing_outputs_rejected() {
        let mut h = funded();
        let before = h.scdb.to_snapshot();
        // The output total wraps to 1 sat in u64.
        let wrapping = wt_prime_tx(&h, u64::MAX, 2);

        let err = h.scdb.receive_wt_prime(SC, wrapping).unwrap_err();
        assert!(matches!(err, ScdbError::ConsensusViolation(_)));
        assert_eq!(
            err.to_string(),
            "Rejecting WT^: Withdrawn amount greater than CTIP amount!"
        );
        assert_eq!(h.scdb.to_snapshot(), before);
        assert_eq!(h.scdb.cached_wt_prime_txs(SC).count(), 0);
    }

    #[test]
    fn test_receive_wt_prime_rejections() {
        let mut h = funded();
        let wt = wt_prime_tx(&h, 100, 1_000);

        let err = h.scdb.receive_wt_prime(SC + 1, wt.clone()).unwrap_err();
        assert_eq!(err.to_string(), "Invalid sidechain number!");
        assert_eq!(err.code(), -8);

        h.scdb.receive_wt_prime(SC, wt.clone()).unwrap();
        let err = h.scdb.receive_wt_prime(SC, wt).unwrap_err();
        assert_eq!(err.to_string(), "WT^ rejected from cache (duplicate?)");

        let ctip = *h.scdb.ctip(SC).unwrap().out.outpoint();
        let no_dest = make_tx(&[ctip], vec![txout(1_000, p2pkh_script(0x77))]);
        assert!(h.scdb.receive_wt_prime(SC, no_dest).is_err());

        let unfunded = ScdbStateSnapshot {
            sidechains: vec![active_sidechain()],
            ..Default::default()
        };
        let mut fresh = Scdb::from_snapshot(unfunded, DefaultVotePolicy::UpvoteNewest).unwrap();
        let err = fresh
            .receive_wt_prime(SC, make_tx(&[outpoint(1, 0)], vec![]))
            .unwrap_err();
        assert_eq!(err.to_string(), "Rejecting WT^: No CTIP found!");
    }

    #[test]
    fn test_payout_supersedes_other_bundles() {
        let mut h = funded();
        let loser = h.scdb.receive_wt_prime(SC, wt_prime_tx(&h, 100, 1_000)).unwrap();
        let winner_tx = wt_prime_tx(&h, 200, 1_000);
        let winner = h.scdb.receive_wt_prime(SC, winner_tx.clone()).unwrap();

        h.connect_empty(SIDECHAIN_MIN_WORKSCORE);
        h.connect(vec![], vec![winner_tx]);

        assert!(h.scdb.have_spent_wt_prime(&winner, SC));
        assert!(h.scdb.have_failed_wt_prime(&loser, SC));
        assert!(h.scdb.wt_prime_states(SC).is_empty());
    }

    #[test]
    fn test_ineligible_payout_is_ignored() {
        let mut h = funded();
        let wt = wt_prime_tx(&h, 100, 1_000);
        let hash = h.scdb.receive_wt_prime(SC, wt.clone()).unwrap();
        let ctip = *h.scdb.ctip(SC).unwrap();

        h.connect(vec![], vec![wt]);
        assert!(!h.scdb.have_spent_wt_prime(&hash, SC));
        assert_eq!(h.scdb.ctip(SC), Some(&ctip));
        assert_eq!(h.scdb.wt_prime_state(SC, &hash).unwrap().n_work_score, 1);
    }

    #[test]
    fn test_block_votes_override_custom_and_default() {
        let mut h = funded();
        let hash = h.scdb.receive_wt_prime(SC, wt_prime_tx(&h, 100, 1_000)).unwrap();

        h.scdb.set_custom_vote(SidechainCustomVote {
            vote: WtPrimeVote::Downvote,
            n_sidechain: SC,
            hash_wt_prime: hash,
        });
        h.connect_empty(3);
        assert_eq!(h.scdb.wt_prime_state(SC, &hash).unwrap().n_work_score, 0);

        // Replaces the downvote.
        h.scdb.set_custom_vote(SidechainCustomVote {
            vote: WtPrimeVote::Upvote,
            n_sidechain: SC,
            hash_wt_prime: hash,
        });
        assert_eq!(h.scdb.custom_votes().len(), 1);
        h.connect_empty(2);
        assert_eq!(h.scdb.wt_prime_state(SC, &hash).unwrap().n_work_score, 2);

        let down = CoinbaseMessage::Votes {
            votes: vec![SidechainCustomVote {
                vote: WtPrimeVote::Downvote,
                n_sidechain: SC,
                hash_wt_prime: hash,
            }],
            malformed: 0,
        }
        .to_script();
        h.connect(vec![down], vec![]);
        assert_eq!(h.scdb.wt_prime_state(SC, &hash).unwrap().n_work_score, 1);

        h.scdb.clear_custom_votes();
        assert!(h.scdb.custom_votes().is_empty());
    }

    #[test]
    fn test_announcements() {
        let mut h = funded();
        let announced = Buf32::new([0xaa; 32]);
        let announce = |n| {
            CoinbaseMessage::WtPrimeAnnounce {
                n_sidechain: n,
                hash_wt_prime: announced,
            }
            .to_script()
        };

        h.connect(vec![announce(SC + 1)], vec![]);
        assert!(h.scdb.wt_prime_states(SC + 1).is_empty());

        let data = h.connect(vec![announce(SC), announce(SC)], vec![]);
        let states = h.scdb.wt_prime_states(SC);
        assert_eq!(states.len(), 1);
        assert_eq!(states[0].n_blocks_left, SIDECHAIN_VERIFICATION_PERIOD - 1);
        assert_eq!(data.wt_prime_status, vec![states.to_vec()]);
        assert!(data.is_well_formed());
    }

    #[test]
    fn test_deposits_extend_ctip() {
        let mut h = funded();
        let ctip = *h.scdb.ctip(SC).unwrap().out.outpoint();

        let stray = make_tx(
            &[outpoint(2, 0)],
            vec![txout(TEN_BTC * 2, sidechain_script()), txout(0, op_return_push(b"x"))],
        );
        let good = make_tx(
            &[ctip, outpoint(3, 0)],
            vec![txout(TEN_BTC + 5, sidechain_script()), txout(0, op_return_push(b"y"))],
        );
        h.connect(vec![], vec![stray, good.clone()]);

        assert_eq!(h.scdb.ctip(SC).unwrap().amount, BitcoinAmount::from_sat(TEN_BTC + 5));
        let deposits: Vec<_> = h.scdb.deposits_for(SC).collect();
        assert_eq!(deposits.len(), 2);
        assert_eq!(deposits[0].txid(), Buf32::from(good.compute_txid()));
        assert_eq!(deposits[0].str_dest, "y");
        assert_eq!(deposits[0].n_tx, 2);
        assert_eq!(deposits[1].str_dest, "sc-addr");
    }

    #[test]
    fn test_rejects_unlinked_block_without_mutation() {
        let mut h = funded();
        let before = h.scdb.to_snapshot();

        let block = make_block(
            BlockHash::from_byte_array([3; 32]),
            0,
            vec![make_coinbase(h.height, INITIAL_SUBSIDY, vec![])],
        );
        assert!(h.scdb.connect_block(&block, h.height).is_err());

        let block = h.block(vec![], vec![]);
        assert!(h.scdb.connect_block(&block, h.height + 1).is_err());
        assert_eq!(h.scdb.to_snapshot(), before);
    }

    #[test]
    fn test_snapshot_roundtrip_keeps_hash() {
        let mut h = funded();
        h.scdb.receive_wt_prime(SC, wt_prime_tx(&h, 100, 1_000)).unwrap();
        h.connect_empty(2);

        let restored =
            Scdb::from_snapshot(h.scdb.to_snapshot(), DefaultVotePolicy::Abstain).unwrap();
        assert_eq!(restored.scdb_hash(), h.scdb.scdb_hash());
        assert_eq!(restored.last_block(), h.scdb.last_block());
        assert_eq!(restored.policy(), DefaultVotePolicy::Abstain);
        assert!(restored.deposits().is_empty());

        let mut dup = h.scdb.to_snapshot();
        dup.sidechains.push(active_sidechain());
        assert!(Scdb::from_snapshot(dup, DefaultVotePolicy::UpvoteNewest).is_err());
    }

    #[test]
    fn test_scdb_hash_idempotent() {
        let h = funded();
        assert_eq!(h.scdb.scdb_hash(), h.scdb.scdb_hash());
        assert_eq!(h.scdb.clone().scdb_hash(), h.scdb.scdb_hash());
    }

    #[test]
    fn test_removed_bmm_cache() {
        let mut scdb = Scdb::default();
        scdb.cache_removed_bmm(Buf32::new([1; 32]));
        scdb.cache_removed_bmm(Buf32::new([1; 32]));
        assert_eq!(scdb.removed_bmm(), &[Buf32::new([1; 32])]);
    }
}
