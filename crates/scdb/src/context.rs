//! The node's single owner of the SCDB.

use std::{fmt, sync::Arc};

use bitcoin::Block;
use drivechain_db_types::traits::ScdbDatabase;
use drivechain_primitives::Buf32;
use drivechain_scdb_types::{DefaultVotePolicy, SidechainBlockData, SidechainDeposit};
use parking_lot::{RwLock, RwLockReadGuard};
use tracing::{info, instrument, warn};

use crate::{
    errors::{ScdbError, ScdbResult},
    hasher,
    scdb::Scdb,
    verify::{self, BmmProof, ChainView},
};

/// Owns the [`Scdb`] behind a lock together with its storage and the chain view.
///
/// Blocks are connected on a copy of the state, and the copy replaces the live state
/// only after the block data and checkpoint have been written.
pub struct ConsensusContext {
    scdb: RwLock<Scdb>,
    db: Arc<dyn ScdbDatabase>,
    chain: Arc<dyn ChainView>,
}

impl fmt::Debug for ConsensusContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsensusContext")
            .field("last_block", &self.scdb.read().last_block())
            .finish_non_exhaustive()
    }
}

impl ConsensusContext {
    /// Resumes from the latest checkpoint in `db`, or starts empty.
    pub fn load(
        db: Arc<dyn ScdbDatabase>,
        chain: Arc<dyn ChainView>,
        policy: DefaultVotePolicy,
    ) -> ScdbResult<Self> {
        if policy == DefaultVotePolicy::Abstain {
            warn!("scdb: default vote policy is abstain, other nodes upvote the newest WT^");
        }

        let scdb = match db.get_latest_state()? {
            Some(snapshot) => Scdb::from_snapshot(snapshot, policy)?,
            None => Scdb::new(policy),
        };
        info!(tip = ?scdb.last_block(), ?policy, "scdb: loaded state");

        Ok(Self {
            scdb: RwLock::new(scdb),
            db,
            chain,
        })
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Scdb> {
        self.scdb.read()
    }

    /// Runs `f` with write access, for cache updates requested by the operator.
    pub fn update<R>(&self, f: impl FnOnce(&mut Scdb) -> R) -> R {
        f(&mut self.scdb.write())
    }

    pub fn chain(&self) -> &dyn ChainView {
        self.chain.as_ref()
    }

    /// Connects a block and persists its data. The live state is untouched on error.
    #[instrument(skip_all, fields(%height, hash = %block.block_hash()))]
    pub fn connect_block(&self, block: &Block, height: u64) -> ScdbResult<SidechainBlockData> {
        let mut live = self.scdb.write();
        let mut next = live.clone();
        let data = next.connect_block(block, height)?;

        let hash = Buf32::from(block.block_hash());
        self.db
            .put_block_data(height, hash, &data, &next.to_snapshot())?;
        *live = next;

        info!(
            sidechains = %data.sidechains.len(),
            pending = %data.activation_status.len(),
            "scdb: connected block"
        );
        Ok(data)
    }

    /// Connects the canonical blocks the chain view has beyond the SCDB tip. Returns how
    /// many were connected.
    pub fn catch_up(&self) -> ScdbResult<u64> {
        let Some(tip) = self.chain.current_height()? else {
            return Ok(0);
        };
        let start = self.read().last_block().map_or(0, |(h, _)| h + 1);

        let mut connected = 0;
        for height in start..=tip {
            let hash = self
                .chain
                .block_hash_at_height(height)?
                .ok_or_else(|| ScdbError::Internal(format!("no canonical block at {height}")))?;
            let block = self
                .chain
                .block_by_hash(&hash)?
                .ok_or_else(|| ScdbError::Internal(format!("missing block {hash}")))?;
            self.connect_block(&block, height)?;
            connected += 1;
        }

        if connected > 0 {
            info!(%connected, %tip, "scdb: caught up with block archive");
        }
        Ok(connected)
    }

    pub fn block_data(&self, hash: Buf32) -> ScdbResult<Option<SidechainBlockData>> {
        Ok(self.db.get_block_data(hash)?)
    }

    pub fn total_scdb_hash(&self) -> ScdbResult<Buf32> {
        Ok(hasher::total_scdb_hash(self.db.get_raw_history()?))
    }

    pub fn verify_bmm(&self, hash_block: &Buf32, h_star: &Buf32) -> ScdbResult<BmmProof> {
        verify::verify_bmm(self.chain(), hash_block, h_star)
    }

    pub fn verify_deposit(
        &self,
        hash_block: &Buf32,
        txid: &Buf32,
        n_tx: u32,
    ) -> ScdbResult<SidechainDeposit> {
        let scdb = self.read();
        verify::verify_deposit(
            self.chain(),
            scdb.deposits(),
            scdb.sidechain_map(),
            hash_block,
            txid,
            n_tx,
        )
    }
}

#[cfg(test)]
mod tests {
    use bitcoin::{hashes::Hash as _, BlockHash};
    use drivechain_db_store_sled::{ScdbDBSled, SledDb, SledDbConfig};
    use drivechain_db_types::traits::BlockArchiveDatabase;
    use drivechain_scdb_types::{bmm_commitment_script, ScdbStateSnapshot};
    use drivechain_test_utils::btc::{make_block, make_chain, make_coinbase, INITIAL_SUBSIDY};

    use super::*;
    use crate::verify::tests::archive_view;

    struct Fixture {
        ctx: ConsensusContext,
        scdb_db: Arc<ScdbDBSled>,
        archive: Arc<drivechain_db_store_sled::BlockArchiveDBSled>,
    }

    fn setup() -> Fixture {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let sled_db = Arc::new(SledDb::new(Arc::new(db)));
        let scdb_db = Arc::new(ScdbDBSled::new(sled_db, SledDbConfig::test()).unwrap());
        let (archive, view) = archive_view();
        let ctx = ConsensusContext::load(
            scdb_db.clone(),
            Arc::new(view),
            DefaultVotePolicy::UpvoteNewest,
        )
        .unwrap();
        Fixture {
            ctx,
            scdb_db,
            archive,
        }
    }

    #[test]
    fn test_connect_persists_block_data() {
        let f = setup();
        let blocks = make_chain(BlockHash::all_zeros(), 0, 3);
        let mut hashes = Vec::new();
        for (h, b) in blocks.iter().enumerate() {
            let data = f.ctx.connect_block(b, h as u64).unwrap();
            let hash = Buf32::from(b.block_hash());
            assert_eq!(f.ctx.block_data(hash).unwrap(), Some(data));
            hashes.push(hash);
        }

        assert_eq!(f.scdb_db.get_tip().unwrap(), Some((2, hashes[2])));
        let state = f.scdb_db.get_latest_state().unwrap().unwrap();
        assert_eq!(state.last_block, Some((2, hashes[2])));

        let raw = f.scdb_db.get_raw_history().unwrap();
        assert_eq!(raw.len(), 3);
        assert_eq!(f.ctx.total_scdb_hash().unwrap(), hasher::total_scdb_hash(&raw));
        assert_ne!(f.ctx.total_scdb_hash().unwrap(), Buf32::zero());
    }

    #[test]
    fn test_failed_write_keeps_live_state() {
        let f = setup();
        let blocks = make_chain(BlockHash::all_zeros(), 0, 2);
        f.ctx.connect_block(&blocks[0], 0).unwrap();
        let before = f.ctx.read().to_snapshot();

        // Occupy the next block's slot so the write is rejected.
        let next_hash = Buf32::from(blocks[1].block_hash());
        let data = SidechainBlockData::new(vec![], vec![], vec![], vec![]);
        f.scdb_db
            .put_block_data(1, next_hash, &data, &ScdbStateSnapshot::default())
            .unwrap();

        let err = f.ctx.connect_block(&blocks[1], 1).unwrap_err();
        assert!(matches!(err, ScdbError::Storage(_)));
        assert_eq!(f.ctx.read().to_snapshot(), before);
    }

    #[test]
    fn test_load_resumes_from_checkpoint() {
        let f = setup();
        for (h, b) in make_chain(BlockHash::all_zeros(), 0, 2).iter().enumerate() {
            f.ctx.connect_block(b, h as u64).unwrap();
        }
        let (_, view) = archive_view();
        let resumed =
            ConsensusContext::load(f.scdb_db.clone(), Arc::new(view), DefaultVotePolicy::Abstain)
                .unwrap();
        assert_eq!(resumed.read().scdb_hash(), f.ctx.read().scdb_hash());
        assert_eq!(resumed.read().last_block(), f.ctx.read().last_block());
    }

    #[test]
    fn test_catch_up_replays_archive() {
        let f = setup();
        assert_eq!(f.ctx.catch_up().unwrap(), 0);

        let blocks = make_chain(BlockHash::all_zeros(), 0, 4);
        for (h, b) in blocks.iter().enumerate() {
            f.archive.put_block(h as u64, b).unwrap();
        }
        f.ctx.connect_block(&blocks[0], 0).unwrap();

        assert_eq!(f.ctx.catch_up().unwrap(), 3);
        assert_eq!(
            f.ctx.read().last_block(),
            Some((3, Buf32::from(blocks[3].block_hash())))
        );
        assert_eq!(f.ctx.catch_up().unwrap(), 0);
    }

    #[test]
    fn test_verify_bmm_through_context() {
        let f = setup();
        let h_star = Buf32::new([0x5e; 32]);
        let cb = make_coinbase(0, INITIAL_SUBSIDY, vec![bmm_commitment_script(&h_star, &[])]);
        let txid = Buf32::from(cb.compute_txid());
        let block = make_block(BlockHash::all_zeros(), 77, vec![cb]);
        f.archive.put_block(0, &block).unwrap();
        let hash = Buf32::from(block.block_hash());

        let proof = f.ctx.verify_bmm(&hash, &h_star).unwrap();
        assert_eq!(proof, BmmProof { txid, time: 77 });

        let err = f.ctx.verify_bmm(&hash, &Buf32::new([1; 32])).unwrap_err();
        assert!(matches!(err, ScdbError::NotFound(_)));
    }

    #[test]
    fn test_update_caches() {
        let f = setup();
        f.ctx.update(|scdb| scdb.cache_removed_bmm(Buf32::new([4; 32])));
        assert_eq!(f.ctx.read().removed_bmm().len(), 1);
    }
}
