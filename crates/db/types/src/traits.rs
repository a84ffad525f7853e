//! Trait definitions for the node's storage interfaces.

use bitcoin::Block;
use drivechain_primitives::Buf32;
use drivechain_scdb_types::{ScdbStateSnapshot, SidechainBlockData};

use crate::DbResult;

/// Per-block sidechain database records plus the latest consensus checkpoint.
pub trait ScdbDatabase: Send + Sync + 'static {
    /// Writes the block data for `hash` at `height` together with the consensus state it
    /// produced. All or nothing. Fails if the hash already has data or `height` does not
    /// follow the current tip.
    fn put_block_data(
        &self,
        height: u64,
        hash: Buf32,
        data: &SidechainBlockData,
        state: &ScdbStateSnapshot,
    ) -> DbResult<()>;

    fn get_block_data(&self, hash: Buf32) -> DbResult<Option<SidechainBlockData>>;

    fn get_block_data_at_height(&self, height: u64) -> DbResult<Option<SidechainBlockData>>;

    /// Height and hash of the last block with data.
    fn get_tip(&self) -> DbResult<Option<(u64, Buf32)>>;

    /// Consensus state after the last written block.
    fn get_latest_state(&self) -> DbResult<Option<ScdbStateSnapshot>>;

    /// The exact stored bytes of every block data record, in height order.
    fn get_raw_history(&self) -> DbResult<Vec<Vec<u8>>>;
}

/// Archive of connected base chain blocks. Operations are not validated beyond
/// linkage to the canonical tip.
pub trait BlockArchiveDatabase: Send + Sync + 'static {
    /// Stores `block` and makes it canonical at `height`.
    fn put_block(&self, height: u64, block: &Block) -> DbResult<()>;

    fn get_block(&self, hash: Buf32) -> DbResult<Option<Block>>;

    fn get_block_height(&self, hash: Buf32) -> DbResult<Option<u64>>;

    fn get_canonical_hash(&self, height: u64) -> DbResult<Option<Buf32>>;

    fn get_canonical_tip(&self) -> DbResult<Option<(u64, Buf32)>>;
}
