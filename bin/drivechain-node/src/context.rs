//! Storage and consensus context construction.

use std::sync::Arc;

use drivechain_config::Config;
use drivechain_db_store_sled::{open_sled_backend, BlockArchiveDBSled, SledDbConfig, SLED_NAME};
use drivechain_scdb::{ArchiveChainView, ConsensusContext};
use tracing::info;

use crate::errors::InitError;

/// What the rest of the node runs on.
#[derive(Debug, Clone)]
pub(crate) struct NodeContext {
    pub(crate) config: Config,
    pub(crate) consensus: Arc<ConsensusContext>,
    pub(crate) archive: Arc<BlockArchiveDBSled>,
}

/// Opens the stores under the datadir, loads the SCDB checkpoint and replays archived
/// blocks it has not seen.
pub(crate) fn init_node_context(config: Config) -> Result<NodeContext, InitError> {
    let ops_config = SledDbConfig::new_with_constant_backoff(
        config.client.db_retry_count,
        config.client.db_retry_delay_ms,
    );
    let backend = open_sled_backend(&config.client.datadir, SLED_NAME, ops_config)
        .map_err(|e| InitError::StorageCreation(e.to_string()))?;

    let archive = backend.block_db();
    let chain = Arc::new(ArchiveChainView::new(archive.clone()));
    let consensus = ConsensusContext::load(
        backend.scdb_db(),
        chain,
        config.scdb.default_vote_policy,
    )
    .map_err(|e| InitError::StorageCreation(e.to_string()))?;

    let replayed = consensus
        .catch_up()
        .map_err(|e| InitError::StorageCreation(e.to_string()))?;
    info!(datadir = %config.client.datadir.display(), %replayed, "opened node storage");

    Ok(NodeContext {
        config,
        consensus: Arc::new(consensus),
        archive,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_fresh_datadir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.client.datadir = dir.path().to_path_buf();

        let ctx = init_node_context(config).unwrap();
        assert_eq!(ctx.consensus.read().last_block(), None);
        assert!(dir.path().join("sled").join(SLED_NAME).exists());
    }
}
