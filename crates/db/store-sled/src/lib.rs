//! Sled store for the drivechain node.

pub mod blocks;
mod config;
mod init;
pub mod macros;
pub mod scdb;
pub mod typed;
mod utils;

use std::{path::Path, sync::Arc};

pub use blocks::db::BlockArchiveDBSled;
use drivechain_db_types::DbResult;
pub use scdb::db::ScdbDBSled;

pub use crate::{
    config::{Backoff, ConstantBackoff, SledDbConfig},
    init::open_sled_database,
    typed::SledDb,
};

pub const SLED_NAME: &str = "drivechain-node";

/// Opens every store of the node from `datadir`.
pub fn open_sled_backend(
    datadir: &Path,
    dbname: &'static str,
    ops_config: SledDbConfig,
) -> anyhow::Result<SledBackend> {
    let sled_db = open_sled_database(datadir, dbname)?;
    SledBackend::new(sled_db, ops_config)
        .map_err(|e| anyhow::anyhow!("failed to initialize sled backend: {e}"))
}

/// All sled-backed stores, sharing one sled instance.
#[derive(Debug, Clone)]
pub struct SledBackend {
    scdb_db: Arc<ScdbDBSled>,
    block_db: Arc<BlockArchiveDBSled>,
}

impl SledBackend {
    pub fn new(sled_db: Arc<SledDb>, config: SledDbConfig) -> DbResult<Self> {
        let scdb_db = Arc::new(ScdbDBSled::new(sled_db.clone(), config.clone())?);
        let block_db = Arc::new(BlockArchiveDBSled::new(sled_db, config)?);
        Ok(Self { scdb_db, block_db })
    }

    pub fn scdb_db(&self) -> Arc<ScdbDBSled> {
        self.scdb_db.clone()
    }

    pub fn block_db(&self) -> Arc<BlockArchiveDBSled> {
        self.block_db.clone()
    }
}

#[cfg(test)]
mod tests {
    use drivechain_db_types::traits::ScdbDatabase;

    use super::*;

    #[test]
    fn test_open_backend_in_datadir() {
        let dir = tempfile::tempdir().unwrap();
        let backend = open_sled_backend(dir.path(), SLED_NAME, SledDbConfig::test()).unwrap();
        assert!(dir.path().join("sled").join(SLED_NAME).exists());
        assert_eq!(backend.scdb_db().get_tip().unwrap(), None);
    }
}
