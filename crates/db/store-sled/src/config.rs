use std::{fmt::Debug, sync::Arc, thread, time::Duration};

use drivechain_db_types::{DbError, DbResult};
use sled::transaction::ConflictableTransactionResult;
use tracing::warn;

use crate::typed::SledTransactional;

pub(crate) const DEFAULT_RETRY_COUNT: u16 = 3;
pub(crate) const DEFAULT_RETRY_DELAY_MS: u64 = 150;
pub(crate) const TEST_RETRY_DELAY_MS: u64 = 10;

/// Delay policy between retries of a failed write.
pub trait Backoff: Debug + Send + Sync {
    fn delay(&self, attempt: u16) -> Duration;
}

#[derive(Debug, Clone, Copy)]
pub struct ConstantBackoff {
    delay_ms: u64,
}

impl ConstantBackoff {
    pub fn new(delay_ms: u64) -> Self {
        Self { delay_ms }
    }
}

impl Backoff for ConstantBackoff {
    fn delay(&self, _attempt: u16) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Database operations configuration.
#[derive(Debug, Clone)]
pub struct SledDbConfig {
    pub retry_count: u16,
    pub backoff: Arc<dyn Backoff>,
}

impl SledDbConfig {
    pub fn new(retry_count: u16, backoff: Arc<dyn Backoff>) -> Self {
        Self {
            retry_count,
            backoff,
        }
    }

    pub fn new_with_constant_backoff(retry_count: u16, delay_ms: u64) -> Self {
        Self::new(retry_count, Arc::new(ConstantBackoff::new(delay_ms)))
    }

    pub fn production() -> Self {
        Self::new_with_constant_backoff(DEFAULT_RETRY_COUNT, DEFAULT_RETRY_DELAY_MS)
    }

    /// Same retry count with shorter delays.
    pub fn test() -> Self {
        Self::new_with_constant_backoff(DEFAULT_RETRY_COUNT, TEST_RETRY_DELAY_MS)
    }

    /// Runs a transaction, retrying storage-level failures.
    ///
    /// Errors the closure aborts with are returned as is.
    pub fn with_retry<Trees, F, R>(&self, trees: Trees, f: F) -> DbResult<R>
    where
        Trees: SledTransactional,
        F: Fn(Trees::View) -> ConflictableTransactionResult<R, DbError>,
    {
        let mut attempt = 0;
        loop {
            match trees.transaction(&f) {
                Err(DbError::TransactionError(msg)) if attempt < self.retry_count => {
                    attempt += 1;
                    warn!(%attempt, err = %msg, "sled transaction failed, retrying");
                    thread::sleep(self.backoff.delay(attempt));
                }
                res => return res,
            }
        }
    }
}
