//! Mapping of SCDB errors onto JSON-RPC error objects.

use drivechain_scdb::ScdbError;
use jsonrpsee::types::ErrorObjectOwned;
use tracing::{error, warn};

/// Keeps the error's message and its Bitcoin Core compatible code.
pub(crate) fn scdb_error(e: ScdbError) -> ErrorObjectOwned {
    match &e {
        ScdbError::Internal(_) | ScdbError::Storage(_) => error!(%e, "rpc: request failed"),
        _ => warn!(%e, "rpc: request rejected"),
    }
    ErrorObjectOwned::owned(e.code(), e.to_string(), None::<()>)
}
