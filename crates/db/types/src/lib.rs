//! Database abstractions for the drivechain node.

pub mod errors;
pub mod traits;

pub use errors::DbError;

pub type DbResult<T> = Result<T, DbError>;
