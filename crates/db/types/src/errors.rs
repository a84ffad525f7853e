use drivechain_primitives::Buf32;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DbError {
    #[error("entry for block {0} already exists")]
    EntryAlreadyExists(Buf32),

    #[error("tried to insert into {0} out-of-order height {1}")]
    OooInsert(&'static str, u64),

    /// (height, expected parent)
    #[error("block at height {0} does not extend canonical tip {1}")]
    InvalidNextBlock(u64, Buf32),

    #[error("missing block data (hash {0})")]
    MissingBlockData(Buf32),

    #[error("malformed record in {0}")]
    MalformedRecord(&'static str),

    #[error("codec error {0}")]
    CodecError(String),

    #[error("transaction error {0}")]
    TransactionError(String),

    #[error("IO Error: {0}")]
    IoError(String),

    #[error("{0}")]
    Other(String),
}
