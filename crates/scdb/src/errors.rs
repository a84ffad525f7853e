use drivechain_db_types::DbError;
use thiserror::Error;

/// JSON-RPC codes, numbered as in Bitcoin Core.
pub mod codes {
    pub const RPC_MISC_ERROR: i32 = -1;
    pub const RPC_INVALID_ADDRESS_OR_KEY: i32 = -5;
    pub const RPC_INVALID_PARAMETER: i32 = -8;
    pub const RPC_VERIFY_REJECTED: i32 = -26;
    pub const RPC_INTERNAL_ERROR: i32 = -32603;
}

#[derive(Debug, Error)]
pub enum ScdbError {
    /// Malformed hash, hex or length, or a sidechain number out of range.
    #[error("{0}")]
    InvalidInput(String),

    /// Unknown block, sidechain or WT^, or no cached data.
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    ConsensusViolation(String),

    #[error("Sorry, this function is not supported yet.")]
    Unsupported,

    #[error("{0}")]
    Internal(String),

    #[error("db: {0}")]
    Storage(#[from] DbError),
}

impl ScdbError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::ConsensusViolation(msg.into())
    }

    pub fn code(&self) -> i32 {
        match self {
            Self::InvalidInput(_) => codes::RPC_INVALID_PARAMETER,
            Self::NotFound(_) => codes::RPC_INVALID_ADDRESS_OR_KEY,
            Self::ConsensusViolation(_) => codes::RPC_VERIFY_REJECTED,
            Self::Unsupported => codes::RPC_MISC_ERROR,
            Self::Internal(_) | Self::Storage(_) => codes::RPC_INTERNAL_ERROR,
        }
    }
}

pub type ScdbResult<T> = Result<T, ScdbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(ScdbError::invalid_input("x").code(), -8);
        assert_eq!(ScdbError::not_found("x").code(), -5);
        assert_eq!(ScdbError::rejected("x").code(), -26);
        assert_eq!(ScdbError::Unsupported.code(), -1);
        assert_eq!(ScdbError::Internal("x".into()).code(), -32603);
        assert_eq!(
            ScdbError::from(DbError::Other("disk".into())).code(),
            -32603
        );
    }

    #[test]
    fn test_messages_pass_through() {
        assert_eq!(
            ScdbError::not_found("Block not found").to_string(),
            "Block not found"
        );
        assert_eq!(
            ScdbError::Unsupported.to_string(),
            "Sorry, this function is not supported yet."
        );
    }
}
