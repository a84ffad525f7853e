use thiserror::Error;

/// Errors decoding sidechain records out of scripts and strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("script is not an OP_RETURN output")]
    NotOpReturn,

    #[error("unknown message header {0:02x?}")]
    UnknownHeader([u8; 4]),

    #[error("payload too short (expected {expected}, got {got})")]
    Truncated { expected: usize, got: usize },

    #[error("trailing bytes after payload ({0})")]
    TrailingBytes(usize),

    #[error("invalid vote character {0:?}")]
    InvalidVote(char),

    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("invalid deposit address: {0}")]
    InvalidDepositAddress(&'static str),
}

impl From<std::io::Error> for CodecError {
    fn from(value: std::io::Error) -> Self {
        Self::Malformed(value.to_string())
    }
}
