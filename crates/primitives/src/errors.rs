//! Errors during parsing of primitives.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseBufError {
    #[error("expected {expected_chars} hex chars, got '{input}'")]
    InvalidHex {
        expected_chars: usize,
        input: String,
    },
}
