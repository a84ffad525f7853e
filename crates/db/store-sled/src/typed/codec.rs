use std::fmt::Debug;

use drivechain_db_types::DbError;
use drivechain_primitives::Buf32;
use thiserror::Error;

/// A wrapper for `&'static str` for type safety.
#[derive(Debug, Hash, Eq, PartialEq)]
pub struct TreeName(pub &'static str);

impl TreeName {
    pub fn into_inner(self) -> &'static str {
        self.0
    }
}

pub trait Schema: Debug + Send + Sync + Sized {
    const TREE_NAME: TreeName;

    type Key: KeyCodec<Self>;
    type Value: ValueCodec<Self>;
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid key length in '{schema}' (expected {expected}, got {actual})")]
    InvalidKeyLength {
        schema: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("failed to serialize for '{schema}': {source}")]
    SerializationFailed {
        schema: &'static str,
        source: std::io::Error,
    },

    #[error("failed to deserialize for '{schema}': {source}")]
    DeserializationFailed {
        schema: &'static str,
        source: std::io::Error,
    },

    #[error("{0}")]
    Other(String),
}

impl From<CodecError> for DbError {
    fn from(value: CodecError) -> Self {
        DbError::CodecError(value.to_string())
    }
}

pub type CodecResult<T> = Result<T, CodecError>;

pub trait KeyCodec<S: Schema>: Sized {
    fn encode_key(&self) -> CodecResult<Vec<u8>>;
    fn decode_key(buf: &[u8]) -> CodecResult<Self>;
}

pub trait ValueCodec<S: Schema>: Sized {
    fn encode_value(&self) -> CodecResult<Vec<u8>>;
    fn decode_value(buf: &[u8]) -> CodecResult<Self>;
}

pub(crate) fn fixed<const N: usize>(schema: &'static str, buf: &[u8]) -> CodecResult<[u8; N]> {
    <[u8; N]>::try_from(buf).map_err(|_| CodecError::InvalidKeyLength {
        schema,
        expected: N,
        actual: buf.len(),
    })
}

// Big-endian so sled's byte order is numeric order.
impl<S: Schema> KeyCodec<S> for u64 {
    fn encode_key(&self) -> CodecResult<Vec<u8>> {
        Ok(self.to_be_bytes().to_vec())
    }

    fn decode_key(buf: &[u8]) -> CodecResult<Self> {
        fixed::<8>(S::TREE_NAME.0, buf).map(u64::from_be_bytes)
    }
}

impl<S: Schema> KeyCodec<S> for u8 {
    fn encode_key(&self) -> CodecResult<Vec<u8>> {
        Ok(vec![*self])
    }

    fn decode_key(buf: &[u8]) -> CodecResult<Self> {
        fixed::<1>(S::TREE_NAME.0, buf).map(|b| b[0])
    }
}

impl<S: Schema> KeyCodec<S> for Buf32 {
    fn encode_key(&self) -> CodecResult<Vec<u8>> {
        Ok(self.as_slice().to_vec())
    }

    fn decode_key(buf: &[u8]) -> CodecResult<Self> {
        fixed::<32>(S::TREE_NAME.0, buf).map(Buf32::new)
    }
}
