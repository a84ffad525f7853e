use drivechain_primitives::Buf32;
use drivechain_scdb_types::{constants::DB_SIDECHAIN_BLOCK_OP, ScdbStateSnapshot, SidechainBlockData};

use crate::{
    define_table_with_borsh_codec,
    typed::{fixed, CodecResult, KeyCodec},
};

/// Block data key: the record op byte followed by the block hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct BlockDataKey(pub(crate) Buf32);

impl KeyCodec<ScdbBlockDataSchema> for BlockDataKey {
    fn encode_key(&self) -> CodecResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(33);
        buf.push(DB_SIDECHAIN_BLOCK_OP);
        buf.extend_from_slice(self.0.as_slice());
        Ok(buf)
    }

    fn decode_key(buf: &[u8]) -> CodecResult<Self> {
        let raw = fixed::<33>("ScdbBlockDataSchema", buf)?;
        let mut hash = [0; 32];
        hash.copy_from_slice(&raw[1..]);
        Ok(Self(Buf32::new(hash)))
    }
}

/// Key of the single-row trees.
pub(crate) const SINGLETON_KEY: u8 = 0;

define_table_with_borsh_codec!(
    /// A table to store per-block sidechain data.
    (ScdbBlockDataSchema) BlockDataKey => SidechainBlockData
);

define_table_with_borsh_codec!(
    /// A table to map block height to block hash.
    (ScdbHeightSchema) u64 => Buf32
);

define_table_with_borsh_codec!(
    /// A table holding the height and hash of the last written block.
    (ScdbTipSchema) u8 => (u64, Buf32)
);

define_table_with_borsh_codec!(
    /// A table holding the consensus state after the last written block.
    (ScdbStateSchema) u8 => ScdbStateSnapshot
);
