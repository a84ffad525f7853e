use bitcoin::Block;
use drivechain_primitives::Buf32;

use crate::{
    define_table_with_borsh_codec, define_table_without_codec, impl_consensus_value_codec,
    impl_integer_value_codec,
};

define_table_without_codec!(
    /// A table to store base chain blocks by hash.
    (BlockSchema) Buf32 => Block
);
impl_consensus_value_codec!(BlockSchema, Block);

define_table_without_codec!(
    /// A table to map block hash to height.
    (BlockHeightSchema) Buf32 => u64
);
impl_integer_value_codec!(BlockHeightSchema, u64);

define_table_with_borsh_codec!(
    /// A table to map height to the canonical block hash.
    (CanonicalBlockSchema) u64 => Buf32
);

define_table_with_borsh_codec!(
    /// A table holding the canonical tip.
    (CanonicalTipSchema) u8 => (u64, Buf32)
);

pub(crate) const TIP_KEY: u8 = 0;
