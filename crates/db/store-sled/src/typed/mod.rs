//! Schema-typed access to sled trees.

mod codec;
mod db;
mod transaction;
mod tree;

pub use codec::{CodecError, CodecResult, KeyCodec, Schema, TreeName, ValueCodec};
pub(crate) use codec::fixed;
pub use db::SledDb;
pub use transaction::SledTransactional;
pub use tree::{SledTransactionalTree, SledTree, SledTreeIter};
