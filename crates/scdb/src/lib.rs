//! Sidechain withdrawal consensus: activation voting, WT^ workscores, CTIPs and the
//! block connector tying them together.

pub mod activation;
pub mod context;
pub mod ctip;
pub mod errors;
pub mod fee;
pub mod hasher;
pub mod keys;
pub mod scdb;
pub mod verify;
pub mod workscore;

pub use context::ConsensusContext;
pub use errors::{ScdbError, ScdbResult};
pub use scdb::Scdb;
pub use verify::{ArchiveChainView, BmmProof, ChainView};
