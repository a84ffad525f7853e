//! Types for the JSON-RPC API.
//!
//! Field names are kept exactly as sidechains and miners already expect them.

mod scdb;
mod sidechain;
mod wtprime;

pub use scdb::*;
pub use sidechain::*;
pub use wtprime::*;
