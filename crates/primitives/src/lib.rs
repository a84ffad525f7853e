//! Primitive types shared by the drivechain node crates.
//!
//! Hash buffers here follow the base chain's display convention: the bytes are stored
//! in internal order and rendered reversed, the way block hashes and txids are shown.

pub mod amount;
pub mod btc;
pub mod buf;
pub mod errors;
pub mod hash;
mod macros;

pub use amount::BitcoinAmount;
pub use btc::{BitcoinOutPoint, BitcoinScript, BitcoinTx};
pub use buf::{Buf20, Buf32};
pub use errors::ParseBufError;
