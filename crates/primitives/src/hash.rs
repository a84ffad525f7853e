//! Common wrapper around whatever we choose our native hash function to be.

use bitcoin::hashes::{sha256d, Hash as _};
use borsh::BorshSerialize;

use crate::buf::Buf32;

/// Double SHA-256 of the input, in internal byte order.
pub fn sha256d(buf: &[u8]) -> Buf32 {
    Buf32::new(sha256d::Hash::hash(buf).to_byte_array())
}

/// Computes the double SHA-256 of the borsh encoding of `v`.
pub fn compute_borsh_hash<T: BorshSerialize>(v: &T) -> Buf32 {
    let buf = borsh::to_vec(v).expect("buf: borsh serialize");
    sha256d(&buf)
}
