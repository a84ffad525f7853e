use arbitrary::Arbitrary;
use bitcoin::{hashes::Hash as _, BlockHash, Txid};
use borsh::{BorshDeserialize, BorshSerialize};

use crate::macros::impl_hash_buf;

/// 32-byte hash buffer, the `uint256` of the base chain.
#[derive(
    Copy,
    Clone,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Arbitrary,
    BorshSerialize,
    BorshDeserialize,
)]
pub struct Buf32([u8; 32]);

impl_hash_buf!(Buf32, 32);

/// 20-byte hash buffer, the `uint160` of the base chain.
#[derive(
    Copy,
    Clone,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Arbitrary,
    BorshSerialize,
    BorshDeserialize,
)]
pub struct Buf20([u8; 20]);

impl_hash_buf!(Buf20, 20);

impl From<Txid> for Buf32 {
    fn from(value: Txid) -> Self {
        Self(value.to_byte_array())
    }
}

impl From<Buf32> for Txid {
    fn from(value: Buf32) -> Self {
        Txid::from_byte_array(value.0)
    }
}

impl From<BlockHash> for Buf32 {
    fn from(value: BlockHash) -> Self {
        Self(value.to_byte_array())
    }
}

impl From<Buf32> for BlockHash {
    fn from(value: Buf32) -> Self {
        BlockHash::from_byte_array(value.0)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_display_matches_txid_order() {
        let mut raw = [0u8; 32];
        raw[0] = 0xab;
        raw[31] = 0x01;
        let buf = Buf32::new(raw);
        let txid = Txid::from(buf);

        assert_eq!(buf.to_string(), txid.to_string());
        assert!(buf.to_string().starts_with("01"));
        assert!(buf.to_string().ends_with("ab"));
    }

    #[test]
    fn test_parse_display_hex() {
        let s = "00000000000000000000000000000000000000000000000000000000000000ff";
        let buf = Buf32::from_str(s).unwrap();
        assert_eq!(buf.as_bytes()[0], 0xff);
        assert_eq!(buf.to_string(), s);
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        assert!(Buf32::from_str("abcd").is_err());
        assert!(Buf20::from_str(&"00".repeat(32)).is_err());
        assert!(Buf20::from_str(&"11".repeat(20)).is_ok());
    }

    #[test]
    fn test_serde_as_string() {
        let buf = Buf20::new([7; 20]);
        let json = serde_json::to_string(&buf).unwrap();
        assert_eq!(json, format!("\"{}\"", "07".repeat(20)));
        let back: Buf20 = serde_json::from_str(&json).unwrap();
        assert_eq!(back, buf);
    }

    #[test]
    fn test_zero() {
        assert!(Buf32::zero().is_zero());
        assert!(!Buf32::new([1; 32]).is_zero());
    }
}
