//! Validation of raw RPC arguments.

use std::str::FromStr;

use drivechain_primitives::Buf32;
use drivechain_scdb::{ScdbError, ScdbResult};

/// Sidechain numbers are a single byte on the wire.
pub(crate) fn sidechain_number(n: i64, msg: &str) -> ScdbResult<u8> {
    u8::try_from(n).map_err(|_| ScdbError::invalid_input(msg))
}

/// WT^ hashes must be exactly 64 hex chars and non-zero.
pub(crate) fn wt_prime_hash(s: &str) -> ScdbResult<Buf32> {
    if s.len() != 64 {
        return Err(ScdbError::invalid_input("Invalid WT^ hash length"));
    }
    match s.parse::<Buf32>() {
        Ok(h) if !h.is_zero() => Ok(h),
        _ => Err(ScdbError::invalid_input("Invalid WT^ hash")),
    }
}

/// Parses a 32-byte hash, mapping any failure to `err`.
pub(crate) fn hash_or(s: &str, err: impl FnOnce() -> ScdbError) -> ScdbResult<Buf32> {
    s.parse::<Buf32>().map_err(|_| err())
}

/// Parses a non-zero 32-byte hash, mapping any failure to `err`.
pub(crate) fn nonzero_hash_or(s: &str, err: impl FnOnce() -> ScdbError) -> ScdbResult<Buf32> {
    match s.parse::<Buf32>() {
        Ok(h) if !h.is_zero() => Ok(h),
        _ => Err(err()),
    }
}

/// Hex of exactly `len` chars parsed as `T`. Any failure is reported as `msg`.
pub(crate) fn fixed_hex<T: FromStr>(s: &str, len: usize, msg: &str) -> ScdbResult<T> {
    if s.len() != len {
        return Err(ScdbError::invalid_input(msg));
    }
    s.parse().map_err(|_| ScdbError::invalid_input(msg))
}

/// Optional non-negative count, rejected with `msg` when negative.
pub(crate) fn non_negative(v: Option<i64>, msg: &str) -> ScdbResult<Option<u64>> {
    v.map(|v| u64::try_from(v).map_err(|_| ScdbError::invalid_input(msg)))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sidechain_number_range() {
        assert_eq!(sidechain_number(0, "bad").unwrap(), 0);
        assert_eq!(sidechain_number(255, "bad").unwrap(), 255);
        let err = sidechain_number(256, "Invalid sidechain number!").unwrap_err();
        assert_eq!(err.to_string(), "Invalid sidechain number!");
        assert!(sidechain_number(-1, "bad").is_err());
    }

    #[test]
    fn test_wt_prime_hash_messages() {
        assert_eq!(
            wt_prime_hash("abcd").unwrap_err().to_string(),
            "Invalid WT^ hash length"
        );
        assert_eq!(
            wt_prime_hash(&"zz".repeat(32)).unwrap_err().to_string(),
            "Invalid WT^ hash"
        );
        assert_eq!(
            wt_prime_hash(&"00".repeat(32)).unwrap_err().to_string(),
            "Invalid WT^ hash"
        );
        let h = wt_prime_hash(&format!("{}01", "00".repeat(31))).unwrap();
        assert_eq!(h.as_bytes()[0], 1);
    }

    #[test]
    fn test_non_negative() {
        assert_eq!(non_negative(None, "x").unwrap(), None);
        assert_eq!(non_negative(Some(3), "x").unwrap(), Some(3));
        assert_eq!(
            non_negative(Some(-1), "Invalid number of blocks!")
                .unwrap_err()
                .to_string(),
            "Invalid number of blocks!"
        );
    }

    #[test]
    fn test_fixed_hex() {
        use drivechain_primitives::Buf20;

        let id: Buf20 = fixed_hex(&"ab".repeat(20), 40, "HashID2 size invalid!").unwrap();
        assert_eq!(id, Buf20::new([0xab; 20]));
        let err = fixed_hex::<Buf32>(&"ab".repeat(20), 64, "HashID1 size invalid!").unwrap_err();
        assert_eq!(err.to_string(), "HashID1 size invalid!");
        assert!(fixed_hex::<Buf32>(&"xy".repeat(32), 64, "bad").is_err());
    }

    #[test]
    fn test_hash_or() {
        let err = hash_or("nope", || ScdbError::not_found("Block not found")).unwrap_err();
        assert_eq!(err.code(), -5);
        assert!(nonzero_hash_or(&"00".repeat(32), || ScdbError::invalid_input("x")).is_err());
        assert!(nonzero_hash_or(&"11".repeat(32), || ScdbError::invalid_input("x")).is_ok());
    }
}
