//! Sidechain deposit addresses: `s{nsidechain}_{address}_{checksum}`.
//!
//! The checksum is the first six hex chars of the SHA-256 of everything before it,
//! trailing underscore included.

use sha2::{Digest, Sha256};

use crate::errors::CodecError;

const CHECKSUM_LEN: usize = 6;

fn checksum(prefix: &str) -> String {
    let digest = Sha256::digest(prefix.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(CHECKSUM_LEN);
    hex
}

/// Formats a deposit address for `address` on sidechain `n_sidechain`.
pub fn format_deposit_address(n_sidechain: u8, address: &str) -> String {
    let prefix = format!("s{n_sidechain}_{address}_");
    let sum = checksum(&prefix);
    format!("{prefix}{sum}")
}

/// Splits a deposit address into the sidechain address and the sidechain number.
pub fn parse_deposit_address(s: &str) -> Result<(String, u8), CodecError> {
    let rest = s
        .strip_prefix('s')
        .ok_or(CodecError::InvalidDepositAddress("missing 's' prefix"))?;

    let mut parts = rest.split('_');
    let (Some(num), Some(address), Some(sum), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(CodecError::InvalidDepositAddress(
            "expected three '_' separated fields",
        ));
    };

    if num.is_empty() || !num.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CodecError::InvalidDepositAddress("bad sidechain number"));
    }
    let n_sidechain: u8 = num
        .parse()
        .map_err(|_| CodecError::InvalidDepositAddress("sidechain number out of range"))?;

    if address.is_empty() {
        return Err(CodecError::InvalidDepositAddress("empty address"));
    }

    let prefix_len = s.len() - sum.len();
    if checksum(&s[..prefix_len]) != sum {
        return Err(CodecError::InvalidDepositAddress("checksum mismatch"));
    }

    Ok((address.to_owned(), n_sidechain))
}
