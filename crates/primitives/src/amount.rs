use std::fmt;

use arbitrary::Arbitrary;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

/// A wrapper for bitcoin amount in sats similar to the implementation in [`bitcoin::Amount`].
///
/// NOTE: This wrapper has been created so that we can implement `Borsh*` traits on it.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Arbitrary,
    BorshDeserialize,
    BorshSerialize,
    Deserialize,
    Serialize,
)]
pub struct BitcoinAmount(u64);

impl fmt::Display for BitcoinAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<bitcoin::Amount> for BitcoinAmount {
    fn from(value: bitcoin::Amount) -> Self {
        Self::from_sat(value.to_sat())
    }
}

impl From<BitcoinAmount> for bitcoin::Amount {
    fn from(value: BitcoinAmount) -> Self {
        Self::from_sat(value.to_sat())
    }
}

impl BitcoinAmount {
    /// The zero amount.
    pub const ZERO: BitcoinAmount = Self(0);

    /// The number of sats in 1 bitcoin.
    pub const SATS_FACTOR: u64 = 100_000_000;

    /// Get the number of sats in this [`BitcoinAmount`].
    pub const fn to_sat(&self) -> u64 {
        self.0
    }

    /// Create a [`BitcoinAmount`] with sats precision and the given number of sats.
    pub const fn from_sat(value: u64) -> Self {
        Self(value)
    }

    pub const fn from_int_btc(btc: u64) -> Self {
        Self(btc * Self::SATS_FACTOR)
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    /// Value in whole coins, as used in JSON amount fields.
    pub fn to_btc(&self) -> f64 {
        self.0 as f64 / Self::SATS_FACTOR as f64
    }

    /// Renders the amount with eight decimals, trimming up to six trailing zeros so at
    /// least two decimals remain (`10.00`, `0.1234`).
    pub fn to_formatted_string(&self) -> String {
        let mut s = format!(
            "{}.{:08}",
            self.0 / Self::SATS_FACTOR,
            self.0 % Self::SATS_FACTOR
        );
        let mut trim = 0;
        while trim < 6 && s.ends_with('0') {
            s.pop();
            trim += 1;
        }
        s
    }
}
