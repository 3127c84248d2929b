//! Account address type.
//!
//! [`Address`] is a 20-byte account identifier written as `0x`-prefixed
//! hex, the same shape the pool's callers use on chain. It identifies
//! traders, liquidity providers, the pool custody account and the token.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Number of bytes in an [`Address`].
pub const ADDRESS_LEN: usize = 20;

/// Error returned when a string is not a valid `0x`-prefixed address.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressParseError {
    /// The string does not start with `0x`.
    #[error("address must start with 0x")]
    MissingPrefix,
    /// The hex body is not exactly 40 characters long.
    #[error("address must have 40 hex digits, got {0}")]
    InvalidLength(usize),
    /// The hex body contains a non-hex character.
    #[error("invalid hex digit {0:?} in address")]
    InvalidDigit(char),
}

/// A 20-byte account address.
///
/// Ordered and hashable so it can key the share ledger and token balances.
/// Serializes as a lowercase `0x` hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// The all-zero address.
    pub const ZERO: Self = Self([0u8; ADDRESS_LEN]);

    /// Creates an address from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Returns `true` for the all-zero address.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LEN]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("0x")?;
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or(AddressParseError::MissingPrefix)?;
        if body.len() != ADDRESS_LEN * 2 {
            return Err(AddressParseError::InvalidLength(body.len()));
        }

        let mut bytes = [0u8; ADDRESS_LEN];
        let mut digits = body.chars();
        for byte in &mut bytes {
            let hi = next_nibble(&mut digits)?;
            let lo = next_nibble(&mut digits)?;
            *byte = (hi << 4) | lo;
        }
        Ok(Self(bytes))
    }
}

fn next_nibble(digits: &mut std::str::Chars<'_>) -> Result<u8, AddressParseError> {
    let c = digits.next().ok_or(AddressParseError::InvalidLength(0))?;
    c.to_digit(16)
        .and_then(|d| u8::try_from(d).ok())
        .ok_or(AddressParseError::InvalidDigit(c))
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl From<[u8; ADDRESS_LEN]> for Address {
    fn from(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }
}
