//! Decimal-string encoding for `u128` amounts.
//!
//! Reserve, share and transfer quantities are `u128` base units. JSON
//! numbers (and JSONB read back through `serde_json::Value`) lose
//! precision above 2^53, so every amount crosses a serialization
//! boundary as a decimal string.

use serde::{Deserialize, Deserializer, Serializer};

use crate::error::DexError;

/// Serde adapter: `#[serde(with = "crate::domain::amount::as_string")]`.
pub mod as_string {
    use super::{Deserialize, Deserializer, Serializer};

    /// Serializes a `u128` as a decimal string.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    /// Deserializes a `u128` from a decimal string.
    ///
    /// # Errors
    ///
    /// Fails when the string is not a valid unsigned decimal integer.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Parses a request field holding a string-encoded `u128`.
///
/// # Errors
///
/// Returns [`DexError::InvalidRequest`] naming `field` when the value is
/// not an unsigned decimal integer.
pub fn parse_amount(value: &str, field: &str) -> Result<u128, DexError> {
    value
        .trim()
        .parse::<u128>()
        .map_err(|_| DexError::InvalidRequest(format!("invalid {field}: {value}")))
}
