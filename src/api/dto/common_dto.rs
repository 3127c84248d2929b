//! Shared DTO helpers used across multiple endpoints.

use crate::domain::Address;
use crate::error::DexError;

/// Parses a request field holding a `0x`-prefixed 20-byte hex address.
///
/// # Errors
///
/// Returns [`DexError::InvalidRequest`] naming `field` on malformed input.
pub fn parse_address(value: &str, field: &str) -> Result<Address, DexError> {
    value
        .trim()
        .parse()
        .map_err(|e| DexError::InvalidRequest(format!("invalid {field} {value:?}: {e}")))
}
