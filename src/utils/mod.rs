//! Utilities Module
//!
//! Byte-string decoding shared by the session loader and the CLI, plus
//! redacting structured logging.

pub mod logging;

use base64::{
    engine::general_purpose::{STANDARD, URL_SAFE},
    Engine,
};

use crate::error::{CosignError, CosignResult};

/// Decode a hex (optionally `0x`-prefixed) or base64 string
///
/// Input made only of hex digits with an even length is read as hex.
/// Everything else is tried as standard base64, then URL-safe base64.
pub fn decode_bytes(input: &str) -> CosignResult<Vec<u8>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CosignError::invalid_input("Empty byte string"));
    }

    let hex_part = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if hex_part.len() % 2 == 0 && hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Ok(hex::decode(hex_part)?);
    }

    STANDARD
        .decode(trimmed)
        .or_else(|_| URL_SAFE.decode(trimmed))
        .map_err(|e| CosignError::invalid_input(format!("Not hex or base64: {}", e)))
}

/// Decode exactly `N` bytes from hex or base64
pub fn decode_array<const N: usize>(input: &str) -> CosignResult<[u8; N]> {
    let bytes = decode_bytes(input)?;
    let len = bytes.len();
    bytes.try_into().map_err(|_| {
        CosignError::invalid_input(format!("Expected {} bytes, got {}", N, len))
    })
}
