//! Unified error types for the co-signing core
//!
//! Every failure in key resolution, encoding and orchestration surfaces
//! through `CosignError`, tagged with an `ErrorCode` so callers can branch
//! on the category without parsing messages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Main error type for all co-signing operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CosignError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl CosignError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors
    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidAddressFormat, msg)
    }

    pub fn invalid_threshold(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidThreshold, msg)
    }

    /// The bounded index search ran out without matching `target`
    pub fn key_not_found(target: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::KeyNotFound,
            format!("No derivation index produced address {}", target),
        )
    }

    pub fn invalid_digest_length(expected: usize, actual: usize) -> Self {
        Self::new(
            ErrorCode::InvalidDigestLength,
            format!("Digest must be {} bytes, got {}", expected, actual),
        )
    }

    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::EncodingFailure, msg)
    }

    pub fn duplicate_participant(index: u8) -> Self {
        Self::new(
            ErrorCode::DuplicateParticipantIndex,
            format!("Participant index {} appears more than once", index),
        )
    }

    pub fn insufficient_signatures(collected: usize, threshold: usize) -> Self {
        Self::new(
            ErrorCode::InsufficientSignatures,
            format!("Collected {} of {} required signatures", collected, threshold),
        )
    }

    pub fn invalid_mnemonic(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidMnemonic, msg)
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, msg)
    }

    pub fn crypto_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::CryptoError, msg)
    }

    pub fn session_closed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::SessionClosed, msg)
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, msg)
    }
}

impl fmt::Display for CosignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for CosignError {}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Input errors
    InvalidAddressFormat,
    InvalidThreshold,
    InvalidMnemonic,
    InvalidInput,

    // Key resolution
    KeyNotFound,

    // Signing and encoding
    InvalidDigestLength,
    EncodingFailure,
    CryptoError,

    // Round bookkeeping
    DuplicateParticipantIndex,
    InsufficientSignatures,
    SessionClosed,

    // Internal
    ConfigError,
    Internal,
}

/// Result type alias for co-signing operations
pub type CosignResult<T> = Result<T, CosignError>;

// Conversions from common error types

impl From<serde_json::Error> for CosignError {
    fn from(e: serde_json::Error) -> Self {
        CosignError::new(ErrorCode::InvalidInput, format!("JSON error: {}", e))
    }
}

impl From<hex::FromHexError> for CosignError {
    fn from(e: hex::FromHexError) -> Self {
        CosignError::new(ErrorCode::InvalidInput, format!("Hex error: {}", e))
    }
}

impl From<base64::DecodeError> for CosignError {
    fn from(e: base64::DecodeError) -> Self {
        CosignError::new(ErrorCode::InvalidInput, format!("Base64 error: {}", e))
    }
}

impl From<std::io::Error> for CosignError {
    fn from(e: std::io::Error) -> Self {
        CosignError::new(ErrorCode::Internal, e.to_string())
    }
}

impl From<bip39::Error> for CosignError {
    fn from(e: bip39::Error) -> Self {
        CosignError::new(ErrorCode::InvalidMnemonic, format!("BIP39 error: {}", e))
    }
}

impl From<crate::cell::CellError> for CosignError {
    fn from(e: crate::cell::CellError) -> Self {
        CosignError::new(ErrorCode::EncodingFailure, e.to_string())
    }
}

impl From<crate::crypto::CurveError> for CosignError {
    fn from(e: crate::crypto::CurveError) -> Self {
        CosignError::new(ErrorCode::CryptoError, e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_code_and_details() {
        let err = CosignError::key_not_found("UQabc").with_details("scanned 1000 indices");
        let rendered = err.to_string();
        assert!(rendered.starts_with("[KeyNotFound]"));
        assert!(rendered.contains("UQabc"));
        assert!(rendered.ends_with("(scanned 1000 indices)"));
    }

    #[test]
    fn test_code_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorCode::DuplicateParticipantIndex).unwrap();
        assert_eq!(json, "\"duplicate_participant_index\"");
    }

    #[test]
    fn test_cell_error_maps_to_encoding_failure() {
        let err: CosignError = crate::cell::CellError::BitOverflow { requested: 2000 }.into();
        assert_eq!(err.code, ErrorCode::EncodingFailure);
    }
}
