//! Curve Cryptography
//!
//! TON wallets sign with Ed25519. The curve sits behind the same traits the
//! rest of the crate would use for any other curve:
//!
//! - `EllipticCurve`: key generation, signing, verification
//! - `KeyDerivation`: SLIP-0010 hardened path derivation

pub mod ed25519;
pub mod traits;

pub use ed25519::Ed25519Curve;
pub use traits::*;

/// Curve operation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CurveError {
    InvalidPrivateKey(String),
    InvalidPublicKey(String),
    InvalidSignature(String),
    InvalidSeed(String),
    DerivationFailed(String),
}

impl std::fmt::Display for CurveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPrivateKey(s) => write!(f, "Invalid private key: {}", s),
            Self::InvalidPublicKey(s) => write!(f, "Invalid public key: {}", s),
            Self::InvalidSignature(s) => write!(f, "Invalid signature: {}", s),
            Self::InvalidSeed(s) => write!(f, "Invalid seed: {}", s),
            Self::DerivationFailed(s) => write!(f, "Key derivation failed: {}", s),
        }
    }
}

impl std::error::Error for CurveError {}
