//! tonkey-cosign Core Library
//!
//! Co-signing for M-of-N multisig wallets on TON.
//!
//! # Architecture
//!
//! This crate provides:
//! - **cell**: cells, bit builder/reader, representation hashes and bag-of-cells
//! - **crypto**: Ed25519 signing and SLIP-0010 derivation
//! - **ton**: addresses, wallet contract addresses, external messages
//! - **wallet**: recovery phrases, derivation schemes, key resolution
//! - **multisig**: signer, canonical authorization encoder, co-signing rounds
//! - **config**: settings file and validation
//!
//! # Security
//!
//! Recovery phrases, seeds and signing keys are zeroized on drop and are
//! redacted from every log line.
//!
//! # Example
//!
//! ```rust,ignore
//! use tonkey_cosign::{CosignSession, CosignSettings, SessionRequest};
//!
//! let request: SessionRequest = serde_json::from_str(&session_json)?;
//! let mut session = CosignSession::from_request(&request, CosignSettings::default())?;
//! let message = session.run(&request.participants)?;
//! println!("{}", session.output(&message)?.authorization_boc);
//! ```

pub mod cell;
pub mod config;
pub mod crypto;
pub mod error;
pub mod multisig;
pub mod serde_bytes;
pub mod ton;
pub mod types;
pub mod utils;
pub mod wallet;

// Re-export key types for convenience
pub use config::{CosignSettings, SearchSettings};
pub use error::{CosignError, CosignResult, ErrorCode};
pub use multisig::{
    build_authorization, build_chain, parse_authorization, CosignSession, DuplicatePolicy,
    FinalMessage, KeyPair, SessionState, Signer,
};
pub use ton::TonAddress;
pub use types::*;
pub use wallet::{resolve_key, DerivationScheme, KeyResolver, RecoveryPhrase};
