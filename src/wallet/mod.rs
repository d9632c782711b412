//! Wallet Module
//!
//! Handles recovery phrases, derivation schemes and paths, and the key
//! resolution that maps a phrase to the key controlling a declared address.

mod derivation_path;
mod mnemonic;
mod resolver;
mod scheme;

pub use derivation_path::*;
pub use mnemonic::*;
pub use resolver::*;
pub use scheme::*;

use crate::error::CosignResult;
use crate::ton::TonAddress;

/// Resolve a participant key with default settings
pub fn resolve_key(
    phrase: &str,
    scheme: DerivationScheme,
    account_index: Option<u32>,
    target: Option<&TonAddress>,
) -> CosignResult<ResolvedKey> {
    let phrase = RecoveryPhrase::new(phrase)?;
    KeyResolver::default().resolve(&phrase, scheme, account_index, target)
}
