//! Recovery Phrases and Seeds
//!
//! Two seed constructions are supported:
//! - TON native: `PBKDF2-HMAC-SHA512(HMAC-SHA512(phrase, ""), "TON default seed", 100000)`
//! - BIP-39: standard seed with an empty passphrase
//!
//! SECURITY: the phrase and every derived seed are zeroized on drop.

use std::fmt;

use bip39::{Language, Mnemonic};
use hmac::{Hmac, Mac};
use sha2::Sha512;
use zeroize::Zeroizing;

use crate::error::{CosignError, CosignResult};

type HmacSha512 = Hmac<Sha512>;

const TON_SEED_SALT: &[u8] = b"TON default seed";
const TON_SEED_ROUNDS: u32 = 100_000;

/// Normalized recovery phrase
pub struct RecoveryPhrase {
    phrase: Zeroizing<String>,
}

impl RecoveryPhrase {
    /// Normalize (trim, lower-case, single spaces) and check every word
    /// against the English wordlist shared by TON and BIP-39 phrases.
    pub fn new(raw: &str) -> CosignResult<Self> {
        let phrase = Zeroizing::new(
            raw.split_whitespace()
                .map(|w| w.to_lowercase())
                .collect::<Vec<_>>()
                .join(" "),
        );

        if phrase.is_empty() {
            return Err(CosignError::invalid_mnemonic("Recovery phrase is empty"));
        }

        if let Some(position) = phrase
            .split(' ')
            .position(|w| Language::English.find_word(w).is_none())
        {
            return Err(CosignError::invalid_mnemonic(format!(
                "Word {} is not in the wordlist",
                position + 1
            )));
        }

        Ok(Self { phrase })
    }

    pub fn word_count(&self) -> usize {
        self.phrase.split(' ').count()
    }

    /// 64-byte TON native seed; the first 32 bytes are the Ed25519 secret
    pub fn ton_seed(&self) -> CosignResult<Zeroizing<[u8; 64]>> {
        let mut mac = HmacSha512::new_from_slice(self.phrase.as_bytes())
            .map_err(|e| CosignError::crypto_error(format!("HMAC init failed: {}", e)))?;
        let mut entropy = Zeroizing::new([0u8; 64]);
        entropy.copy_from_slice(&mac.finalize().into_bytes());

        let mut seed = Zeroizing::new([0u8; 64]);
        pbkdf2::pbkdf2_hmac::<Sha512>(&entropy[..], TON_SEED_SALT, TON_SEED_ROUNDS, &mut seed[..]);
        Ok(seed)
    }

    /// BIP-39 seed with an empty passphrase; requires a valid BIP-39 checksum
    pub fn bip39_seed(&self) -> CosignResult<Zeroizing<[u8; 64]>> {
        let mnemonic = Mnemonic::parse_in_normalized(Language::English, &self.phrase)
            .map_err(|e| CosignError::invalid_mnemonic(format!("Invalid BIP-39 mnemonic: {}", e)))?;
        Ok(Zeroizing::new(mnemonic.to_seed_normalized("")))
    }
}

impl fmt::Debug for RecoveryPhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecoveryPhrase([REDACTED:{} words])", self.word_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    const ABANDON: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_normalization() {
        let phrase = RecoveryPhrase::new("  Abandon abandon\tabandon abandon abandon abandon abandon abandon abandon abandon abandon ABOUT \n").unwrap();
        assert_eq!(phrase.word_count(), 12);
        assert_eq!(phrase.phrase.as_str(), ABANDON);
    }

    #[test]
    fn test_ton_seed_vector() {
        let seed = RecoveryPhrase::new(ABANDON).unwrap().ton_seed().unwrap();
        assert_eq!(
            hex::encode(&seed[..32]),
            "3cb63a1ff550e41a88d9c48a77b757f7a4238d13c2e720127523569f55b1d6db"
        );
    }

    #[test]
    fn test_bip39_seed_vector() {
        let seed = RecoveryPhrase::new(ABANDON).unwrap().bip39_seed().unwrap();
        assert_eq!(
            hex::encode(&seed[..]),
            "5eb00bbddcf069084889a8ab9155568165f5c453ccb85e70811aaed6f6da5fc19a5ac40b389cd370d086206dec8aa6c43daea6690f20ad3d8d48b2d2ce9e38e4"
        );
    }

    #[test]
    fn test_bip39_checksum_enforced() {
        let phrase = RecoveryPhrase::new(&"abandon ".repeat(12)).unwrap();
        let err = phrase.bip39_seed().unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidMnemonic);
        // TON native seeds have no checksum requirement
        assert!(phrase.ton_seed().is_ok());
    }

    #[test]
    fn test_rejects_unknown_words() {
        assert!(RecoveryPhrase::new("").is_err());
        let err = RecoveryPhrase::new("abandon notaword about").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidMnemonic);
        assert!(err.message.contains("Word 2"));
    }

    #[test]
    fn test_debug_is_redacted() {
        let phrase = RecoveryPhrase::new(ABANDON).unwrap();
        let rendered = format!("{:?}", phrase);
        assert!(!rendered.contains("abandon"));
    }
}
