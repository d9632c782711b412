//! Shared types for the co-signing core
//!
//! Data structures that cross module boundaries or appear in session and
//! output files are defined here.

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::wallet::DerivationScheme;

// =============================================================================
// Participants
// =============================================================================

/// Per-wallet co-signer identifier, encoded as `uint8` on the wire
pub type ParticipantIndex = u8;

/// A participant signature produced over the shared digest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectedSignature {
    #[serde(with = "crate::serde_bytes::hex64")]
    pub signature: [u8; 64],
    pub participant_index: ParticipantIndex,
}

impl CollectedSignature {
    pub fn new(signature: [u8; 64], participant_index: ParticipantIndex) -> Self {
        Self {
            signature,
            participant_index,
        }
    }
}

/// One co-signer as supplied by the operator
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct ParticipantInput {
    #[zeroize(skip)]
    pub scheme: DerivationScheme,
    /// Recovery phrase; zeroized on drop and never logged
    pub mnemonic: String,
    /// Address the participant declares for its own wallet
    #[serde(default)]
    pub address: Option<String>,
    /// Participant index inside the multisig wallet
    pub index: ParticipantIndex,
    /// Derive only this account index instead of searching
    #[serde(default)]
    pub account_index: Option<u32>,
}

impl fmt::Debug for ParticipantInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParticipantInput")
            .field("scheme", &self.scheme)
            .field("mnemonic", &"[REDACTED]")
            .field("address", &self.address)
            .field("index", &self.index)
            .field("account_index", &self.account_index)
            .finish()
    }
}

// =============================================================================
// Session files
// =============================================================================

/// Everything needed for one authorization round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRequest {
    /// Multisig wallet the final message is addressed to
    pub wallet_address: String,
    /// Number of signatures required
    pub threshold: u32,
    /// Shared digest every participant signs (hex)
    pub tx_hash: String,
    /// Pending order cell as a BOC (hex or base64)
    pub order_boc: String,
    /// Participants in processing order
    pub participants: Vec<ParticipantInput>,
}

/// Result of a completed round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CosignOutput {
    pub wallet_address: String,
    pub final_signer_index: ParticipantIndex,
    pub chain_length: usize,
    #[serde(with = "crate::serde_bytes::hex32")]
    pub body_hash: [u8; 32],
    pub authorization_boc: String,
    pub authorization_boc_hex: String,
    pub external_message_boc: String,
    /// Signatures over the shared digest, in processing order
    pub signatures: Vec<CollectedSignature>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participant_from_json() {
        let json = r#"{
            "scheme": "ledger",
            "mnemonic": "abandon abandon about",
            "address": "UQBUQSw-F6EMKVpun_Uj_raPCczMyU0mw01W2ZRPrpJiBo-J",
            "index": 1
        }"#;
        let p: ParticipantInput = serde_json::from_str(json).unwrap();
        assert_eq!(p.scheme, DerivationScheme::Ledger);
        assert_eq!(p.index, 1);
        assert!(p.account_index.is_none());
        assert!(!format!("{:?}", p).contains("abandon"));
    }

    #[test]
    fn test_zeroize_clears_mnemonic() {
        let mut p = ParticipantInput {
            scheme: DerivationScheme::Standard,
            mnemonic: "abandon about".into(),
            address: None,
            index: 0,
            account_index: Some(3),
        };
        p.zeroize();
        assert!(p.mnemonic.is_empty());
        assert!(p.account_index.is_none());
    }

    #[test]
    fn test_collected_signature_json() {
        let sig = CollectedSignature::new([0x5a; 64], 2);
        let json = serde_json::to_value(sig).unwrap();
        assert_eq!(json["participant_index"], 2);
        assert_eq!(json["signature"].as_str().unwrap().len(), 128);
    }
}
