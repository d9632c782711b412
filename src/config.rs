//! Co-signing Settings
//!
//! Settings are read from an optional JSON file; every field has a default,
//! so an empty object is a valid configuration.
//!
//! ```json
//! {
//!   "search": { "max_index": 1000, "start_index": 0, "parallel": false, "threads": 0 },
//!   "workchain": 0,
//!   "testnet": false,
//!   "duplicate_policy": "pass_through",
//!   "contracts": { "v4r2_code_boc": null, "v5r1_code_boc": null }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CosignError, CosignResult};
use crate::multisig::DuplicatePolicy;
use crate::ton::{WalletCode, WalletDeriver, WalletVersion};
use crate::wallet::HARDENED;

/// Default number of account indices scanned per participant
pub const DEFAULT_MAX_INDEX: u32 = 1000;

/// Settings for one co-signing run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CosignSettings {
    pub search: SearchSettings,
    /// Workchain of participant wallets
    pub workchain: i32,
    /// Derive testnet addresses
    pub testnet: bool,
    /// Handling of repeated non-final indices in the chain
    pub duplicate_policy: DuplicatePolicy,
    pub contracts: ContractOverrides,
}

/// Bounded account index search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchSettings {
    /// Number of indices scanned, starting at `start_index`
    pub max_index: u32,
    pub start_index: u32,
    /// Scan on a rayon pool; the lowest matching index still wins
    pub parallel: bool,
    /// Worker threads for the parallel scan (0 = one per core)
    pub threads: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            max_index: DEFAULT_MAX_INDEX,
            start_index: 0,
            parallel: false,
            threads: 0,
        }
    }
}

impl SearchSettings {
    /// Indices covered by the search
    pub fn range(&self) -> std::ops::Range<u32> {
        let end = self.start_index.saturating_add(self.max_index).min(HARDENED);
        self.start_index..end
    }
}

/// Wallet code cells replacing the built-in code identities
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContractOverrides {
    /// Wallet v4r2 code BOC (hex or base64)
    pub v4r2_code_boc: Option<String>,
    /// Wallet v5r1 code BOC (hex or base64)
    pub v5r1_code_boc: Option<String>,
}

impl CosignSettings {
    pub fn from_json(json: &str) -> CosignResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| CosignError::config(format!("Invalid settings: {}", e)))
    }

    pub fn from_file(path: impl AsRef<Path>) -> CosignResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            CosignError::config(format!("Cannot read settings file {}: {}", path.display(), e))
        })?;
        Self::from_json(&contents)
    }

    /// Check the settings; hard problems are errors, risky values are
    /// returned as warnings.
    pub fn validate(&self) -> CosignResult<Vec<String>> {
        let mut warnings = Vec::new();

        if self.search.max_index == 0 {
            return Err(CosignError::config("search.max_index must be at least 1"));
        }

        if self.search.start_index >= HARDENED
            || self.search.start_index as u64 + self.search.max_index as u64 > HARDENED as u64
        {
            return Err(CosignError::config(
                "search range exceeds the hardened index space",
            ));
        }

        if i8::try_from(self.workchain).is_err() {
            return Err(CosignError::config(format!(
                "workchain {} is out of range",
                self.workchain
            )));
        }

        // Fails on malformed code BOCs
        self.wallet_deriver()?;

        if self.workchain != 0 && self.workchain != -1 {
            warnings.push(format!(
                "Warning: workchain {} is neither basechain nor masterchain",
                self.workchain
            ));
        }

        if self.search.max_index > 100_000 {
            warnings.push(format!(
                "Warning: scanning {} indices per participant may take a long time",
                self.search.max_index
            ));
        }

        if self.search.threads > 0 && !self.search.parallel {
            warnings.push("Warning: search.threads is ignored unless search.parallel is set".to_string());
        }

        if self.duplicate_policy == DuplicatePolicy::Reject {
            warnings.push(
                "Warning: duplicate_policy=reject deviates from the on-chain protocol behavior"
                    .to_string(),
            );
        }

        Ok(warnings)
    }

    /// Address deriver honoring the network and code overrides
    pub fn wallet_deriver(&self) -> CosignResult<WalletDeriver> {
        let mut deriver = WalletDeriver::new(self.testnet);
        let overrides = [
            (WalletVersion::V4R2, &self.contracts.v4r2_code_boc),
            (WalletVersion::V5R1, &self.contracts.v5r1_code_boc),
        ];
        for (version, boc) in overrides {
            if let Some(boc) = boc {
                let code = WalletCode::from_boc_str(boc).map_err(|e| {
                    CosignError::config(format!("Invalid {} code BOC", version.name()))
                        .with_details(e.to_string())
                })?;
                deriver = deriver.with_code(version, code);
            }
        }
        Ok(deriver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_defaults() {
        let settings = CosignSettings::from_json("{}").unwrap();
        assert_eq!(settings, CosignSettings::default());
        assert_eq!(settings.search.max_index, 1000);
        assert_eq!(settings.search.range(), 0..1000);
        assert_eq!(settings.duplicate_policy, DuplicatePolicy::PassThrough);
        assert!(settings.validate().unwrap().is_empty());
    }

    #[test]
    fn test_partial_file() {
        let settings = CosignSettings::from_json(
            r#"{"search": {"max_index": 20, "parallel": true}, "testnet": true}"#,
        )
        .unwrap();
        assert_eq!(settings.search.max_index, 20);
        assert!(settings.search.parallel);
        assert_eq!(settings.search.start_index, 0);
        assert!(settings.testnet);
    }

    #[test]
    fn test_rejects_unknown_fields() {
        let err = CosignSettings::from_json(r#"{"max_index": 5}"#).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigError);
    }

    #[test]
    fn test_validation_errors() {
        let mut settings = CosignSettings::default();
        settings.search.max_index = 0;
        assert!(settings.validate().is_err());

        let mut settings = CosignSettings::default();
        settings.search.start_index = HARDENED - 10;
        assert!(settings.validate().is_err());

        let mut settings = CosignSettings::default();
        settings.workchain = 300;
        assert!(settings.validate().is_err());

        let mut settings = CosignSettings::default();
        settings.contracts.v4r2_code_boc = Some("zz".into());
        assert_eq!(settings.validate().unwrap_err().code, ErrorCode::ConfigError);
    }

    #[test]
    fn test_validation_warnings() {
        let mut settings = CosignSettings::default();
        settings.search.threads = 4;
        settings.duplicate_policy = DuplicatePolicy::Reject;
        let warnings = settings.validate().unwrap();
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn test_code_override_is_applied() {
        let mut settings = CosignSettings::default();
        settings.contracts.v4r2_code_boc = Some("te6cckEBAQEAAgAAAEysuc0=".into());
        let deriver = settings.wallet_deriver().unwrap();
        assert_eq!(deriver.code(WalletVersion::V4R2).unwrap().depth, 0);
        assert_eq!(
            deriver.code(WalletVersion::V5R1).unwrap(),
            WalletVersion::V5R1.default_code().unwrap()
        );
    }
}
