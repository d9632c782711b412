//! Derivation Schemes
//!
//! Each scheme maps to a fixed seed construction, an optional path template
//! and the wallet contract version its addresses are derived for.
//!
//! | Scheme       | Seed      | Path                          | Contract |
//! |--------------|-----------|-------------------------------|----------|
//! | `Standard`   | TON native| none                          | v4r2     |
//! | `Ledger`     | BIP-39    | `m/44'/607'/0'/0'/{i}'/0'`    | v4r2     |
//! | `MultiChain` | BIP-39    | `m/44'/607'/{i}'`             | v5r1     |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::derivation_path::DerivationPath;
use crate::error::CosignError;
use crate::ton::WalletVersion;

/// How a participant's recovery phrase turns into a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivationScheme {
    /// TON wallet apps (24-word TON mnemonic)
    #[serde(alias = "standard_wallet")]
    Standard,
    /// Ledger hardware wallets
    #[serde(alias = "hardware_ledger")]
    Ledger,
    /// Multi-chain software wallets
    #[serde(alias = "multichain")]
    MultiChain,
}

/// Seed construction used by a scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedKind {
    TonNative,
    Bip39,
}

/// Static dispatch entry for a scheme
#[derive(Debug, Clone, Copy)]
pub struct SchemeProfile {
    pub seed: SeedKind,
    pub path: Option<fn(u32) -> DerivationPath>,
    pub version: WalletVersion,
}

impl DerivationScheme {
    pub const ALL: [DerivationScheme; 3] = [Self::Standard, Self::Ledger, Self::MultiChain];

    pub fn profile(self) -> SchemeProfile {
        match self {
            Self::Standard => SchemeProfile {
                seed: SeedKind::TonNative,
                path: None,
                version: WalletVersion::V4R2,
            },
            Self::Ledger => SchemeProfile {
                seed: SeedKind::Bip39,
                path: Some(DerivationPath::ton_ledger),
                version: WalletVersion::V4R2,
            },
            Self::MultiChain => SchemeProfile {
                seed: SeedKind::Bip39,
                path: Some(DerivationPath::ton_multichain),
                version: WalletVersion::V5R1,
            },
        }
    }

    /// Whether keys are found by scanning path indices
    pub fn is_indexed(self) -> bool {
        self.profile().path.is_some()
    }

    /// Path for `index`, or `None` when the scheme has no path
    pub fn path(self, index: u32) -> Option<DerivationPath> {
        self.profile().path.map(|template| template(index))
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Ledger => "ledger",
            Self::MultiChain => "multi_chain",
        }
    }
}

impl fmt::Display for DerivationScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DerivationScheme {
    type Err = CosignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "standard" | "standard_wallet" => Ok(Self::Standard),
            "ledger" | "hardware_ledger" => Ok(Self::Ledger),
            "multi_chain" | "multichain" => Ok(Self::MultiChain),
            other => Err(CosignError::invalid_input(format!(
                "Unknown derivation scheme: {}",
                other
            ))),
        }
    }
}
