//! Key Derivation Paths
//!
//! Parses and formats SLIP-0010 paths and provides the two TON path
//! templates used by hardware and multi-chain wallets:
//! - Ledger style: `m/44'/607'/0'/0'/{index}'/0'`
//! - Multi-chain style: `m/44'/607'/{index}'`

use std::fmt;
use std::str::FromStr;

use crate::error::{CosignError, CosignResult};

/// Standard BIP purposes
pub mod bip_purposes {
    pub const BIP44: u32 = 44;
}

/// Coin types from SLIP-0044
pub mod coin_types {
    pub const TON: u32 = 607;
}

/// Hardened offset for BIP-32 derivation
pub const HARDENED: u32 = 0x80000000;

/// Parsed derivation path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivationPath {
    pub components: Vec<DerivationComponent>,
}

/// Single component of a derivation path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivationComponent {
    pub index: u32,
    pub hardened: bool,
}

impl DerivationComponent {
    pub fn new(index: u32, hardened: bool) -> Self {
        Self { index, hardened }
    }

    pub fn hardened(index: u32) -> Self {
        Self::new(index, true)
    }

    /// Get the full index including hardened bit
    pub fn full_index(&self) -> u32 {
        if self.hardened {
            self.index | HARDENED
        } else {
            self.index
        }
    }
}

impl DerivationPath {
    /// TON path used by Ledger devices: `m/44'/607'/0'/0'/{index}'/0'`
    pub fn ton_ledger(index: u32) -> Self {
        Self::from_hardened(&[
            bip_purposes::BIP44,
            coin_types::TON,
            0,
            0,
            index,
            0,
        ])
    }

    /// TON path used by multi-chain wallets: `m/44'/607'/{index}'`
    pub fn ton_multichain(index: u32) -> Self {
        Self::from_hardened(&[bip_purposes::BIP44, coin_types::TON, index])
    }

    fn from_hardened(indices: &[u32]) -> Self {
        Self {
            components: indices
                .iter()
                .map(|&i| DerivationComponent::hardened(i))
                .collect(),
        }
    }

    pub fn is_fully_hardened(&self) -> bool {
        self.components.iter().all(|c| c.hardened)
    }

    /// Coin type component, if the path is long enough to carry one
    pub fn coin_type(&self) -> Option<u32> {
        self.components.get(1).map(|c| c.index)
    }
}

impl fmt::Display for DerivationComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hardened {
            write!(f, "{}'", self.index)
        } else {
            write!(f, "{}", self.index)
        }
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m")?;
        for component in &self.components {
            write!(f, "/{}", component)?;
        }
        Ok(())
    }
}

impl FromStr for DerivationPath {
    type Err = CosignError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        parse_path(path).map_err(|e| {
            CosignError::invalid_input(format!("Invalid derivation path '{}': {}", path, e))
        })
    }
}

/// Parse a path and require it to be usable for Ed25519 (all hardened)
pub fn require_ed25519_path(path: &str) -> CosignResult<DerivationPath> {
    let parsed: DerivationPath = path.parse()?;
    if !parsed.is_fully_hardened() {
        return Err(CosignError::invalid_input(format!(
            "Ed25519 paths must be fully hardened: {}",
            parsed
        )));
    }
    Ok(parsed)
}

/// Parse a derivation path string
fn parse_path(path: &str) -> Result<DerivationPath, String> {
    let trimmed = path.trim();

    let rest = match trimmed {
        "m" | "M" => return Ok(DerivationPath { components: Vec::new() }),
        _ => trimmed
            .strip_prefix("m/")
            .or_else(|| trimmed.strip_prefix("M/"))
            .ok_or_else(|| "Derivation path must start with 'm/'".to_string())?,
    };

    if rest.is_empty() {
        return Err("Empty derivation path".to_string());
    }

    let components = rest
        .split('/')
        .map(parse_component)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DerivationPath { components })
}

/// Parse a single path component
fn parse_component(s: &str) -> Result<DerivationComponent, String> {
    let trimmed = s.trim();

    if trimmed.is_empty() {
        return Err("Empty path component".to_string());
    }

    // Check for hardened indicator
    let (number_str, hardened) = match trimmed.strip_suffix(['\'', 'h', 'H']) {
        Some(number) => (number, true),
        None => (trimmed, false),
    };

    let index: u32 = number_str
        .parse()
        .map_err(|e| format!("Invalid path component '{}': {}", s, e))?;

    // Check for overflow (excluding hardened bit)
    if index >= HARDENED {
        return Err(format!("Path component {} exceeds maximum value", index));
    }

    Ok(DerivationComponent::new(index, hardened))
}
