//! TON address codec
//!
//! Based on the TON address format: https://docs.ton.org/learn/overviews/addresses
//!
//! Supports:
//! - User-friendly format (36 bytes, base64 or base64url, CRC16 protected)
//! - Raw format (`workchain:hex_hash`)

use base64::{engine::general_purpose::{STANDARD, URL_SAFE}, Engine};
use crc::{Crc, CRC_16_XMODEM};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CosignError, CosignResult};

/// TON workchain constants
pub const BASE_WORKCHAIN: i32 = 0;
pub const MASTER_WORKCHAIN: i32 = -1;

const TAG_BOUNCEABLE: u8 = 0x11;
const TAG_NON_BOUNCEABLE: u8 = 0x51;
const TAG_TESTNET: u8 = 0x80;

const ADDRESS_CRC: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

/// TON Address representation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TonAddress {
    /// Workchain ID (-1 for masterchain, 0 for basechain)
    pub workchain: i32,
    /// 32-byte hash of the account state init
    pub hash: [u8; 32],
    /// Whether the address is bounceable
    pub bounceable: bool,
    /// Whether this is a testnet address
    pub testnet: bool,
}

impl TonAddress {
    /// Create a non-bounceable mainnet address
    pub fn new(workchain: i32, hash: [u8; 32]) -> Self {
        Self {
            workchain,
            hash,
            bounceable: false,
            testnet: false,
        }
    }

    /// Parse address from user-friendly or raw string
    pub fn from_string(s: &str) -> CosignResult<Self> {
        let s = s.trim();
        if s.contains(':') {
            return Self::from_raw_string(s);
        }

        // User-friendly base64 format (48 chars)
        if s.len() != 48 {
            return Err(CosignError::invalid_address(format!(
                "Invalid TON address length: expected 48, got {}",
                s.len()
            )));
        }

        let bytes = if s.contains('-') || s.contains('_') {
            URL_SAFE.decode(s)
        } else {
            STANDARD.decode(s)
        }
        .map_err(|e| CosignError::invalid_address(format!("Base64 decode error: {}", e)))?;

        if bytes.len() != 36 {
            return Err(CosignError::invalid_address("Invalid decoded address length"));
        }

        let crc = u16::from_be_bytes([bytes[34], bytes[35]]);
        if crc != crc16_xmodem(&bytes[..34]) {
            return Err(CosignError::invalid_address("Invalid address checksum"));
        }

        let testnet = bytes[0] & TAG_TESTNET != 0;
        let bounceable = match bytes[0] & !TAG_TESTNET {
            TAG_BOUNCEABLE => true,
            TAG_NON_BOUNCEABLE => false,
            tag => {
                return Err(CosignError::invalid_address(format!(
                    "Unknown address tag 0x{:02x}",
                    tag
                )))
            }
        };

        let workchain = bytes[1] as i8 as i32;
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&bytes[2..34]);

        Ok(Self {
            workchain,
            hash,
            bounceable,
            testnet,
        })
    }

    /// Parse from raw format: workchain:hex_hash
    fn from_raw_string(s: &str) -> CosignResult<Self> {
        let (workchain, hash_hex) = s
            .split_once(':')
            .ok_or_else(|| CosignError::invalid_address("Invalid raw address format"))?;

        let workchain: i32 = workchain
            .parse()
            .map_err(|_| CosignError::invalid_address("Invalid workchain"))?;
        if !(i8::MIN as i32..=i8::MAX as i32).contains(&workchain) {
            return Err(CosignError::invalid_address("Workchain out of range"));
        }

        let hash: [u8; 32] = hex::decode(hash_hex)
            .map_err(|_| CosignError::invalid_address("Invalid hex in hash"))?
            .try_into()
            .map_err(|_| CosignError::invalid_address("Invalid hash length"))?;

        Ok(Self::new(workchain, hash))
    }

    /// Convert to user-friendly format (base64 URL-safe)
    pub fn to_user_friendly(&self) -> String {
        let mut data = Vec::with_capacity(36);

        let tag = if self.bounceable { TAG_BOUNCEABLE } else { TAG_NON_BOUNCEABLE }
            | if self.testnet { TAG_TESTNET } else { 0x00 };
        data.push(tag);
        data.push(self.workchain as i8 as u8);
        data.extend_from_slice(&self.hash);

        let crc = crc16_xmodem(&data);
        data.extend_from_slice(&crc.to_be_bytes());

        URL_SAFE.encode(&data)
    }

    /// Convert to raw format: workchain:hex_hash
    pub fn to_raw(&self) -> String {
        format!("{}:{}", self.workchain, hex::encode(self.hash))
    }

    pub fn with_bounceable(mut self, bounceable: bool) -> Self {
        self.bounceable = bounceable;
        self
    }

    pub fn with_testnet(mut self, testnet: bool) -> Self {
        self.testnet = testnet;
        self
    }

    /// Same account regardless of display flags
    pub fn same_account(&self, other: &TonAddress) -> bool {
        self.workchain == other.workchain && self.hash == other.hash
    }
}

impl fmt::Display for TonAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_user_friendly())
    }
}

impl FromStr for TonAddress {
    type Err = CosignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_string(s)
    }
}

/// CRC16-XMODEM checksum (used in TON addresses)
fn crc16_xmodem(data: &[u8]) -> u16 {
    ADDRESS_CRC.checksum(data)
}
