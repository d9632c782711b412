//! Wallet contract address derivation
//!
//! A wallet address is the representation hash of its `StateInit` cell:
//! `split_depth:0 special:0 code:1 data:1 library:0` plus two references
//! (code, data). Only the hash and depth of the code cell enter that hash,
//! so it is assembled directly from the standard representation. Code
//! identities come from the published contract BOCs under `resources/`.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

use super::address::TonAddress;
use crate::cell::{boc, Cell, CellBuilder};
use crate::error::{CosignError, CosignResult};

/// Subwallet id base used by v3/v4 wallets (added to the workchain)
pub const DEFAULT_SUBWALLET_ID: u32 = 698_983_191;

/// Global network ids used by v5 wallet ids
const MAINNET_GLOBAL_ID: i32 = -239;
const TESTNET_GLOBAL_ID: i32 = -3;

/// Published wallet contract code, base64 BOC
const V4R2_CODE_BOC: &str = include_str!("../../resources/wallet/wallet_v4r2.code");
const V5R1_CODE_BOC: &str = include_str!("../../resources/wallet/wallet_v5r1.code");

static V4R2_CODE: OnceLock<Result<WalletCode, CosignError>> = OnceLock::new();
static V5R1_CODE: OnceLock<Result<WalletCode, CosignError>> = OnceLock::new();

/// Supported wallet contract versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletVersion {
    V4R2,
    V5R1,
}

impl WalletVersion {
    pub fn name(&self) -> &'static str {
        match self {
            Self::V4R2 => "v4r2",
            Self::V5R1 => "v5r1",
        }
    }

    /// Code cell identity of the published contract for this version
    pub fn default_code(&self) -> CosignResult<WalletCode> {
        let (cache, boc) = match self {
            Self::V4R2 => (&V4R2_CODE, V4R2_CODE_BOC),
            Self::V5R1 => (&V5R1_CODE, V5R1_CODE_BOC),
        };
        cache.get_or_init(|| WalletCode::from_boc_str(boc)).clone()
    }
}

/// Identity of a contract code cell: its representation hash and depth
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalletCode {
    pub hash: [u8; 32],
    pub depth: u16,
}

impl WalletCode {
    /// Take the identity from a full code BOC (hex or base64)
    pub fn from_boc_str(encoded: &str) -> CosignResult<Self> {
        let bytes = crate::utils::decode_bytes(encoded)?;
        let cell = boc::from_boc(&bytes)?;
        Ok(Self::from_cell(&cell))
    }

    pub fn from_cell(cell: &Cell) -> Self {
        Self {
            hash: cell.hash(),
            depth: cell.depth(),
        }
    }
}

/// Derives wallet addresses from public keys
///
/// Versions without an override use the published contract code.
#[derive(Debug, Clone, Default)]
pub struct WalletDeriver {
    v4r2: Option<WalletCode>,
    v5r1: Option<WalletCode>,
    testnet: bool,
}

impl WalletDeriver {
    pub fn new(testnet: bool) -> Self {
        Self {
            testnet,
            ..Self::default()
        }
    }

    /// Replace the code identity used for `version`
    pub fn with_code(mut self, version: WalletVersion, code: WalletCode) -> Self {
        match version {
            WalletVersion::V4R2 => self.v4r2 = Some(code),
            WalletVersion::V5R1 => self.v5r1 = Some(code),
        }
        self
    }

    pub fn code(&self, version: WalletVersion) -> CosignResult<WalletCode> {
        let custom = match version {
            WalletVersion::V4R2 => self.v4r2,
            WalletVersion::V5R1 => self.v5r1,
        };
        match custom {
            Some(code) => Ok(code),
            None => version.default_code(),
        }
    }

    /// Non-bounceable address of the wallet contract owned by `public_key`
    pub fn derive_address(
        &self,
        public_key: &[u8; 32],
        version: WalletVersion,
        workchain: i32,
    ) -> CosignResult<TonAddress> {
        let data = wallet_data_cell(version, public_key, workchain, self.testnet)?;
        let hash = state_init_hash(&self.code(version)?, &data);
        Ok(TonAddress::new(workchain, hash).with_testnet(self.testnet))
    }
}

/// Mainnet address of `version` owned by `public_key`, using the built-in code
pub fn derive_wallet_address(
    public_key: &[u8; 32],
    version: WalletVersion,
    workchain: i32,
) -> CosignResult<TonAddress> {
    WalletDeriver::default().derive_address(public_key, version, workchain)
}

/// Initial persistent data of a freshly deployed wallet
pub fn wallet_data_cell(
    version: WalletVersion,
    public_key: &[u8; 32],
    workchain: i32,
    testnet: bool,
) -> CosignResult<Cell> {
    let mut builder = CellBuilder::new();
    match version {
        WalletVersion::V4R2 => {
            let subwallet = DEFAULT_SUBWALLET_ID.wrapping_add(workchain as u32);
            builder
                .store_uint(0, 32)? // seqno
                .store_uint(subwallet as u64, 32)?
                .store_bytes(public_key)?
                .store_bit(false)?; // empty plugin dictionary
        }
        WalletVersion::V5R1 => {
            builder
                .store_bit(true)? // signature auth allowed
                .store_uint(0, 32)? // seqno
                .store_uint(v5_wallet_id(workchain, testnet)? as u64, 32)?
                .store_bytes(public_key)?
                .store_bit(false)?; // empty extensions dictionary
        }
    }
    Ok(builder.build()?)
}

/// Wallet id of a v5r1 wallet with subwallet number 0
fn v5_wallet_id(workchain: i32, testnet: bool) -> CosignResult<u32> {
    let workchain = i8::try_from(workchain)
        .map_err(|_| CosignError::invalid_input(format!("Workchain {} out of range", workchain)))?;
    // client context: flag:1 workchain:int8 version:uint8 subwallet:uint15
    let context = (1u32 << 31) | ((workchain as u8 as u32) << 23);
    let global_id = if testnet { TESTNET_GLOBAL_ID } else { MAINNET_GLOBAL_ID };
    Ok(context ^ global_id as u32)
}

/// Representation hash of `StateInit { code, data }`
pub fn state_init_hash(code: &WalletCode, data: &Cell) -> [u8; 32] {
    let mut hasher = Sha256::new();
    // d1: two refs; d2: 5 data bits; data: 0b00110 + completion tag
    hasher.update([0x02, 0x01, 0x34]);
    hasher.update(code.depth.to_be_bytes());
    hasher.update(data.depth().to_be_bytes());
    hasher.update(code.hash);
    hasher.update(data.hash());
    hasher.finalize().into()
}
