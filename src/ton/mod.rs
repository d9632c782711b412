//! TON ledger primitives
//!
//! - `address`: user-friendly and raw address codec
//! - `contract`: wallet contract versions and address derivation
//! - `message`: inbound external message envelope

pub mod address;
pub mod contract;
pub mod message;

pub use address::{TonAddress, BASE_WORKCHAIN, MASTER_WORKCHAIN};
pub use contract::{derive_wallet_address, WalletCode, WalletDeriver, WalletVersion};
pub use message::external_message;
