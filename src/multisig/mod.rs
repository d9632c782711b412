//! Multisig co-signing
//!
//! - `signer`: key pairs and detached signatures over 32-byte digests
//! - `encoder`: the canonical signature chain and authorization body
//! - `orchestrator`: the round state machine tying both together

pub mod encoder;
pub mod orchestrator;
pub mod signer;

pub use encoder::{
    build_authorization, build_body, build_chain, build_chain_with_policy, build_payload,
    parse_authorization, AuthorizationPayload, DuplicatePolicy, FinalMessage,
    ParsedAuthorization,
};
pub use orchestrator::{CosignSession, SessionState, MAX_THRESHOLD};
pub use signer::{verify, KeyPair, Signer, DIGEST_LEN};
