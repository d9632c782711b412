//! Canonical Authorization Encoder
//!
//! Layout of the authorization body signed by the final signer:
//!
//! ```text
//! body  = final_signer_index:uint8 has_chain:bit chain:(has_chain ? ^Node) order:(inline bits + refs)
//! Node  = signature:bits512 participant_index:uint8 has_next:bit next:(has_next ? ^Node)
//! final = signature:bits512 body
//! ```
//!
//! The chain is folded in input order: the first signature becomes the
//! innermost node and the last one the head referenced from the body.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use super::signer::Signer;
use crate::cell::{boc, Cell, CellBuilder, CellError};
use crate::error::{CosignError, CosignResult};
use crate::ton::{external_message, TonAddress};
use crate::types::{CollectedSignature, ParticipantIndex};

/// What to do with repeated non-final participant indices in a chain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Encode every entry as given
    #[default]
    PassThrough,
    /// Fail with `DuplicateParticipantIndex`
    Reject,
}

/// Fold `signatures` (minus `exclude_index`) into a linked chain of cells.
///
/// Returns `None` when nothing is left after exclusion.
pub fn build_chain(
    signatures: &[CollectedSignature],
    exclude_index: ParticipantIndex,
) -> Result<Option<Cell>, CellError> {
    let mut head: Option<Cell> = None;

    for entry in signatures
        .iter()
        .filter(|s| s.participant_index != exclude_index)
    {
        let mut builder = CellBuilder::new();
        builder
            .store_bytes(&entry.signature)?
            .store_uint(entry.participant_index as u64, 8)?;
        match head.take() {
            None => {
                builder.store_bit(false)?;
            }
            Some(previous) => {
                builder.store_bit(true)?.store_ref(Arc::new(previous))?;
            }
        }
        head = Some(builder.build()?);
    }

    Ok(head)
}

/// Like [`build_chain`], enforcing `policy` on the entries that remain
pub fn build_chain_with_policy(
    signatures: &[CollectedSignature],
    exclude_index: ParticipantIndex,
    policy: DuplicatePolicy,
) -> CosignResult<Option<Cell>> {
    if policy == DuplicatePolicy::Reject {
        let mut seen = HashSet::new();
        for entry in signatures
            .iter()
            .filter(|s| s.participant_index != exclude_index)
        {
            if !seen.insert(entry.participant_index) {
                return Err(CosignError::duplicate_participant(entry.participant_index));
            }
        }
    }
    Ok(build_chain(signatures, exclude_index)?)
}

/// The canonical body and the facts needed to report on it
#[derive(Debug, Clone)]
pub struct AuthorizationPayload {
    pub final_signer_index: ParticipantIndex,
    pub chain_length: usize,
    pub body: Cell,
}

impl AuthorizationPayload {
    /// Representation hash signed by the final signer
    pub fn hash(&self) -> [u8; 32] {
        self.body.hash()
    }
}

/// Build the body binding `final_index`, the excluded chain and `order`
pub fn build_payload(
    final_index: ParticipantIndex,
    signatures: &[CollectedSignature],
    order: &Cell,
    policy: DuplicatePolicy,
) -> CosignResult<AuthorizationPayload> {
    let chain = build_chain_with_policy(signatures, final_index, policy)?;
    let chain_length = signatures
        .iter()
        .filter(|s| s.participant_index != final_index)
        .count();

    let mut builder = CellBuilder::new();
    builder.store_uint(final_index as u64, 8)?;
    match chain {
        Some(chain) => {
            builder.store_bit(true)?.store_ref(Arc::new(chain))?;
        }
        None => {
            builder.store_bit(false)?;
        }
    }
    builder.store_slice(&order.parse()).map_err(|e| {
        CosignError::encoding(format!("Order does not fit in the authorization body: {}", e))
    })?;

    Ok(AuthorizationPayload {
        final_signer_index: final_index,
        chain_length,
        body: builder.build()?,
    })
}

/// Body cell with the default duplicate policy
pub fn build_body(
    final_index: ParticipantIndex,
    signatures: &[CollectedSignature],
    order: &Cell,
) -> CosignResult<Cell> {
    Ok(build_payload(final_index, signatures, order, DuplicatePolicy::default())?.body)
}

/// Build the body and have `signer` sign its hash
pub fn build_authorization<S: Signer + ?Sized>(
    signer: &S,
    final_index: ParticipantIndex,
    signatures: &[CollectedSignature],
    order: &Cell,
    policy: DuplicatePolicy,
) -> CosignResult<FinalMessage> {
    let payload = build_payload(final_index, signatures, order, policy)?;
    let signature = signer.sign(&payload.hash())?;
    Ok(FinalMessage { signature, payload })
}

/// Signed authorization ready for export
#[derive(Debug, Clone)]
pub struct FinalMessage {
    pub signature: [u8; 64],
    pub payload: AuthorizationPayload,
}

impl FinalMessage {
    pub fn body_hash(&self) -> [u8; 32] {
        self.payload.hash()
    }

    /// Signature bits followed by the body bits and refs in one cell
    pub fn to_cell(&self) -> CosignResult<Cell> {
        let mut builder = CellBuilder::new();
        builder
            .store_bytes(&self.signature)?
            .store_slice(&self.payload.body.parse())
            .map_err(|e| {
                CosignError::encoding(format!("Signed body exceeds one cell: {}", e))
            })?;
        Ok(builder.build()?)
    }

    pub fn to_boc(&self) -> CosignResult<Vec<u8>> {
        Ok(boc::to_boc(&self.to_cell()?)?)
    }

    /// The authorization wrapped in an external message to `wallet`
    pub fn to_external_message(&self, wallet: &TonAddress) -> CosignResult<Cell> {
        Ok(external_message(wallet, &self.to_cell()?)?)
    }
}

/// Authorization decoded back from its wire form
#[derive(Debug, Clone)]
pub struct ParsedAuthorization {
    pub signature: [u8; 64],
    pub final_signer_index: ParticipantIndex,
    /// Chain entries, head (last folded) first
    pub chain: Vec<CollectedSignature>,
    pub order: Cell,
    pub body_hash: [u8; 32],
}

impl ParsedAuthorization {
    /// Chain entries in the order they were folded
    pub fn signatures_in_fold_order(&self) -> Vec<CollectedSignature> {
        self.chain.iter().rev().copied().collect()
    }
}

/// Decode an exported authorization BOC
pub fn parse_authorization(bytes: &[u8]) -> CosignResult<ParsedAuthorization> {
    let root = boc::from_boc(bytes)?;
    let mut slice = root.parse();

    let signature = read_signature(slice.load_bytes(64)?)?;
    let body = slice.to_cell()?;

    let mut body_slice = body.parse();
    let final_signer_index = body_slice.load_uint(8)? as ParticipantIndex;
    let mut chain = Vec::new();
    if body_slice.load_bit()? {
        let mut node = body_slice.load_ref()?.clone();
        loop {
            let mut node_slice = node.parse();
            let entry_sig = read_signature(node_slice.load_bytes(64)?)?;
            let index = node_slice.load_uint(8)? as ParticipantIndex;
            chain.push(CollectedSignature::new(entry_sig, index));
            if !node_slice.load_bit()? {
                break;
            }
            let next = node_slice.load_ref()?.clone();
            node = next;
        }
    }
    let order = body_slice.to_cell()?;

    Ok(ParsedAuthorization {
        signature,
        final_signer_index,
        chain,
        order,
        body_hash: body.hash(),
    })
}

fn read_signature(bytes: Vec<u8>) -> CosignResult<[u8; 64]> {
    bytes
        .try_into()
        .map_err(|_| CosignError::encoding("Truncated signature"))
}
