//! Co-Signing Orchestrator
//!
//! Drives one authorization round:
//!
//! ```text
//! Idle -> CollectingKeys(remaining) -> CollectingSignatures(remaining) -> Finalizing -> Done
//!                      \__________________________\___________________________\-> Aborted
//! ```
//!
//! Every participant signs the shared transaction digest. The participant
//! that brings the count to the threshold also signs the authorization body
//! built over all collected signatures, which closes the round.

use std::collections::HashSet;
use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine};

use super::encoder::{build_authorization, FinalMessage};
use super::signer::{verify, Signer};
use crate::cell::{boc, Cell};
use crate::config::CosignSettings;
use crate::error::{CosignError, CosignResult};
use crate::ton::TonAddress;
use crate::types::{CollectedSignature, CosignOutput, ParticipantInput, SessionRequest};
use crate::wallet::{DerivationScheme, KeyResolver, RecoveryPhrase};
use crate::{log_error, log_info, log_warn};

/// Largest threshold a `uint8` participant index can address
pub const MAX_THRESHOLD: u32 = 255;

/// Round progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    CollectingKeys { remaining: u32 },
    CollectingSignatures { remaining: u32 },
    Finalizing,
    Done,
    Aborted,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::CollectingKeys { remaining } => write!(f, "collecting_keys({})", remaining),
            Self::CollectingSignatures { remaining } => {
                write!(f, "collecting_signatures({})", remaining)
            }
            Self::Finalizing => write!(f, "finalizing"),
            Self::Done => write!(f, "done"),
            Self::Aborted => write!(f, "aborted"),
        }
    }
}

/// One co-signing round for a multisig wallet
pub struct CosignSession {
    wallet: TonAddress,
    threshold: u32,
    digest: [u8; 32],
    order: Cell,
    settings: CosignSettings,
    resolver: KeyResolver,
    state: SessionState,
    collected: Vec<CollectedSignature>,
    seen: HashSet<u8>,
    abort_reason: Option<CosignError>,
}

impl CosignSession {
    pub fn new(
        wallet: TonAddress,
        threshold: u32,
        digest: &[u8],
        order: Cell,
        settings: CosignSettings,
    ) -> CosignResult<Self> {
        if threshold == 0 || threshold > MAX_THRESHOLD {
            return Err(CosignError::invalid_threshold(format!(
                "Threshold must be between 1 and {}, got {}",
                MAX_THRESHOLD, threshold
            )));
        }

        let digest: [u8; 32] = digest
            .try_into()
            .map_err(|_| CosignError::invalid_digest_length(32, digest.len()))?;

        for warning in settings.validate()? {
            log_warn!("orchestrator", warning);
        }
        let resolver = KeyResolver::new(&settings)?;

        Ok(Self {
            wallet,
            threshold,
            digest,
            order,
            settings,
            resolver,
            state: SessionState::Idle,
            collected: Vec::with_capacity(threshold as usize),
            seen: HashSet::new(),
            abort_reason: None,
        })
    }

    /// Build a session from a parsed session file
    pub fn from_request(request: &SessionRequest, settings: CosignSettings) -> CosignResult<Self> {
        let wallet = TonAddress::from_string(&request.wallet_address)?;
        let digest = crate::utils::decode_bytes(&request.tx_hash)?;
        let order_bytes = crate::utils::decode_bytes(&request.order_boc)?;
        let order = boc::from_boc(&order_bytes)?;
        Self::new(wallet, request.threshold, &digest, order, settings)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn wallet(&self) -> &TonAddress {
        &self.wallet
    }

    /// Signatures over the shared digest, in submission order
    pub fn collected(&self) -> &[CollectedSignature] {
        &self.collected
    }

    pub fn abort_reason(&self) -> Option<&CosignError> {
        self.abort_reason.as_ref()
    }

    /// Process the next participant.
    ///
    /// Returns the final message once this participant reaches the
    /// threshold, `None` while more signatures are needed.
    pub fn submit(&mut self, participant: &ParticipantInput) -> CosignResult<Option<FinalMessage>> {
        if self.state.is_terminal() {
            return Err(CosignError::session_closed(format!(
                "Session is {}",
                self.state
            )));
        }

        match self.process(participant) {
            Ok(result) => Ok(result),
            Err(e) => {
                log_error!(
                    "orchestrator",
                    "Aborting co-signing round",
                    participant_index = participant.index,
                    reason = e
                );
                self.state = SessionState::Aborted;
                self.abort_reason = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Process participants in order until the threshold is reached
    pub fn run(&mut self, participants: &[ParticipantInput]) -> CosignResult<FinalMessage> {
        let needed = self.remaining() as usize;
        if participants.len() < needed {
            let err = CosignError::insufficient_signatures(
                self.collected.len() + participants.len(),
                self.threshold as usize,
            );
            if !self.state.is_terminal() {
                self.state = SessionState::Aborted;
                self.abort_reason = Some(err.clone());
            }
            return Err(err);
        }

        for (position, participant) in participants.iter().enumerate() {
            if let Some(message) = self.submit(participant)? {
                let ignored = participants.len() - position - 1;
                if ignored > 0 {
                    log_warn!(
                        "orchestrator",
                        "Threshold reached before all participants were processed",
                        ignored = ignored
                    );
                }
                return Ok(message);
            }
        }

        Err(CosignError::insufficient_signatures(
            self.collected.len(),
            self.threshold as usize,
        ))
    }

    /// Signatures still needed
    pub fn remaining(&self) -> u32 {
        match self.state {
            SessionState::Idle => self.threshold,
            SessionState::CollectingKeys { remaining }
            | SessionState::CollectingSignatures { remaining } => remaining,
            _ => 0,
        }
    }

    /// Summarize a completed round for output
    pub fn output(&self, message: &FinalMessage) -> CosignResult<CosignOutput> {
        let authorization = message.to_boc()?;
        let external = boc::to_boc(&message.to_external_message(&self.wallet)?)?;
        Ok(CosignOutput {
            wallet_address: self.wallet.to_string(),
            final_signer_index: message.payload.final_signer_index,
            chain_length: message.payload.chain_length,
            body_hash: message.body_hash(),
            authorization_boc: STANDARD.encode(&authorization),
            authorization_boc_hex: hex::encode(&authorization),
            external_message_boc: STANDARD.encode(&external),
            signatures: self.collected.clone(),
        })
    }

    fn process(&mut self, participant: &ParticipantInput) -> CosignResult<Option<FinalMessage>> {
        let remaining = self.remaining();
        self.state = SessionState::CollectingKeys { remaining };

        if !self.seen.insert(participant.index) {
            return Err(CosignError::duplicate_participant(participant.index));
        }

        let target = participant
            .address
            .as_deref()
            .map(TonAddress::from_string)
            .transpose()?;
        let phrase = RecoveryPhrase::new(&participant.mnemonic)?;
        let resolved = self.resolver.resolve(
            &phrase,
            participant.scheme,
            participant.account_index,
            target.as_ref(),
        )?;
        drop(phrase);

        if participant.scheme == DerivationScheme::Standard {
            if let Some(target) = &target {
                if !resolved.address.same_account(target) {
                    log_warn!(
                        "orchestrator",
                        "Declared address differs from the derived standard wallet",
                        participant_index = participant.index,
                        derived_address = resolved.address
                    );
                }
            }
        }

        self.state = SessionState::CollectingSignatures { remaining };
        let keypair = resolved.keypair;
        let signature = keypair.sign(&self.digest)?;
        if !verify(&keypair.public_key(), &self.digest, &signature)? {
            return Err(CosignError::crypto_error("Produced signature does not verify"));
        }
        self.collected
            .push(CollectedSignature::new(signature, participant.index));

        let remaining = remaining - 1;
        log_info!(
            "orchestrator",
            "Collected signature",
            participant_index = participant.index,
            remaining = remaining
        );

        if remaining > 0 {
            self.state = SessionState::CollectingKeys { remaining };
            return Ok(None);
        }

        self.state = SessionState::Finalizing;
        let message = build_authorization(
            &keypair,
            participant.index,
            &self.collected,
            &self.order,
            self.settings.duplicate_policy,
        )?;
        drop(keypair);

        log_info!(
            "orchestrator",
            "Authorization assembled",
            final_signer_index = message.payload.final_signer_index,
            chain_length = message.payload.chain_length,
            body_hash = hex::encode(message.body_hash())
        );
        self.state = SessionState::Done;
        Ok(Some(message))
    }
}

impl fmt::Debug for CosignSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CosignSession")
            .field("wallet", &self.wallet.to_string())
            .field("threshold", &self.threshold)
            .field("state", &self.state)
            .field("collected", &self.collected.len())
            .finish()
    }
}
