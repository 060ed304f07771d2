use std::future::Future;

use geogift_types::models::{ChainId, ChainState, GiftId, GiftState};
use geogift_types::unlock::UnlockPayload;
use serde::Serialize;
use thiserror::Error;

use crate::dispatcher::UnlockChallenge;

/// Arguments of the contract's gift-creation call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateGift {
    pub recipient: String,
    /// Base units as a decimal string.
    pub amount: String,
    pub expiry_days: i64,
    pub message: String,
    /// Unlock type tag, clue hash and any auxiliary unlock data.
    pub challenge: UnlockChallenge,
}

/// One step of a chain as submitted to the contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainStep {
    pub step_index: usize,
    pub title: String,
    pub message: String,
    /// Base units released when this step is claimed.
    pub value: String,
    pub challenge: UnlockChallenge,
}

/// Arguments of the contract's chain-creation call. Build it with
/// `ChainDraft::into_request` so the draft is validated first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateChain {
    pub title: String,
    pub description: Option<String>,
    pub recipient: String,
    pub total_value: String,
    pub expiry_days: i64,
    pub steps: Vec<ChainStep>,
}

/// Why the contract refused a call. Messages are shown to users verbatim.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EscrowRejection {
    #[error("Gift {0} not found")]
    GiftNotFound(GiftId),
    #[error("Gift already claimed")]
    AlreadyClaimed,
    #[error("Gift has expired")]
    Expired,
    #[error("Too far from gift location: {distance_m:.0} m away, radius is {radius_m} m")]
    TooFar { distance_m: f64, radius_m: u32 },
    #[error("Incorrect password or answer")]
    WrongSecret,
    #[error("Chain {0} not found")]
    ChainNotFound(ChainId),
    #[error("Step {0} does not exist")]
    StepNotFound(usize),
    #[error("Step {0} already claimed")]
    StepAlreadyClaimed(usize),
    #[error("Step {got} is locked; step {expected} must be claimed first")]
    StepOutOfOrder { expected: usize, got: usize },
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("{0}")]
    Other(String),
}

/// Capability surface of the on-chain escrow. Each call is one transaction
/// (or one read) and is the final word on the outcome.
pub trait EscrowContract: Send + Sync {
    fn create_gift(
        &self,
        request: CreateGift,
    ) -> impl Future<Output = Result<GiftId, EscrowRejection>> + Send;

    fn claim_gift(
        &self,
        gift_id: GiftId,
        payload: UnlockPayload,
    ) -> impl Future<Output = Result<(), EscrowRejection>> + Send;

    fn gift_state(
        &self,
        gift_id: GiftId,
    ) -> impl Future<Output = Result<GiftState, EscrowRejection>> + Send;

    fn create_chain(
        &self,
        request: CreateChain,
    ) -> impl Future<Output = Result<ChainId, EscrowRejection>> + Send;

    /// Claim one step. Only the chain's current step is accepted.
    fn claim_step(
        &self,
        chain_id: ChainId,
        step_index: usize,
        payload: UnlockPayload,
    ) -> impl Future<Output = Result<(), EscrowRejection>> + Send;

    fn chain_state(
        &self,
        chain_id: ChainId,
    ) -> impl Future<Output = Result<ChainState, EscrowRejection>> + Send;
}
