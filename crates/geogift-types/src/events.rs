use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ChainId, ClaimHash, GiftId};
use crate::unlock::UnlockType;

/// Lifecycle events emitted around the escrow boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GiftEvent {
    /// The contract accepted a new gift and its clue commitment
    Created {
        gift_id: GiftId,
        unlock_type: UnlockType,
        clue_hash: ClaimHash,
        expires_at: DateTime<Utc>,
    },

    /// The local pre-flight check refused the claim; nothing was submitted
    PreflightFailed {
        gift_id: GiftId,
        unlock_type: UnlockType,
        reason: String,
    },

    /// A claim payload was handed to the contract
    ClaimSubmitted {
        gift_id: GiftId,
        unlock_type: UnlockType,
        has_secret: bool,
    },

    /// The contract released the gift
    Claimed { gift_id: GiftId },

    /// The contract declined the claim
    ClaimRejected { gift_id: GiftId, reason: String },

    /// The contract accepted a chain and all of its step commitments
    ChainCreated {
        chain_id: ChainId,
        total_steps: usize,
        expires_at: DateTime<Utc>,
    },

    /// A step claim was refused locally; nothing was submitted
    StepPreflightFailed {
        chain_id: ChainId,
        step_index: usize,
        reason: String,
    },

    StepSubmitted {
        chain_id: ChainId,
        step_index: usize,
        unlock_type: UnlockType,
        has_secret: bool,
    },

    /// The contract released a step's value
    StepClaimed { chain_id: ChainId, step_index: usize },

    StepRejected {
        chain_id: ChainId,
        step_index: usize,
        reason: String,
    },
}

impl GiftEvent {
    pub fn gift_id(&self) -> Option<GiftId> {
        match self {
            Self::Created { gift_id, .. }
            | Self::PreflightFailed { gift_id, .. }
            | Self::ClaimSubmitted { gift_id, .. }
            | Self::Claimed { gift_id }
            | Self::ClaimRejected { gift_id, .. } => Some(*gift_id),
            _ => None,
        }
    }

    pub fn chain_id(&self) -> Option<ChainId> {
        match self {
            Self::ChainCreated { chain_id, .. }
            | Self::StepPreflightFailed { chain_id, .. }
            | Self::StepSubmitted { chain_id, .. }
            | Self::StepClaimed { chain_id, .. }
            | Self::StepRejected { chain_id, .. } => Some(*chain_id),
            _ => None,
        }
    }
}

impl fmt::Display for GiftEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created { gift_id, unlock_type, clue_hash, expires_at } => write!(
                f,
                "gift_created id={} type={} clue={} expires={}",
                gift_id, unlock_type, clue_hash, expires_at.to_rfc3339()
            ),
            Self::PreflightFailed { gift_id, unlock_type, reason } => {
                write!(f, "preflight_failed id={} type={} reason={}", gift_id, unlock_type, reason)
            }
            Self::ClaimSubmitted { gift_id, unlock_type, has_secret } => {
                write!(f, "claim_submitted id={} type={} secret={}", gift_id, unlock_type, has_secret)
            }
            Self::Claimed { gift_id } => write!(f, "gift_claimed id={}", gift_id),
            Self::ClaimRejected { gift_id, reason } => {
                write!(f, "claim_rejected id={} reason={}", gift_id, reason)
            }
            Self::ChainCreated { chain_id, total_steps, expires_at } => write!(
                f,
                "chain_created id={} steps={} expires={}",
                chain_id, total_steps, expires_at.to_rfc3339()
            ),
            Self::StepPreflightFailed { chain_id, step_index, reason } => {
                write!(f, "step_preflight_failed chain={} step={} reason={}", chain_id, step_index, reason)
            }
            Self::StepSubmitted { chain_id, step_index, unlock_type, has_secret } => write!(
                f,
                "step_submitted chain={} step={} type={} secret={}",
                chain_id, step_index, unlock_type, has_secret
            ),
            Self::StepClaimed { chain_id, step_index } => {
                write!(f, "step_claimed chain={} step={}", chain_id, step_index)
            }
            Self::StepRejected { chain_id, step_index, reason } => {
                write!(f, "step_rejected chain={} step={} reason={}", chain_id, step_index, reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let event = GiftEvent::ClaimRejected { gift_id: GiftId(4), reason: "Gift has expired".into() };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "ClaimRejected");
        assert_eq!(value["data"]["gift_id"], 4);
        assert_eq!(event.gift_id(), Some(GiftId(4)));
        assert_eq!(event.chain_id(), None);
        assert_eq!(event.to_string(), "claim_rejected id=4 reason=Gift has expired");
    }

    #[test]
    fn step_events_carry_the_chain() {
        let event = GiftEvent::StepClaimed { chain_id: ChainId(2), step_index: 1 };
        assert_eq!(event.chain_id(), Some(ChainId(2)));
        assert_eq!(event.gift_id(), None);
        assert_eq!(event.to_string(), "step_claimed chain=2 step=1");
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "StepClaimed");
        assert_eq!(value["data"]["step_index"], 1);
    }
}
