use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use geogift_types::models::{
    ChainId, ChainState, ClaimAttempt, GeoPoint, GiftId, GiftState, StepState,
};
use geogift_types::unlock::UnlockPayload;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::chain::{MAX_EXPIRY_DAYS, is_address, is_amount};
use crate::dispatcher::{ChallengeReference, UnlockChallenge};
use crate::escrow::{CreateChain, CreateGift, EscrowContract, EscrowRejection};
use crate::expiry::{calculate_expiry_date, is_gift_expired};
use crate::geo::validate_location;

struct StoredGift {
    state: GiftState,
    challenge: UnlockChallenge,
    message: String,
}

struct StoredChain {
    state: ChainState,
    challenges: Vec<UnlockChallenge>,
    attempts: Vec<ClaimAttempt>,
}

/// In-process escrow that enforces the same claim rules as the deployed
/// contract: existence, single claim, expiry, GPS radius and hash equality
/// for password/quiz gifts, plus strict step order for chains. Backs the dev
/// server and the tests.
pub struct MemoryEscrow {
    next_id: AtomicU64,
    next_chain_id: AtomicU64,
    gifts: RwLock<HashMap<GiftId, StoredGift>>,
    chains: RwLock<HashMap<ChainId, StoredChain>>,
}

impl Default for MemoryEscrow {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryEscrow {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            next_chain_id: AtomicU64::new(1),
            gifts: RwLock::new(HashMap::new()),
            chains: RwLock::new(HashMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.gifts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.gifts.read().await.is_empty()
    }

    /// Stored challenge and message, as a recipient's claim page shows them.
    pub async fn challenge(&self, gift_id: GiftId) -> Option<(UnlockChallenge, String)> {
        self.gifts
            .read()
            .await
            .get(&gift_id)
            .map(|g| (g.challenge.clone(), g.message.clone()))
    }

    /// Per-step challenges of a chain, in step order.
    pub async fn chain_challenges(&self, chain_id: ChainId) -> Option<Vec<UnlockChallenge>> {
        self.chains.read().await.get(&chain_id).map(|c| c.challenges.clone())
    }

    /// Every claim submitted against the chain, oldest first.
    pub async fn chain_attempts(&self, chain_id: ChainId) -> Option<Vec<ClaimAttempt>> {
        self.chains.read().await.get(&chain_id).map(|c| c.attempts.clone())
    }
}

fn invalid(message: String) -> EscrowRejection {
    EscrowRejection::InvalidRequest(message)
}

fn check_terms(recipient: &str, expiry_days: i64) -> Result<(), EscrowRejection> {
    if !is_address(recipient) {
        return Err(invalid(format!("invalid recipient {:?}", recipient)));
    }
    if !(1..=MAX_EXPIRY_DAYS).contains(&expiry_days) {
        return Err(invalid(format!(
            "expiry must be between 1 and {} days, got {}",
            MAX_EXPIRY_DAYS, expiry_days
        )));
    }
    Ok(())
}

fn check_claim(challenge: &UnlockChallenge, payload: &UnlockPayload) -> Result<(), EscrowRejection> {
    match challenge.reference() {
        ChallengeReference::Location { target, radius_meters } => {
            let user = GeoPoint { latitude: payload.lat, longitude: payload.lng };
            user.validate().map_err(|e| invalid(e.to_string()))?;
            let check = validate_location(target, &user, *radius_meters);
            if !check.within_radius {
                return Err(EscrowRejection::TooFar {
                    distance_m: check.distance_meters,
                    radius_m: *radius_meters,
                });
            }
        }
        ChallengeReference::Secret { .. } => {
            if payload.unlock_bytes != Some(challenge.clue_hash()) {
                return Err(EscrowRejection::WrongSecret);
            }
        }
        ChallengeReference::Content { .. } | ChallengeReference::Media { .. } => {}
    }
    Ok(())
}

fn check_step(chain: &StoredChain, step_index: usize, payload: &UnlockPayload) -> Result<(), EscrowRejection> {
    if chain.state.steps[step_index].completed {
        return Err(EscrowRejection::StepAlreadyClaimed(step_index));
    }
    if is_gift_expired(chain.state.expires_at) {
        return Err(EscrowRejection::Expired);
    }
    if step_index != chain.state.current_step {
        return Err(EscrowRejection::StepOutOfOrder {
            expected: chain.state.current_step,
            got: step_index,
        });
    }
    check_claim(&chain.challenges[step_index], payload)
}

impl EscrowContract for MemoryEscrow {
    async fn create_gift(&self, request: CreateGift) -> Result<GiftId, EscrowRejection> {
        check_terms(&request.recipient, request.expiry_days)?;
        if request.amount.is_empty() || !request.amount.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid(format!("invalid amount {:?}", request.amount)));
        }

        let gift_id = GiftId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let state = GiftState {
            gift_id,
            recipient: request.recipient,
            amount: request.amount,
            unlock_type: request.challenge.unlock_type(),
            claimed: false,
            expires_at: calculate_expiry_date(request.expiry_days),
        };

        info!(
            "Gift {} created: type={} amount={} expires={}",
            gift_id,
            state.unlock_type,
            state.amount,
            state.expires_at.to_rfc3339()
        );

        self.gifts.write().await.insert(
            gift_id,
            StoredGift { state, challenge: request.challenge, message: request.message },
        );
        Ok(gift_id)
    }

    async fn claim_gift(&self, gift_id: GiftId, payload: UnlockPayload) -> Result<(), EscrowRejection> {
        let mut gifts = self.gifts.write().await;
        let gift = gifts.get_mut(&gift_id).ok_or(EscrowRejection::GiftNotFound(gift_id))?;

        if gift.state.claimed {
            return Err(EscrowRejection::AlreadyClaimed);
        }
        if is_gift_expired(gift.state.expires_at) {
            return Err(EscrowRejection::Expired);
        }
        check_claim(&gift.challenge, &payload)?;

        gift.state.claimed = true;
        debug!("Gift {} released to {}", gift_id, gift.state.recipient);
        Ok(())
    }

    async fn gift_state(&self, gift_id: GiftId) -> Result<GiftState, EscrowRejection> {
        self.gifts
            .read()
            .await
            .get(&gift_id)
            .map(|g| g.state.clone())
            .ok_or(EscrowRejection::GiftNotFound(gift_id))
    }

    async fn create_chain(&self, request: CreateChain) -> Result<ChainId, EscrowRejection> {
        check_terms(&request.recipient, request.expiry_days)?;
        if !is_amount(&request.total_value) {
            return Err(invalid(format!("invalid amount {:?}", request.total_value)));
        }
        if request.steps.is_empty() {
            return Err(invalid("a chain needs at least one step".into()));
        }
        if let Some((position, step)) =
            request.steps.iter().enumerate().find(|(i, s)| s.step_index != *i)
        {
            return Err(invalid(format!(
                "step {} has step_index {}",
                position, step.step_index
            )));
        }

        let chain_id = ChainId(self.next_chain_id.fetch_add(1, Ordering::Relaxed));
        let (steps, challenges): (Vec<_>, Vec<_>) = request
            .steps
            .into_iter()
            .map(|step| {
                let state = StepState {
                    step_index: step.step_index,
                    step_title: step.title,
                    step_message: step.message,
                    unlock_type: step.challenge.unlock_type(),
                    step_value: step.value,
                    completed: false,
                    completed_at: None,
                };
                (state, step.challenge)
            })
            .unzip();
        let state = ChainState {
            chain_id,
            chain_title: request.title,
            chain_description: request.description,
            recipient: request.recipient,
            total_value: request.total_value,
            current_step: 0,
            completed: false,
            expires_at: calculate_expiry_date(request.expiry_days),
            completed_at: None,
            steps,
        };

        info!(
            "Chain {} created: {} steps, total {} expires={}",
            chain_id,
            state.total_steps(),
            state.total_value,
            state.expires_at.to_rfc3339()
        );

        self.chains.write().await.insert(
            chain_id,
            StoredChain { state, challenges, attempts: Vec::new() },
        );
        Ok(chain_id)
    }

    async fn claim_step(
        &self,
        chain_id: ChainId,
        step_index: usize,
        payload: UnlockPayload,
    ) -> Result<(), EscrowRejection> {
        let mut chains = self.chains.write().await;
        let chain = chains.get_mut(&chain_id).ok_or(EscrowRejection::ChainNotFound(chain_id))?;
        if step_index >= chain.state.total_steps() {
            return Err(EscrowRejection::StepNotFound(step_index));
        }

        let outcome = check_step(chain, step_index, &payload);
        let now = Utc::now();
        chain.attempts.push(ClaimAttempt {
            step_index,
            success: outcome.is_ok(),
            error: outcome.as_ref().err().map(ToString::to_string),
            attempted_at: now,
        });
        outcome?;

        let step = &mut chain.state.steps[step_index];
        step.completed = true;
        step.completed_at = Some(now);
        chain.state.current_step = step_index + 1;
        if chain.state.current_step == chain.state.total_steps() {
            chain.state.completed = true;
            chain.state.completed_at = Some(now);
            info!("Chain {} completed by {}", chain_id, chain.state.recipient);
        } else {
            debug!("Chain {} step {} released", chain_id, step_index);
        }
        Ok(())
    }

    async fn chain_state(&self, chain_id: ChainId) -> Result<ChainState, EscrowRejection> {
        self.chains
            .read()
            .await
            .get(&chain_id)
            .map(|c| c.state.clone())
            .ok_or(EscrowRejection::ChainNotFound(chain_id))
    }
}
