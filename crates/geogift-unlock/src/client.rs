use std::sync::Arc;

use chrono::{DateTime, Utc};
use geogift_types::events::GiftEvent;
use geogift_types::models::{ChainId, ChainState, ClaimHash, GiftId, GiftState};
use geogift_types::unlock::{ClaimInput, PreflightError, UnlockType};
use thiserror::Error;
use tracing::warn;

use crate::dispatcher::{prepare_unlock_data, verify_unlock};
use crate::escrow::{CreateChain, CreateGift, EscrowContract, EscrowRejection};
use crate::expiry::{calculate_expiry_date, is_gift_expired};
use crate::logging::{ClaimLogger, TracingLogger};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClaimError {
    /// Caught locally; no transaction was sent
    #[error(transparent)]
    Preflight(#[from] PreflightError),
    #[error("Gift already claimed")]
    AlreadyClaimed,
    #[error("Gift has expired")]
    Expired,
    #[error("Step {0} does not exist")]
    UnknownStep(usize),
    #[error("Step {0} already claimed")]
    StepAlreadyClaimed(usize),
    #[error("Step {got} is locked; step {expected} must be claimed first")]
    StepLocked { expected: usize, got: usize },
    /// The contract's answer, passed through unchanged
    #[error(transparent)]
    Rejected(EscrowRejection),
}

/// What the caller gets back once the contract has accepted a gift.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GiftReceipt {
    pub gift_id: GiftId,
    pub clue_hash: ClaimHash,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainReceipt {
    pub chain_id: ChainId,
    pub expires_at: DateTime<Utc>,
}

/// Drives gift creation and claims against an escrow contract.
///
/// Claims run the local pre-flight checks first so obviously bad attempts
/// never cost a transaction, then defer to the contract. Nothing is retried.
pub struct GiftClient<E> {
    escrow: E,
    logger: Arc<dyn ClaimLogger>,
}

impl<E: EscrowContract> GiftClient<E> {
    pub fn new(escrow: E) -> Self {
        Self { escrow, logger: Arc::new(TracingLogger) }
    }

    pub fn with_logger(mut self, logger: Arc<dyn ClaimLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn escrow(&self) -> &E {
        &self.escrow
    }

    /// Once `create_gift` succeeds the gift exists and its id is returned.
    /// The follow-up state read only refines `expires_at`; if it fails the
    /// locally computed expiry is reported instead.
    pub async fn create(&self, request: CreateGift) -> Result<GiftReceipt, EscrowRejection> {
        let unlock_type = request.challenge.unlock_type();
        let clue_hash = request.challenge.clue_hash();
        let expiry_days = request.expiry_days;

        let gift_id = self.escrow.create_gift(request).await?;
        let expires_at = match self.escrow.gift_state(gift_id).await {
            Ok(state) => state.expires_at,
            Err(e) => {
                warn!("Gift {} created but its state could not be read: {}", gift_id, e);
                calculate_expiry_date(expiry_days)
            }
        };

        self.logger.log(&GiftEvent::Created { gift_id, unlock_type, clue_hash, expires_at });
        Ok(GiftReceipt { gift_id, clue_hash, expires_at })
    }

    pub async fn state(&self, gift_id: GiftId) -> Result<GiftState, EscrowRejection> {
        self.escrow.gift_state(gift_id).await
    }

    pub async fn claim(&self, gift_id: GiftId, input: &ClaimInput) -> Result<(), ClaimError> {
        let state = self.escrow.gift_state(gift_id).await.map_err(ClaimError::Rejected)?;
        let unlock_type = state.unlock_type;

        let preflight = if state.claimed {
            Err(ClaimError::AlreadyClaimed)
        } else if is_gift_expired(state.expires_at) {
            Err(ClaimError::Expired)
        } else {
            verify_unlock(unlock_type, input).map_err(ClaimError::from)
        };
        if let Err(e) = preflight {
            self.logger.log(&GiftEvent::PreflightFailed {
                gift_id,
                unlock_type,
                reason: e.to_string(),
            });
            return Err(e);
        }

        let payload = prepare_unlock_data(unlock_type, input);
        self.logger.log(&GiftEvent::ClaimSubmitted {
            gift_id,
            unlock_type,
            has_secret: payload.unlock_bytes.is_some(),
        });

        match self.escrow.claim_gift(gift_id, payload).await {
            Ok(()) => {
                self.logger.log(&GiftEvent::Claimed { gift_id });
                Ok(())
            }
            Err(rejection) => {
                self.logger.log(&GiftEvent::ClaimRejected {
                    gift_id,
                    reason: rejection.to_string(),
                });
                Err(ClaimError::Rejected(rejection))
            }
        }
    }

    /// Same contract as [`create`](Self::create): a chain the escrow accepted
    /// is never reported as a failure.
    pub async fn create_chain(&self, request: CreateChain) -> Result<ChainReceipt, EscrowRejection> {
        let expiry_days = request.expiry_days;
        let total_steps = request.steps.len();

        let chain_id = self.escrow.create_chain(request).await?;
        let expires_at = match self.escrow.chain_state(chain_id).await {
            Ok(state) => state.expires_at,
            Err(e) => {
                warn!("Chain {} created but its state could not be read: {}", chain_id, e);
                calculate_expiry_date(expiry_days)
            }
        };

        self.logger.log(&GiftEvent::ChainCreated { chain_id, total_steps, expires_at });
        Ok(ChainReceipt { chain_id, expires_at })
    }

    pub async fn chain_state(&self, chain_id: ChainId) -> Result<ChainState, EscrowRejection> {
        self.escrow.chain_state(chain_id).await
    }

    /// Claim one step of a chain. Steps unlock strictly in order.
    pub async fn claim_step(
        &self,
        chain_id: ChainId,
        step_index: usize,
        input: &ClaimInput,
    ) -> Result<(), ClaimError> {
        let state = self.escrow.chain_state(chain_id).await.map_err(ClaimError::Rejected)?;

        let preflight: Result<UnlockType, ClaimError> = match state.steps.get(step_index) {
            None => Err(ClaimError::UnknownStep(step_index)),
            Some(step) if step.completed => Err(ClaimError::StepAlreadyClaimed(step_index)),
            Some(_) if is_gift_expired(state.expires_at) => Err(ClaimError::Expired),
            Some(_) if step_index != state.current_step => Err(ClaimError::StepLocked {
                expected: state.current_step,
                got: step_index,
            }),
            Some(step) => verify_unlock(step.unlock_type, input)
                .map(|()| step.unlock_type)
                .map_err(ClaimError::from),
        };
        let unlock_type = match preflight {
            Ok(unlock_type) => unlock_type,
            Err(e) => {
                self.logger.log(&GiftEvent::StepPreflightFailed {
                    chain_id,
                    step_index,
                    reason: e.to_string(),
                });
                return Err(e);
            }
        };

        let payload = prepare_unlock_data(unlock_type, input);
        self.logger.log(&GiftEvent::StepSubmitted {
            chain_id,
            step_index,
            unlock_type,
            has_secret: payload.unlock_bytes.is_some(),
        });

        match self.escrow.claim_step(chain_id, step_index, payload).await {
            Ok(()) => {
                self.logger.log(&GiftEvent::StepClaimed { chain_id, step_index });
                Ok(())
            }
            Err(rejection) => {
                self.logger.log(&GiftEvent::StepRejected {
                    chain_id,
                    step_index,
                    reason: rejection.to_string(),
                });
                Err(ClaimError::Rejected(rejection))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use geogift_types::models::GeoPoint;
    use geogift_types::unlock::{ClueData, UnlockType};

    use geogift_types::unlock::UnlockPayload;

    use super::*;
    use crate::dispatcher::UnlockChallenge;
    use crate::escrow::ChainStep;
    use crate::logging::NullLogger;
    use crate::memory::MemoryEscrow;

    #[derive(Default)]
    struct RecordingLogger {
        events: Mutex<Vec<GiftEvent>>,
    }

    impl ClaimLogger for RecordingLogger {
        fn log(&self, event: &GiftEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    fn request(challenge: UnlockChallenge) -> CreateGift {
        CreateGift {
            recipient: "0x2222222222222222222222222222222222222222".into(),
            amount: "500".into(),
            expiry_days: 30,
            message: String::new(),
            challenge,
        }
    }

    #[tokio::test]
    async fn preflight_failure_skips_the_contract() {
        let logger = Arc::new(RecordingLogger::default());
        let client = GiftClient::new(MemoryEscrow::new()).with_logger(logger.clone());
        let target = GeoPoint::new(1.0, 2.0).unwrap();
        let challenge =
            UnlockChallenge::new(UnlockType::Gps, &ClueData::default(), Some((target, 100))).unwrap();
        let id = client.create(request(challenge)).await.unwrap().gift_id;

        let err = client.claim(id, &ClaimInput::default()).await.unwrap_err();
        assert_eq!(err, ClaimError::Preflight(PreflightError::LocationRequired));
        assert!(!client.state(id).await.unwrap().claimed);

        let events = logger.events.lock().unwrap();
        assert!(matches!(events[0], GiftEvent::Created { .. }));
        assert!(matches!(events[1], GiftEvent::PreflightFailed { .. }));
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn contract_rejection_passes_through() {
        let client = GiftClient::new(MemoryEscrow::new()).with_logger(Arc::new(NullLogger));
        let target = GeoPoint::new(1.0, 2.0).unwrap();
        let challenge =
            UnlockChallenge::new(UnlockType::Gps, &ClueData::default(), Some((target, 100))).unwrap();
        let id = client.create(request(challenge)).await.unwrap().gift_id;

        let err = client.claim(id, &ClaimInput::location(1.5, 2.0)).await.unwrap_err();
        let ClaimError::Rejected(EscrowRejection::TooFar { radius_m, .. }) = err else {
            panic!("expected TooFar, got {:?}", err);
        };
        assert_eq!(radius_m, 100);
        assert!(err.to_string().starts_with("Too far from gift location"));
    }

    #[tokio::test]
    async fn claimed_gift_is_refused_locally() {
        let logger = Arc::new(RecordingLogger::default());
        let client = GiftClient::new(MemoryEscrow::new()).with_logger(logger.clone());
        let challenge =
            UnlockChallenge::new(UnlockType::Markdown, &ClueData::content("hi"), None).unwrap();
        let id = client.create(request(challenge)).await.unwrap().gift_id;

        client.claim(id, &ClaimInput::default()).await.unwrap();
        assert_eq!(
            client.claim(id, &ClaimInput::default()).await,
            Err(ClaimError::AlreadyClaimed)
        );
        let events = logger.events.lock().unwrap();
        assert!(matches!(events[2], GiftEvent::Claimed { .. }));
    }

    #[tokio::test]
    async fn unknown_gift_is_a_rejection() {
        let client = GiftClient::new(MemoryEscrow::new()).with_logger(Arc::new(NullLogger));
        assert_eq!(
            client.claim(GiftId(9), &ClaimInput::default()).await,
            Err(ClaimError::Rejected(EscrowRejection::GiftNotFound(GiftId(9))))
        );
    }

    /// Accepts writes but every state read times out.
    struct UnreadableState(MemoryEscrow);

    impl EscrowContract for UnreadableState {
        async fn create_gift(&self, request: CreateGift) -> Result<GiftId, EscrowRejection> {
            self.0.create_gift(request).await
        }

        async fn claim_gift(&self, gift_id: GiftId, payload: UnlockPayload) -> Result<(), EscrowRejection> {
            self.0.claim_gift(gift_id, payload).await
        }

        async fn gift_state(&self, _gift_id: GiftId) -> Result<GiftState, EscrowRejection> {
            Err(EscrowRejection::Other("rpc timeout".into()))
        }

        async fn create_chain(&self, request: CreateChain) -> Result<ChainId, EscrowRejection> {
            self.0.create_chain(request).await
        }

        async fn claim_step(
            &self,
            chain_id: ChainId,
            step_index: usize,
            payload: UnlockPayload,
        ) -> Result<(), EscrowRejection> {
            self.0.claim_step(chain_id, step_index, payload).await
        }

        async fn chain_state(&self, _chain_id: ChainId) -> Result<ChainState, EscrowRejection> {
            Err(EscrowRejection::Other("rpc timeout".into()))
        }
    }

    fn chain_request() -> CreateChain {
        let quiz =
            UnlockChallenge::new(UnlockType::Quiz, &ClueData::quiz("Capital of France?", "paris"), None)
                .unwrap();
        let password =
            UnlockChallenge::new(UnlockType::Password, &ClueData::password("oak"), None).unwrap();
        CreateChain {
            title: "City hunt".into(),
            description: Some("Two stops".into()),
            recipient: "0x2222222222222222222222222222222222222222".into(),
            total_value: "20".into(),
            expiry_days: 10,
            steps: [quiz, password]
                .into_iter()
                .enumerate()
                .map(|(step_index, challenge)| ChainStep {
                    step_index,
                    title: format!("Stop {}", step_index + 1),
                    message: String::new(),
                    value: "10".into(),
                    challenge,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn created_gift_survives_a_failed_state_read() {
        let client =
            GiftClient::new(UnreadableState(MemoryEscrow::new())).with_logger(Arc::new(NullLogger));
        let challenge =
            UnlockChallenge::new(UnlockType::Markdown, &ClueData::content("hi"), None).unwrap();
        let before = Utc::now();

        let receipt = client.create(request(challenge)).await.unwrap();
        assert_eq!(receipt.gift_id, GiftId(1));
        assert_eq!(client.escrow().0.len().await, 1);
        assert!(receipt.expires_at > before + chrono::TimeDelta::days(29));

        let chain = client.create_chain(chain_request()).await.unwrap();
        assert_eq!(chain.chain_id, ChainId(1));
        assert!(chain.expires_at > before + chrono::TimeDelta::days(9));
    }

    #[tokio::test]
    async fn chain_steps_are_prechecked_in_order() {
        let logger = Arc::new(RecordingLogger::default());
        let client = GiftClient::new(MemoryEscrow::new()).with_logger(logger.clone());
        let id = client.create_chain(chain_request()).await.unwrap().chain_id;

        assert_eq!(
            client.claim_step(id, 1, &ClaimInput::password("oak")).await,
            Err(ClaimError::StepLocked { expected: 0, got: 1 })
        );
        assert_eq!(
            client.claim_step(id, 0, &ClaimInput::default()).await,
            Err(ClaimError::Preflight(PreflightError::AnswerRequired))
        );
        assert_eq!(
            client.claim_step(id, 0, &ClaimInput::answer("rome")).await,
            Err(ClaimError::Rejected(EscrowRejection::WrongSecret))
        );
        client.claim_step(id, 0, &ClaimInput::answer("paris")).await.unwrap();
        assert_eq!(
            client.claim_step(id, 0, &ClaimInput::answer("paris")).await,
            Err(ClaimError::StepAlreadyClaimed(0))
        );
        assert_eq!(
            client.claim_step(id, 5, &ClaimInput::default()).await,
            Err(ClaimError::UnknownStep(5))
        );
        client.claim_step(id, 1, &ClaimInput::password("oak")).await.unwrap();
        assert!(client.chain_state(id).await.unwrap().completed);

        // Refusals caught locally never reach the escrow's ledger.
        assert_eq!(client.escrow().chain_attempts(id).await.unwrap().len(), 3);

        let events = logger.events.lock().unwrap();
        assert!(matches!(events[0], GiftEvent::ChainCreated { total_steps: 2, .. }));
        assert!(matches!(events[1], GiftEvent::StepPreflightFailed { step_index: 1, .. }));
        assert!(events.iter().any(|e| matches!(e, GiftEvent::StepRejected { step_index: 0, .. })));
    }
}
