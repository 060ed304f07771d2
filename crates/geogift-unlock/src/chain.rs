//! Multi-step gift chains: a treasure hunt where each step has its own
//! unlock mechanism and reward.

use geogift_types::models::{ClaimHash, GeoPoint};
use geogift_types::unlock::{ClueData, UnlockType};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dispatcher::{ChallengeError, UnlockChallenge, create_clue_hash};
use crate::escrow::{ChainStep, CreateChain};

pub const MIN_STEPS: usize = 2;
pub const MAX_STEPS: usize = 10;
pub const MAX_EXPIRY_DAYS: i64 = 365;
pub const MAX_STEP_RADIUS_M: u32 = 10_000;
pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_TEXT_LEN: usize = 1000;

fn default_radius() -> u32 {
    50
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDraft {
    pub step_index: usize,
    pub step_title: String,
    #[serde(default)]
    pub step_message: String,
    pub unlock_type: UnlockType,
    #[serde(default)]
    pub unlock_data: ClueData,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default = "default_radius")]
    pub radius: u32,
    /// Token amount released by this step, as a decimal string.
    pub step_value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainDraft {
    pub chain_title: String,
    #[serde(default)]
    pub chain_description: Option<String>,
    pub recipient_address: String,
    #[serde(default)]
    pub recipient_email: Option<String>,
    pub total_value: String,
    pub expiry_days: i64,
    pub steps: Vec<StepDraft>,
}

/// What gets committed on-chain for one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepCommitment {
    pub step_index: usize,
    pub unlock_type: UnlockType,
    pub clue_hash: ClaimHash,
    /// GPS target, stored by the contract next to the clue hash.
    pub target: Option<GeoPoint>,
    pub radius: Option<u32>,
    pub step_value: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum ChainError {
    #[error("Chain must have between 2 and 10 steps, got {0}")]
    StepCount(usize),
    #[error("Step {position} has incorrect step_index {found}")]
    StepIndex { position: usize, found: usize },
    #[error("Expiry must be between 1 and 365 days, got {0}")]
    ExpiryDays(i64),
    #[error("Invalid recipient address {0:?}")]
    Recipient(String),
    #[error("Chain title must be 1 to 200 characters")]
    Title,
    #[error("Chain description exceeds 1000 characters")]
    Description,
    #[error("Invalid token amount {0:?}")]
    Value(String),
    #[error("Step {0}: title must be 1 to 200 characters")]
    StepTitle(usize),
    #[error("Step {0}: message exceeds 1000 characters")]
    StepMessage(usize),
    #[error("Step {0}: GPS unlock type requires latitude and longitude")]
    MissingLocation(usize),
    #[error("Step {step}: {source}")]
    Location {
        step: usize,
        source: geogift_types::models::GeoError,
    },
    #[error("Step {step}: radius {radius} m outside 1..=10000 m")]
    Radius { step: usize, radius: u32 },
    #[error("Step {0}: password unlock type requires password in unlock_data")]
    MissingPassword(usize),
    #[error("Step {0}: quiz unlock type requires question and answer in unlock_data")]
    MissingQuiz(usize),
    #[error("Step {step}: {source}")]
    Challenge { step: usize, source: ChallengeError },
}

fn filled(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.trim().is_empty())
}

/// `0x` followed by 40 hex digits. Checksum casing is not verified.
pub fn is_address(s: &str) -> bool {
    s.len() == 42
        && (s.starts_with("0x") || s.starts_with("0X"))
        && s[2..].bytes().all(|b| b.is_ascii_hexdigit())
}

/// Unsigned decimal such as `10` or `2.5`.
pub(crate) fn is_amount(s: &str) -> bool {
    let mut parts = s.splitn(2, '.');
    let whole = parts.next().unwrap_or("");
    let frac = parts.next();
    !whole.is_empty()
        && whole.bytes().all(|b| b.is_ascii_digit())
        && frac.is_none_or(|f| !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()))
}

impl StepDraft {
    fn validate(&self, position: usize) -> Result<(), ChainError> {
        if self.step_index != position {
            return Err(ChainError::StepIndex { position, found: self.step_index });
        }
        let title_len = self.step_title.chars().count();
        if title_len == 0 || title_len > MAX_TITLE_LEN {
            return Err(ChainError::StepTitle(position));
        }
        if self.step_message.chars().count() > MAX_TEXT_LEN {
            return Err(ChainError::StepMessage(position));
        }
        if !is_amount(&self.step_value) {
            return Err(ChainError::Value(self.step_value.clone()));
        }

        match self.unlock_type {
            UnlockType::Gps => {
                self.target(position)?;
                if self.radius == 0 || self.radius > MAX_STEP_RADIUS_M {
                    return Err(ChainError::Radius { step: position, radius: self.radius });
                }
            }
            UnlockType::Password => {
                if !filled(&self.unlock_data.password) {
                    return Err(ChainError::MissingPassword(position));
                }
            }
            UnlockType::Quiz => {
                if !filled(&self.unlock_data.question) || !filled(&self.unlock_data.answer) {
                    return Err(ChainError::MissingQuiz(position));
                }
            }
            UnlockType::Markdown | UnlockType::Video | UnlockType::Image | UnlockType::Url => {}
        }
        Ok(())
    }

    fn target(&self, position: usize) -> Result<GeoPoint, ChainError> {
        let (Some(latitude), Some(longitude)) = (self.latitude, self.longitude) else {
            return Err(ChainError::MissingLocation(position));
        };
        GeoPoint::new(latitude, longitude)
            .map_err(|source| ChainError::Location { step: position, source })
    }
}

impl ChainDraft {
    pub fn validate(&self) -> Result<(), ChainError> {
        let title_len = self.chain_title.chars().count();
        if title_len == 0 || title_len > MAX_TITLE_LEN {
            return Err(ChainError::Title);
        }
        if self
            .chain_description
            .as_ref()
            .is_some_and(|d| d.chars().count() > MAX_TEXT_LEN)
        {
            return Err(ChainError::Description);
        }
        if !is_address(&self.recipient_address) {
            return Err(ChainError::Recipient(self.recipient_address.clone()));
        }
        if !is_amount(&self.total_value) {
            return Err(ChainError::Value(self.total_value.clone()));
        }
        if !(1..=MAX_EXPIRY_DAYS).contains(&self.expiry_days) {
            return Err(ChainError::ExpiryDays(self.expiry_days));
        }
        if !(MIN_STEPS..=MAX_STEPS).contains(&self.steps.len()) {
            return Err(ChainError::StepCount(self.steps.len()));
        }
        for (position, step) in self.steps.iter().enumerate() {
            step.validate(position)?;
        }
        Ok(())
    }

    /// Validate, then compute each step's on-chain commitment.
    pub fn commitments(&self) -> Result<Vec<StepCommitment>, ChainError> {
        self.validate()?;
        self.steps
            .iter()
            .enumerate()
            .map(|(position, step)| {
                let (target, radius) = match step.unlock_type {
                    UnlockType::Gps => (Some(step.target(position)?), Some(step.radius)),
                    _ => (None, None),
                };
                Ok(StepCommitment {
                    step_index: step.step_index,
                    unlock_type: step.unlock_type,
                    clue_hash: create_clue_hash(step.unlock_type, &step.unlock_data),
                    target,
                    radius,
                    step_value: step.step_value.clone(),
                })
            })
            .collect()
    }

    /// Validate, then bind every step to its unlock challenge, ready for the
    /// escrow's chain-creation call.
    pub fn into_request(self) -> Result<CreateChain, ChainError> {
        self.validate()?;
        let steps = self
            .steps
            .into_iter()
            .enumerate()
            .map(|(position, step)| {
                let location = match step.unlock_type {
                    UnlockType::Gps => Some((step.target(position)?, step.radius)),
                    _ => None,
                };
                let challenge = UnlockChallenge::new(step.unlock_type, &step.unlock_data, location)
                    .map_err(|source| ChainError::Challenge { step: position, source })?;
                Ok(ChainStep {
                    step_index: step.step_index,
                    title: step.step_title,
                    message: step.step_message,
                    value: step.step_value,
                    challenge,
                })
            })
            .collect::<Result<Vec<_>, ChainError>>()?;

        Ok(CreateChain {
            title: self.chain_title,
            description: self.chain_description,
            recipient: self.recipient_address,
            total_value: self.total_value,
            expiry_days: self.expiry_days,
            steps,
        })
    }
}
