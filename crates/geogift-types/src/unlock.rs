use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::models::ClaimHash;

/// Gating mechanism a gift (or chain step) requires before release.
///
/// The discriminant is the code the escrow contract stores on-chain.
///
/// Serializes as its lowercase tag. Deserialization goes through `FromStr`,
/// so it accepts any casing and surrounding whitespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum UnlockType {
    Gps = 0,
    Video = 1,
    Image = 2,
    Markdown = 3,
    Quiz = 4,
    Password = 5,
    Url = 6,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown unlock type: {0}")]
pub struct UnknownUnlockType(pub String);

impl UnlockType {
    pub const ALL: [UnlockType; 7] = [
        Self::Gps,
        Self::Video,
        Self::Image,
        Self::Markdown,
        Self::Quiz,
        Self::Password,
        Self::Url,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Result<Self, UnknownUnlockType> {
        Self::ALL
            .into_iter()
            .find(|t| t.code() == code)
            .ok_or_else(|| UnknownUnlockType(code.to_string()))
    }

    pub fn tag(self) -> &'static str {
        match self {
            Self::Gps => "gps",
            Self::Video => "video",
            Self::Image => "image",
            Self::Markdown => "markdown",
            Self::Quiz => "quiz",
            Self::Password => "password",
            Self::Url => "url",
        }
    }

    /// Types whose only claim requirement is having viewed the content.
    pub fn is_view_only(self) -> bool {
        matches!(self, Self::Video | Self::Image | Self::Markdown | Self::Url)
    }
}

impl fmt::Display for UnlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for UnlockType {
    type Err = UnknownUnlockType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.tag() == tag)
            .ok_or_else(|| UnknownUnlockType(s.to_string()))
    }
}

impl<'de> Deserialize<'de> for UnlockType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        tag.parse().map_err(serde::de::Error::custom)
    }
}

impl TryFrom<u8> for UnlockType {
    type Error = UnknownUnlockType;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code)
    }
}

/// Creator-supplied data consumed when building a clue commitment.
///
/// Which fields matter depends on the unlock type:
/// - password: `password` (and an optional `hint` shown to the recipient)
/// - quiz: `question`, `answer`
/// - markdown: `content`
/// - video / image / url: `url`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClueData {
    pub password: Option<String>,
    pub hint: Option<String>,
    pub question: Option<String>,
    pub answer: Option<String>,
    pub content: Option<String>,
    pub url: Option<String>,
}

impl ClueData {
    pub fn password(password: impl Into<String>) -> Self {
        Self { password: Some(password.into()), ..Self::default() }
    }

    pub fn quiz(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: Some(question.into()),
            answer: Some(answer.into()),
            ..Self::default()
        }
    }

    pub fn content(content: impl Into<String>) -> Self {
        Self { content: Some(content.into()), ..Self::default() }
    }

    pub fn url(url: impl Into<String>) -> Self {
        Self { url: Some(url.into()), ..Self::default() }
    }
}

/// What a recipient submits when attempting a claim. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimInput {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub password: Option<String>,
    pub answer: Option<String>,
}

impl ClaimInput {
    pub fn location(lat: f64, lng: f64) -> Self {
        Self { lat: Some(lat), lng: Some(lng), ..Self::default() }
    }

    pub fn password(password: impl Into<String>) -> Self {
        Self { password: Some(password.into()), ..Self::default() }
    }

    pub fn answer(answer: impl Into<String>) -> Self {
        Self { answer: Some(answer.into()), ..Self::default() }
    }
}

/// Verification payload handed to the escrow contract's claim call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnlockPayload {
    pub lat: f64,
    pub lng: f64,
    /// Revealed-secret hash for password/quiz, absent for every other type.
    pub unlock_bytes: Option<ClaimHash>,
}

impl UnlockPayload {
    pub const EMPTY: UnlockPayload = UnlockPayload { lat: 0.0, lng: 0.0, unlock_bytes: None };

    /// Raw bytes as the contract receives them (`0x` when empty).
    pub fn unlock_bytes(&self) -> &[u8] {
        match &self.unlock_bytes {
            Some(hash) => hash.as_bytes(),
            None => &[],
        }
    }
}

/// Reasons the local pre-flight check refuses to submit a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PreflightError {
    #[error("Location required")]
    LocationRequired,
    #[error("Password required")]
    PasswordRequired,
    #[error("Answer required")]
    AnswerRequired,
    #[error("Unknown unlock type")]
    UnknownUnlockType,
}

/// Wire form of a pre-flight check result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Result<(), PreflightError>> for VerifyResult {
    fn from(result: Result<(), PreflightError>) -> Self {
        match result {
            Ok(()) => Self { valid: true, error: None },
            Err(e) => Self { valid: false, error: Some(e.to_string()) },
        }
    }
}
