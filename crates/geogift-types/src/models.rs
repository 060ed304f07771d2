use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::unlock::UnlockType;

// -- Commitments --

/// A 32-byte Keccak-256 digest. This is the only form in which claim codes,
/// passwords and quiz answers ever reach the escrow contract.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClaimHash(pub [u8; 32]);

impl ClaimHash {
    pub const LEN: usize = 32;

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// `0x`-prefixed lowercase hex, the form ethers/viem print.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for ClaimHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ClaimHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClaimHash({})", self.to_hex())
    }
}

#[derive(Debug, Error)]
pub enum ParseHashError {
    #[error("hash must be 0x-prefixed")]
    MissingPrefix,
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("hash must be 32 bytes, got {0}")]
    Length(usize),
}

impl FromStr for ClaimHash {
    type Err = ParseHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or(ParseHashError::MissingPrefix)?;
        let bytes = hex::decode(digits)?;
        let len = bytes.len();
        let digest: [u8; 32] = bytes.try_into().map_err(|_| ParseHashError::Length(len))?;
        Ok(Self(digest))
    }
}

impl Serialize for ClaimHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClaimHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// -- Locations --

#[derive(Debug, Error, PartialEq)]
pub enum GeoError {
    #[error("latitude {0} out of range [-90, 90]")]
    Latitude(f64),
    #[error("longitude {0} out of range [-180, 180]")]
    Longitude(f64),
}

/// A WGS-84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        let point = Self { latitude, longitude };
        point.validate()?;
        Ok(point)
    }

    /// Rejects out-of-range and non-finite coordinates. Deserialized points
    /// bypass `new`, so handlers call this explicitly.
    pub fn validate(&self) -> Result<(), GeoError> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(GeoError::Latitude(self.latitude));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(GeoError::Longitude(self.longitude));
        }
        Ok(())
    }
}

/// Result of an advisory distance check against a target radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationCheck {
    pub distance_meters: f64,
    pub radius_meters: u32,
    pub within_radius: bool,
}

// -- Gifts --

/// Identifier assigned by the escrow contract at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GiftId(pub u64);

impl fmt::Display for GiftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Read-side view of a gift as exposed by the escrow contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GiftState {
    pub gift_id: GiftId,
    pub recipient: String,
    /// Base units as a decimal string, to avoid precision loss.
    pub amount: String,
    pub unlock_type: UnlockType,
    pub claimed: bool,
    pub expires_at: DateTime<Utc>,
}

// -- Chains --

/// Identifier the escrow contract assigns to a multi-step chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub u64);

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepState {
    pub step_index: usize,
    pub step_title: String,
    pub step_message: String,
    pub unlock_type: UnlockType,
    pub step_value: String,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Read-side view of a chain. Steps unlock strictly in order; `current_step`
/// is the only index the contract will accept a claim for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainState {
    pub chain_id: ChainId,
    pub chain_title: String,
    pub chain_description: Option<String>,
    pub recipient: String,
    pub total_value: String,
    pub current_step: usize,
    pub completed: bool,
    pub expires_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub steps: Vec<StepState>,
}

impl ChainState {
    pub fn total_steps(&self) -> usize {
        self.steps.len()
    }
}

/// One claim submitted against a chain step, successful or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimAttempt {
    pub step_index: usize,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub attempted_at: DateTime<Utc>,
}
