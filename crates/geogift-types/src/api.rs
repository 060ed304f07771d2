use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ChainId, ClaimHash, GeoPoint, GiftId};
use crate::unlock::{ClaimInput, ClueData, UnlockType};

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// -- Claim codes --

#[derive(Debug, Serialize, Deserialize)]
pub struct ClaimCodeResponse {
    pub code: String,
    pub hash: ClaimHash,
    pub display: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidateClaimCodeRequest {
    pub input: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateClaimCodeResponse {
    pub cleaned: String,
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<ClaimHash>,
}

// -- Unlock dispatch --

/// `unlock_type` stays a raw tag so unknown types reach the dispatcher's
/// degraded path instead of failing deserialization.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClueHashRequest {
    pub unlock_type: String,
    #[serde(default)]
    pub data: ClueData,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClueHashResponse {
    pub clue_hash: ClaimHash,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnlockRequest {
    pub unlock_type: String,
    #[serde(default)]
    pub input: ClaimInput,
}

// -- Location --

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DistanceRequest {
    pub point1: GeoPoint,
    pub point2: GeoPoint,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DistanceResponse {
    pub distance_meters: f64,
    pub distance_km: f64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocationValidationRequest {
    pub target: GeoPoint,
    pub user: GeoPoint,
    pub radius_meters: u32,
}

// -- Gifts --

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateGiftRequest {
    pub recipient: String,
    pub amount: String,
    pub expiry_days: i64,
    #[serde(default)]
    pub message: String,
    pub unlock_type: UnlockType,
    #[serde(default)]
    pub data: ClueData,
    #[serde(default)]
    pub target: Option<GeoPoint>,
    #[serde(default)]
    pub radius_meters: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateGiftResponse {
    pub gift_id: GiftId,
    pub clue_hash: ClaimHash,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClaimGiftResponse {
    pub gift_id: GiftId,
    pub claimed: bool,
}

// -- Chains --

#[derive(Debug, Serialize, Deserialize)]
pub struct ClaimStepResponse {
    pub chain_id: ChainId,
    pub step_index: usize,
    pub claimed: bool,
}
