use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use tracing::{info, warn};

use geogift_types::api::{ClaimGiftResponse, CreateGiftRequest, CreateGiftResponse};
use geogift_types::models::{GiftId, GiftState};
use geogift_types::unlock::{ClaimInput, UnlockType};
use geogift_unlock::expiry::format_time_remaining;
use geogift_unlock::{CreateGift, EscrowRejection, PublicChallenge, UnlockChallenge};

use crate::{ApiError, ApiJson, AppState};

const DEFAULT_RADIUS_M: u32 = 50;

#[derive(Debug, Serialize)]
pub struct GiftResponse {
    #[serde(flatten)]
    pub state: GiftState,
    pub time_remaining: String,
    pub message: String,
    pub challenge: PublicChallenge,
}

/// POST /gifts: commit a gift to the escrow.
pub async fn create(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateGiftRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let location = match req.unlock_type {
        UnlockType::Gps => {
            let target = req
                .target
                .ok_or_else(|| ApiError::bad_request("GPS unlock requires a target location"))?;
            let radius = state
                .radius_limits
                .check(req.radius_meters.unwrap_or(DEFAULT_RADIUS_M))
                .map_err(ApiError::bad_request)?;
            Some((target, radius))
        }
        _ => None,
    };

    let challenge =
        UnlockChallenge::new(req.unlock_type, &req.data, location).map_err(ApiError::bad_request)?;

    let receipt = state
        .gifts
        .create(CreateGift {
            recipient: req.recipient,
            amount: req.amount,
            expiry_days: req.expiry_days,
            message: req.message,
            challenge,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateGiftResponse {
            gift_id: receipt.gift_id,
            clue_hash: receipt.clue_hash,
            expires_at: receipt.expires_at,
        }),
    ))
}

/// GET /gifts/{gift_id}: public view only. A GPS gift shows its radius,
/// never its target.
pub async fn get_gift(
    State(state): State<AppState>,
    Path(gift_id): Path<u64>,
) -> Result<Json<GiftResponse>, ApiError> {
    let gift_id = GiftId(gift_id);
    let gift = state.gifts.state(gift_id).await?;
    let (challenge, message) = state
        .gifts
        .escrow()
        .challenge(gift_id)
        .await
        .ok_or(EscrowRejection::GiftNotFound(gift_id))?;

    Ok(Json(GiftResponse {
        time_remaining: format_time_remaining(gift.expires_at),
        state: gift,
        message,
        challenge: challenge.reference().public(),
    }))
}

/// POST /gifts/{gift_id}/claim: pre-flight locally, then let the escrow decide.
pub async fn claim(
    State(state): State<AppState>,
    Path(gift_id): Path<u64>,
    ApiJson(input): ApiJson<ClaimInput>,
) -> Result<Json<ClaimGiftResponse>, ApiError> {
    let gift_id = GiftId(gift_id);

    match state.gifts.claim(gift_id, &input).await {
        Ok(()) => {
            info!("Gift {} claimed", gift_id);
            Ok(Json(ClaimGiftResponse { gift_id, claimed: true }))
        }
        Err(e) => {
            warn!("Claim on gift {} refused: {}", gift_id, e);
            Err(e.into())
        }
    }
}
