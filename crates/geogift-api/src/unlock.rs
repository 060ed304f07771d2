use axum::Json;

use geogift_types::api::{ClueHashRequest, ClueHashResponse, UnlockRequest};
use geogift_types::unlock::{UnlockPayload, VerifyResult};
use geogift_unlock::{create_clue_hash_for_tag, prepare_unlock_data_for_tag, verify_unlock_for_tag};

use crate::ApiJson;

// Tags arrive as raw strings; unknown ones take the dispatcher's degraded
// path rather than failing deserialization.

/// POST /unlock/clue-hash
pub async fn clue_hash(ApiJson(req): ApiJson<ClueHashRequest>) -> Json<ClueHashResponse> {
    Json(ClueHashResponse {
        clue_hash: create_clue_hash_for_tag(&req.unlock_type, &req.data),
    })
}

/// POST /unlock/prepare
pub async fn prepare(ApiJson(req): ApiJson<UnlockRequest>) -> Json<UnlockPayload> {
    Json(prepare_unlock_data_for_tag(&req.unlock_type, &req.input))
}

/// POST /unlock/verify: advisory only, the contract has the final say.
pub async fn verify(ApiJson(req): ApiJson<UnlockRequest>) -> Json<VerifyResult> {
    Json(verify_unlock_for_tag(&req.unlock_type, &req.input).into())
}
