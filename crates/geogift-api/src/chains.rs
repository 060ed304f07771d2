use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use geogift_types::api::ClaimStepResponse;
use geogift_types::models::{ChainId, ChainState, ClaimAttempt};
use geogift_types::unlock::ClaimInput;
use geogift_unlock::PublicChallenge;
use geogift_unlock::chain::{ChainDraft, StepCommitment};
use geogift_unlock::expiry::format_time_remaining;

use crate::{ApiError, ApiJson, AppState};

#[derive(Debug, Serialize)]
pub struct CreateChainResponse {
    pub chain_id: ChainId,
    pub expires_at: DateTime<Utc>,
    pub commitments: Vec<StepCommitment>,
}

/// Chain state plus what the recipient may see of each step.
/// `challenges[i]` belongs to `steps[i]`.
#[derive(Debug, Serialize)]
pub struct ChainResponse {
    #[serde(flatten)]
    pub state: ChainState,
    pub time_remaining: String,
    pub challenges: Vec<PublicChallenge>,
    pub attempts: Vec<ClaimAttempt>,
}

/// POST /chains/validate: check a chain draft and return the per-step
/// commitments the giver's wallet should submit.
pub async fn validate(
    ApiJson(draft): ApiJson<ChainDraft>,
) -> Result<Json<Vec<StepCommitment>>, ApiError> {
    let commitments = draft.commitments().map_err(|e| {
        warn!("Rejected chain draft {:?}: {}", draft.chain_title, e);
        ApiError::bad_request(e)
    })?;

    info!(
        "Chain {:?} validated: {} steps, total {}",
        draft.chain_title,
        commitments.len(),
        draft.total_value
    );
    Ok(Json(commitments))
}

/// POST /chains
pub async fn create(
    State(state): State<AppState>,
    ApiJson(draft): ApiJson<ChainDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let commitments = draft.commitments().map_err(ApiError::bad_request)?;
    let request = draft.into_request().map_err(ApiError::bad_request)?;
    let receipt = state.gifts.create_chain(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateChainResponse {
            chain_id: receipt.chain_id,
            expires_at: receipt.expires_at,
            commitments,
        }),
    ))
}

/// GET /chains/{chain_id}: progress, public step challenges and the claim
/// history. GPS targets are not included.
pub async fn get_chain(
    State(state): State<AppState>,
    Path(chain_id): Path<u64>,
) -> Result<Json<ChainResponse>, ApiError> {
    let chain_id = ChainId(chain_id);
    let chain = state.gifts.chain_state(chain_id).await?;
    let escrow = state.gifts.escrow();
    let challenges = escrow.chain_challenges(chain_id).await.unwrap_or_default();
    let attempts = escrow.chain_attempts(chain_id).await.unwrap_or_default();

    Ok(Json(ChainResponse {
        time_remaining: format_time_remaining(chain.expires_at),
        state: chain,
        challenges: challenges.iter().map(|c| c.reference().public()).collect(),
        attempts,
    }))
}

/// POST /chains/{chain_id}/steps/{step_index}/claim
pub async fn claim_step(
    State(state): State<AppState>,
    Path((chain_id, step_index)): Path<(u64, usize)>,
    ApiJson(input): ApiJson<ClaimInput>,
) -> Result<Json<ClaimStepResponse>, ApiError> {
    let chain_id = ChainId(chain_id);

    match state.gifts.claim_step(chain_id, step_index, &input).await {
        Ok(()) => {
            info!("Chain {} step {} claimed", chain_id, step_index);
            Ok(Json(ClaimStepResponse { chain_id, step_index, claimed: true }))
        }
        Err(e) => {
            warn!("Claim on chain {} step {} refused: {}", chain_id, step_index, e);
            Err(e.into())
        }
    }
}
