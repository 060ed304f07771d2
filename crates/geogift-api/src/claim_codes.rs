use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::debug;

use geogift_crypto::claim_code::{clean_claim_code_input, generate_claim_hash, is_valid_claim_code};
use geogift_types::api::{ClaimCodeResponse, ValidateClaimCodeRequest, ValidateClaimCodeResponse};

use crate::{ApiJson, AppState};

/// POST /claim-codes: mint a code and its commitment for a new-user gift.
pub async fn generate(State(state): State<AppState>) -> impl IntoResponse {
    let code = state.generator.generate(&mut rand::rng());
    let hash = code.hash();
    debug!("Generated claim code with commitment {}", hash);

    (
        StatusCode::CREATED,
        Json(ClaimCodeResponse {
            display: code.display(),
            code: code.into_string(),
            hash,
        }),
    )
}

/// POST /claim-codes/validate: normalize typed input and report what's left.
pub async fn validate(
    ApiJson(req): ApiJson<ValidateClaimCodeRequest>,
) -> Json<ValidateClaimCodeResponse> {
    let cleaned = clean_claim_code_input(&req.input);
    let valid = is_valid_claim_code(&cleaned);
    let hash = valid.then(|| generate_claim_hash(&cleaned));

    Json(ValidateClaimCodeResponse { cleaned, valid, hash })
}
