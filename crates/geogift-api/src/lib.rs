pub mod chains;
pub mod claim_codes;
pub mod gifts;
pub mod location;
pub mod unlock;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tracing::debug;

use geogift_crypto::ClaimCodeGenerator;
use geogift_types::api::ErrorResponse;
use geogift_unlock::geo::RadiusLimits;
use geogift_unlock::{ClaimError, EscrowRejection, GiftClient, MemoryEscrow};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub generator: ClaimCodeGenerator,
    pub radius_limits: RadiusLimits,
    /// Dev escrow; a deployment would put a contract binding here.
    pub gifts: GiftClient<MemoryEscrow>,
}

impl AppStateInner {
    pub fn new(generator: ClaimCodeGenerator, radius_limits: RadiusLimits) -> Self {
        Self {
            generator,
            radius_limits,
            gifts: GiftClient::new(MemoryEscrow::new()),
        }
    }
}

/// Status code plus a message for the `{"error": ...}` body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl ToString) -> Self {
        Self { status, message: message.to_string() }
    }

    pub fn bad_request(message: impl ToString) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!("Rejected request body: {}", rejection.body_text());
        Self::bad_request(rejection.body_text())
    }
}

impl From<EscrowRejection> for ApiError {
    fn from(rejection: EscrowRejection) -> Self {
        let status = match rejection {
            EscrowRejection::GiftNotFound(_)
            | EscrowRejection::ChainNotFound(_)
            | EscrowRejection::StepNotFound(_) => StatusCode::NOT_FOUND,
            EscrowRejection::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::CONFLICT,
        };
        Self::new(status, rejection)
    }
}

impl From<ClaimError> for ApiError {
    fn from(error: ClaimError) -> Self {
        match error {
            ClaimError::Rejected(rejection) => rejection.into(),
            ClaimError::Preflight(_) => Self::bad_request(error),
            ClaimError::UnknownStep(_) => Self::new(StatusCode::NOT_FOUND, error),
            ClaimError::AlreadyClaimed
            | ClaimError::Expired
            | ClaimError::StepAlreadyClaimed(_)
            | ClaimError::StepLocked { .. } => Self::new(StatusCode::CONFLICT, error),
        }
    }
}

/// `Json` extractor whose failures come back as `400 {"error": ...}` like
/// every other validation error.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

pub async fn health() -> &'static str {
    "ok"
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/claim-codes", post(claim_codes::generate))
        .route("/claim-codes/validate", post(claim_codes::validate))
        .route("/unlock/clue-hash", post(unlock::clue_hash))
        .route("/unlock/prepare", post(unlock::prepare))
        .route("/unlock/verify", post(unlock::verify))
        .route("/location/distance", post(location::distance))
        .route("/location/validate", post(location::validate))
        .route("/chains", post(chains::create))
        .route("/chains/validate", post(chains::validate))
        .route("/chains/{chain_id}", get(chains::get_chain))
        .route("/chains/{chain_id}/steps/{step_index}/claim", post(chains::claim_step))
        .route("/gifts", post(gifts::create))
        .route("/gifts/{gift_id}", get(gifts::get_gift))
        .route("/gifts/{gift_id}/claim", post(gifts::claim));

    Router::new()
        .nest("/api/v1", api)
        .route("/health", get(health))
        .with_state(state)
}
