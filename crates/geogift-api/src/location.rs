use axum::{Json, extract::State};
use tracing::debug;

use geogift_types::api::{DistanceRequest, DistanceResponse, LocationValidationRequest};
use geogift_types::models::LocationCheck;
use geogift_unlock::geo::{haversine_distance_m, validate_location};

use crate::{ApiError, ApiJson, AppState};

/// POST /location/distance
pub async fn distance(
    ApiJson(req): ApiJson<DistanceRequest>,
) -> Result<Json<DistanceResponse>, ApiError> {
    req.point1.validate().map_err(ApiError::bad_request)?;
    req.point2.validate().map_err(ApiError::bad_request)?;

    let distance_meters = haversine_distance_m(&req.point1, &req.point2);
    Ok(Json(DistanceResponse {
        distance_meters,
        distance_km: distance_meters / 1000.0,
    }))
}

/// POST /location/validate: is the user inside the target radius?
pub async fn validate(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LocationValidationRequest>,
) -> Result<Json<LocationCheck>, ApiError> {
    req.target.validate().map_err(ApiError::bad_request)?;
    req.user.validate().map_err(ApiError::bad_request)?;
    let radius = state
        .radius_limits
        .check(req.radius_meters)
        .map_err(ApiError::bad_request)?;

    let check = validate_location(&req.target, &req.user, radius);
    debug!(
        "Location check: {:.1} m from target, radius {} m, within={}",
        check.distance_meters, check.radius_meters, check.within_radius
    );
    Ok(Json(check))
}
