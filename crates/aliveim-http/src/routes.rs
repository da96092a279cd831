use aliveim_api::{API_VERSION, AliveRequest, AliveResponse, AliveStatus, DeviceStatus, HealthStatus};
use aliveim_util::DeviceId;
use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::{info, instrument, warn};

use crate::AppState;
use crate::error::{ApiError, ApiResult};

/// Health check endpoint
#[instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        live: true,
        live_devices: state.registry.len().await,
        api_version: API_VERSION,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Keepalive report: 201 when a timer is created, 200 when it is reset.
///
/// The body is decoded by hand so that any malformed payload, whatever its
/// content type, is a 400.
#[instrument(skip(state, body))]
pub async fn report_alive(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<AliveResponse>)> {
    let request: AliveRequest = serde_json::from_slice(&body).inspect_err(|e| {
        warn!(error = %e, "Couldn't parse alive report");
    })?;

    info!(device_id = %request.device_id, timeout_ms = request.timeout, "Alive report");

    let outcome = state
        .registry
        .report_alive(request.device_id.clone(), request.timeout)
        .await;

    let status = AliveStatus::from_created(outcome.created);
    let code = match status {
        AliveStatus::Created => StatusCode::CREATED,
        AliveStatus::Reset => StatusCode::OK,
    };

    Ok((
        code,
        Json(AliveResponse {
            device_id: request.device_id,
            status,
        }),
    ))
}

/// Status of a live device
#[instrument(skip(state))]
pub async fn device_status(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> ApiResult<Json<DeviceStatus>> {
    let device_id = DeviceId::from(device_id);
    state
        .registry
        .status(&device_id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(device_id.to_string()))
}

/// Explicit deregistration; the device is dropped without an expiry notice
#[instrument(skip(state))]
pub async fn deregister_device(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> ApiResult<StatusCode> {
    let device_id = DeviceId::from(device_id);
    if state.registry.remove(&device_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(device_id.to_string()))
    }
}
