use axum::{body::Bytes, extract::State, Json};
use serde_json::Value;

use crate::{
    api::models::*,
    error::{ApiError, Result},
    state::AppState,
};

/// Current LED state, read back from the pin
pub async fn handle_get_led(State(state): State<AppState>) -> Result<Json<LedStatusResponse>> {
    let controller = state.controller.lock().await;
    let status = controller.status()?;

    Ok(Json(LedStatusResponse { status }))
}

/// Switch the LED on or off from `{"status": ...}`
pub async fn handle_set_led(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SetLedResponse>> {
    let request: Value = serde_json::from_slice(&body).map_err(|e| {
        tracing::debug!("Rejecting LED request body: {}", e);
        ApiError::InvalidRequest
    })?;
    if request.is_null() {
        return Err(ApiError::InvalidRequest);
    }

    let status = request.get("status").cloned().ok_or(ApiError::MissingField)?;

    let mut controller = state.controller.lock().await;
    if is_truthy(&status) {
        controller.turn_on()?;
        tracing::info!("LED turned ON");
    } else {
        controller.turn_off()?;
        tracing::info!("LED turned OFF");
    }

    Ok(Json(SetLedResponse {
        success: true,
        status,
    }))
}

/// Health check endpoint
pub async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        started_at: state.started_at.to_rfc3339(),
        public_url: state.public_url.as_deref().map(str::to_string),
    })
}
