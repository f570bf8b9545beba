//! Provisioning trigger handler

use crate::domain::{ProvisionRequest, ProvisionResult};
use crate::error::AppError;
use crate::state::ProvisioningState;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

/// Header carrying the shared security key
const SECURITY_KEY_HEADER: &str = "SecurityKey";

/// Handle a provision-like-user request.
///
/// A security-key mismatch aborts with an empty 401 and no result body.
/// Every other outcome, including validation failure, is conveyed as a
/// `ProvisionResult` body over transport status 200.
pub async fn provision<S: ProvisioningState>(
    State(state): State<S>,
    headers: HeaderMap,
    Json(request): Json<ProvisionRequest>,
) -> Response {
    if let Some(expected) = &state.config().security_key {
        // The key is accepted from the SecurityKey header, falling back
        // to the request body field.
        let presented = headers
            .get(SECURITY_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .or_else(|| request.security_key.clone());

        if presented.as_deref() != Some(expected.as_str()) {
            warn!("Rejected provisioning request with missing or invalid security key");
            return StatusCode::UNAUTHORIZED.into_response();
        }
    }

    let ticket_id = request.ticket_id.clone().unwrap_or_default();

    let validated = match request.validate(state.config()) {
        Ok(validated) => validated,
        Err(AppError::Validation(msg)) => {
            return Json(ProvisionResult::failure(msg, ticket_id)).into_response();
        }
        Err(e) => {
            return Json(ProvisionResult::failure(e.to_string(), ticket_id)).into_response();
        }
    };

    let result = state.provisioner().provision(&validated).await;
    Json(result).into_response()
}
