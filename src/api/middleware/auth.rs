//! API key authentication
//!
//! Requests must carry the configured shared secret in the `x-api-key`
//! header; anything else is rejected before any processing happens.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::ApiError;

/// Extractor that requires a valid `x-api-key` header
#[derive(Debug, Clone)]
pub struct RequireApiKey;

impl FromRequestParts<AppState> for RequireApiKey {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let presented = extract_api_key(&parts.headers)?;

        if presented != state.api_key {
            debug!("rejected request with wrong API key");
            return Err(ApiError::unauthorized("Unauthorized"));
        }

        Ok(RequireApiKey)
    }
}

fn extract_api_key(headers: &HeaderMap) -> Result<String, ApiError> {
    let header = headers
        .get("x-api-key")
        .ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;

    let key = header
        .to_str()
        .map_err(|_| ApiError::unauthorized("Unauthorized"))?;

    Ok(key.trim().to_string())
}
