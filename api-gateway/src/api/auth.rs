//! Shared API key guard for the account routes

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::ApiError;
use crate::AppState;

/// Header carrying the shared key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Pass the request through when no key is configured or the header matches.
/// A missing header is 401, a wrong one 403.
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state.api_key.as_deref() else {
        return Ok(next.run(request).await);
    };

    match request.headers().get(API_KEY_HEADER) {
        None => Err(ApiError::Unauthorized("missing X-API-Key header".to_string())),
        Some(provided) if provided.as_bytes() == expected.as_bytes() => Ok(next.run(request).await),
        Some(_) => Err(ApiError::Forbidden("invalid API key".to_string())),
    }
}
