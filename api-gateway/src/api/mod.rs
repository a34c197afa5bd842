//! API handlers
//!
//! Each handler follows the same pattern:
//! - Extract state, parameters and the negotiated format using Axum extractors
//! - Call the accounts service
//! - Map the result to a response in the negotiated format

pub mod account;
pub mod auth;
pub mod format;
pub mod response;

use axum::Json;

pub use format::{Format, Negotiated, Payload};
pub use response::{HealthResponse, PageResponse};

/// Liveness check
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
