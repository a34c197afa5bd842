//! Error handling for the API gateway

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use common::error::Error;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

tokio::task_local! {
    /// `x-request-id` of the request being handled
    static REQUEST_ID: String;
}

/// Run the rest of the stack with the request's `x-request-id` in scope so
/// error bodies report the same id as the response header.
pub async fn scope_request_id(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    match request_id {
        Some(id) => REQUEST_ID.scope(id, next.run(request)).await,
        None => next.run(request).await,
    }
}

fn current_request_id() -> String {
    REQUEST_ID
        .try_with(Clone::clone)
        .unwrap_or_else(|_| Uuid::new_v4().to_string())
}

/// API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error information
    pub error: ErrorInfo,
    /// Request ID for tracing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Detailed error information
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error code (string identifier for the error type)
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API errors
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("{0}")]
    Common(#[from] Error),
}

impl ApiError {
    fn classify(&self) -> (StatusCode, &'static str, Option<serde_json::Value>) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request", None),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden", None),
            ApiError::UnprocessableEntity(_) => (StatusCode::UNPROCESSABLE_ENTITY, "unprocessable_entity", None),
            ApiError::Common(e) => match e {
                // Client errors (4xx)
                Error::ValidationError(_) => (StatusCode::BAD_REQUEST, "validation_error", None),
                Error::InvalidAccount(_) => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_account", None),
                Error::AccountNotFound(_) => (StatusCode::NOT_FOUND, "account_not_found", None),
                Error::AuthorizationError(_) => (StatusCode::FORBIDDEN, "authorization_error", None),

                // Server errors (5xx)
                Error::DependencyError(_) => (StatusCode::BAD_GATEWAY, "dependency_error", None),
                Error::ConfigurationError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error", None),
                Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None),
                Error::Database(e) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    Some(serde_json::json!({
                        "db_error": e.to_string(),
                        "code": e.as_database_error().map(|dbe| dbe.code().map(|c| c.to_string())),
                    })),
                ),
                Error::Migration(_) => (StatusCode::INTERNAL_SERVER_ERROR, "migration_error", None),
                Error::Serialization(_) => (StatusCode::INTERNAL_SERVER_ERROR, "serialization_error", None),
            },
        }
    }

    /// HTTP status this error renders with
    pub fn status(&self) -> StatusCode {
        self.classify().0
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let request_id = current_request_id();

        let (status, code, details) = self.classify();
        if status.is_server_error() {
            tracing::error!("API Error [{}]: {:?}", request_id, &self);
        } else {
            tracing::warn!("API Error [{}]: {:?}", request_id, &self);
        }

        let error_response = ErrorResponse {
            error: ErrorInfo {
                code: code.to_string(),
                message: self.to_string(),
                details,
            },
            request_id: Some(request_id),
        };

        (status, Json(error_response)).into_response()
    }
}
