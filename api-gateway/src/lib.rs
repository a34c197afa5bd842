//! HTTP gateway for the accounts service

pub mod api;
pub mod config;
pub mod error;

use std::sync::Arc;

use account_service::{AccountServiceConfig, AccountsService, HttpExternalAccountsClient};
use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware,
    routing::get,
    Router,
};
use common::error::Result;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{info, Level};
use uuid::Uuid;

use crate::api::account::{
    create_account, delete_account, fetch_external_accounts, filter_accounts, get_account,
    get_all_accounts, search_accounts, update_account,
};
use crate::api::auth::require_api_key;
use crate::config::{AppConfig, RepositoryKind};
use crate::error::scope_request_id;

/// App state shared across handlers
pub struct AppState {
    /// Accounts service
    pub accounts_service: Arc<AccountsService>,
    /// Expected `X-API-Key`; `None` disables the guard
    pub api_key: Option<String>,
}

impl AppState {
    pub fn new(accounts_service: Arc<AccountsService>) -> Self {
        Self {
            accounts_service,
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

/// Fresh UUID v4 for every request without an `x-request-id`
#[derive(Clone, Copy, Default)]
struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Build the full application router
pub fn router(state: Arc<AppState>, log_level: Level) -> Router {
    let account_routes = Router::new()
        .route("/accounts", get(get_all_accounts).post(create_account))
        .route("/accounts/search", get(search_accounts))
        .route("/accounts/filter", get(filter_accounts))
        .route("/accounts/external", get(fetch_external_accounts))
        .route(
            "/accounts/:id",
            get(get_account).put(update_account).delete(delete_account),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(account_routes)
        .route("/health", get(api::health))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(move |request: &Request<Body>| {
                            let request_id = request
                                .headers()
                                .get("x-request-id")
                                .and_then(|v| v.to_str().ok())
                                .unwrap_or("-");
                            tracing::span!(
                                Level::INFO,
                                "request",
                                method = %request.method(),
                                uri = %request.uri(),
                                request_id = %request_id,
                            )
                        })
                        .on_request(DefaultOnRequest::new().level(log_level))
                        .on_response(DefaultOnResponse::new().level(log_level)),
                )
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(cors)
                .layer(middleware::from_fn(scope_request_id)),
        )
        .with_state(state)
}

/// Assemble the accounts service for the configured store
pub async fn build_accounts_service(config: &AppConfig) -> Result<AccountsService> {
    let service_config = AccountServiceConfig::from_env();

    match config.repository {
        RepositoryKind::Postgres => {
            info!("Using PostgreSQL account repository");
            AccountsService::with_config(&service_config).await
        }
        RepositoryKind::Memory => {
            info!("Using in-memory account repository");
            let service = AccountsService::new();
            match &service_config.external_accounts_url {
                Some(url) => Ok(service.with_external_client(Arc::new(HttpExternalAccountsClient::new(
                    url.clone(),
                    service_config.external_timeout,
                )?))),
                None => Ok(service),
            }
        }
    }
}
