//! Client for the external accounts service

use std::time::Duration;

use async_trait::async_trait;
use common::error::{Error, Result};
use common::model::{AccountDto, AccountDtos};
use tracing::debug;

/// Source of accounts held by another service
#[async_trait]
pub trait ExternalAccountsClient: Send + Sync {
    async fn fetch_accounts(&self) -> Result<Vec<AccountDto>>;
}

/// Fetches `GET {base_url}/accounts` and decodes the `accountDto` envelope
pub struct HttpExternalAccountsClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpExternalAccountsClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::ConfigurationError(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn accounts_url(&self) -> String {
        format!("{}/accounts", self.base_url)
    }
}

/// Non-success statuses become [`Error::DependencyError`] carrying status and body
async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response> {
    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::DependencyError(format!(
            "external accounts service returned {}: {}",
            status, body
        )));
    }
    Ok(resp)
}

#[async_trait]
impl ExternalAccountsClient for HttpExternalAccountsClient {
    async fn fetch_accounts(&self) -> Result<Vec<AccountDto>> {
        let url = self.accounts_url();
        debug!(%url, "fetching accounts from external service");

        let resp = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| Error::DependencyError(format!("request to {} failed: {}", url, e)))?;

        let body: AccountDtos = check_response(resp)
            .await?
            .json()
            .await
            .map_err(|e| Error::DependencyError(format!("invalid response from {}: {}", url, e)))?;

        Ok(body.account_dto)
    }
}
