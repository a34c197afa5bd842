//! Accounts service implementation

use std::sync::Arc;

use chrono::Utc;
use common::error::{Error, ErrorExt, Result};
use common::model::{Account, AccountDto, AccountField, NewAccount};
use common::query::{Page, PageRequest, Predicate};
use tracing::{debug, info, warn};

use crate::external::{ExternalAccountsClient, HttpExternalAccountsClient};
use crate::repository::{AccountRepository, InMemoryAccountRepository, PostgresAccountRepository};

/// Longest accepted name or type
const MAX_TEXT_LEN: usize = 255;

/// Orchestrates account persistence and the external accounts service
pub struct AccountsService {
    /// Repository for account data
    repo: Arc<dyn AccountRepository>,
    /// Collaborator behind `fetch_accounts_from_another_service`
    external: Option<Arc<dyn ExternalAccountsClient>>,
}

/// Repository Type
pub enum RepositoryType {
    /// In-memory repository
    InMemory,
    /// PostgreSQL repository
    Postgres(Option<String>),
}

impl AccountsService {
    /// Create a new accounts service backed by memory
    pub fn new() -> Self {
        Self {
            repo: Arc::new(InMemoryAccountRepository::new()),
            external: None,
        }
    }

    /// Create a service over explicit collaborators
    pub fn from_parts(
        repo: Arc<dyn AccountRepository>,
        external: Option<Arc<dyn ExternalAccountsClient>>,
    ) -> Self {
        Self { repo, external }
    }

    /// Create a new accounts service with a specific repository type
    pub async fn with_repository(repo_type: RepositoryType) -> Result<Self> {
        let repo: Arc<dyn AccountRepository> = match repo_type {
            RepositoryType::InMemory => Arc::new(InMemoryAccountRepository::new()),
            RepositoryType::Postgres(database_url) => {
                Arc::new(PostgresAccountRepository::new(database_url).await?)
            }
        };

        Ok(Self { repo, external: None })
    }

    /// Create a new accounts service with a configuration
    pub async fn with_config(config: &crate::config::AccountServiceConfig) -> Result<Self> {
        let repo: Arc<dyn AccountRepository> =
            Arc::new(PostgresAccountRepository::with_config(config).await?);

        let service = Self { repo, external: None };
        match &config.external_accounts_url {
            Some(url) => Ok(service.with_external_client(Arc::new(
                HttpExternalAccountsClient::new(url.clone(), config.external_timeout)?,
            ))),
            None => Ok(service),
        }
    }

    /// Attach the external accounts collaborator
    pub fn with_external_client(mut self, client: Arc<dyn ExternalAccountsClient>) -> Self {
        self.external = Some(client);
        self
    }

    /// All accounts, ordered by id
    pub async fn get_all_accounts(&self) -> Result<Vec<Account>> {
        self.repo.find_all().await
    }

    /// One page of accounts matching `predicate`, ordered and sliced per `page`
    pub async fn find_all(
        &self,
        predicate: &Predicate<AccountField>,
        page: &PageRequest<AccountField>,
    ) -> Result<Page<Account>> {
        debug!(?predicate, ?page, "Finding accounts");
        self.repo.find_page(predicate, page).await
    }

    /// Get an account by ID
    pub async fn get_account_by_id(&self, id: i32) -> Result<Account> {
        self.repo
            .find_by_id(id)
            .await
            .with_context(|| format!("Failed to retrieve account {}", id))?
            .ok_or_else(|| Error::AccountNotFound(format!("Account not found: {}", id)))
    }

    /// Insert when `dto.id` is absent, otherwise update the existing account.
    ///
    /// Name, type and open date are fixed at creation. An update that would
    /// change any of them is rejected with [`Error::InvalidAccount`]; an
    /// update that matches the stored values re-saves the record.
    pub async fn create_or_update_account(&self, dto: AccountDto) -> Result<Account> {
        match dto.id {
            None => {
                let account = validate_new(dto)?;
                info!("Creating account '{}' of type '{}'", account.name, account.account_type);
                self.repo.insert(account).await
            }
            Some(id) => self.update_account(id, dto).await,
        }
    }

    async fn update_account(&self, id: i32, dto: AccountDto) -> Result<Account> {
        let existing = self.get_account_by_id(id).await?;

        let name = required_text("name", dto.name.as_deref());
        let account_type = required_text("type", dto.account_type.as_deref());
        let (name, account_type) = collect_problems(name, account_type)?;

        let mut changed = Vec::new();
        if name != existing.name {
            changed.push("name");
        }
        if account_type != existing.account_type {
            changed.push("type");
        }
        if dto.open_date.is_some_and(|d| d != existing.open_date) {
            changed.push("openDate");
        }
        if !changed.is_empty() {
            warn!(id, ?changed, "Rejected update of immutable account fields");
            return Err(Error::InvalidAccount(format!(
                "immutable fields cannot be changed: {}",
                changed.join(", ")
            )));
        }

        info!("Updating account {}", id);
        self.repo
            .update(existing)
            .await?
            .ok_or_else(|| Error::AccountNotFound(format!("Account not found: {}", id)))
    }

    /// Remove an account. Deleting an absent id, including a second delete, fails.
    pub async fn delete_account(&self, id: i32) -> Result<()> {
        info!("Deleting account {}", id);
        if self.repo.delete(id).await? {
            Ok(())
        } else {
            Err(Error::AccountNotFound(format!("Account not found: {}", id)))
        }
    }

    /// Pull accounts from the external service. Nothing is returned to the
    /// caller; failures surface as [`Error::DependencyError`].
    pub async fn fetch_accounts_from_another_service(&self) -> Result<()> {
        let client = self.external.as_ref().ok_or_else(|| {
            Error::DependencyError("external accounts service is not configured".to_string())
        })?;

        let accounts = client.fetch_accounts().await.map_err(|e| match e {
            Error::DependencyError(msg) => Error::DependencyError(msg),
            other => Error::DependencyError(other.to_string()),
        })?;

        info!("Fetched {} accounts from external service", accounts.len());
        Ok(())
    }
}

impl Default for AccountsService {
    fn default() -> Self {
        Self::new()
    }
}

fn required_text(field: &str, value: Option<&str>) -> std::result::Result<String, String> {
    let value = value.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        Err(format!("{} is required", field))
    } else if value.chars().count() > MAX_TEXT_LEN {
        Err(format!("{} must be at most {} characters", field, MAX_TEXT_LEN))
    } else {
        Ok(value.to_string())
    }
}

fn collect_problems(
    name: std::result::Result<String, String>,
    account_type: std::result::Result<String, String>,
) -> Result<(String, String)> {
    match (name, account_type) {
        (Ok(name), Ok(account_type)) => Ok((name, account_type)),
        (name, account_type) => {
            let problems: Vec<String> = [name.err(), account_type.err()].into_iter().flatten().collect();
            Err(Error::InvalidAccount(problems.join("; ")))
        }
    }
}

/// Validate a create payload; a missing open date defaults to today (UTC)
fn validate_new(dto: AccountDto) -> Result<NewAccount> {
    let (name, account_type) = collect_problems(
        required_text("name", dto.name.as_deref()),
        required_text("type", dto.account_type.as_deref()),
    )?;

    Ok(NewAccount {
        name,
        account_type,
        open_date: dto.open_date.unwrap_or_else(|| Utc::now().date_naive()),
    })
}
