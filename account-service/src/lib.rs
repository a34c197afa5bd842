//! Account service: persistence and orchestration for bank accounts

pub mod config;
pub mod external;
pub mod repository;
pub mod service;
pub mod sql;

pub use config::AccountServiceConfig;
pub use external::{ExternalAccountsClient, HttpExternalAccountsClient};
pub use repository::{AccountRepository, InMemoryAccountRepository, PostgresAccountRepository};
pub use service::{AccountsService, RepositoryType};
