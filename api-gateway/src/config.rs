//! Application configuration

use std::env;

use common::error::{Error, Result};

/// Which account store the gateway runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryKind {
    Memory,
    Postgres,
}

impl RepositoryKind {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" => Ok(Self::Memory),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => Err(Error::ConfigurationError(format!(
                "REPOSITORY must be 'memory' or 'postgres', got '{}'",
                other
            ))),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// API port
    pub port: u16,
    /// Shared key expected in `X-API-Key`; the guard is off when unset
    pub api_key: Option<String>,
    /// Account store
    pub repository: RepositoryKind,
}

impl AppConfig {
    /// Create a new configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            api_key: env::var("API_KEY").ok().filter(|k| !k.is_empty()),
            repository: match env::var("REPOSITORY") {
                Ok(raw) => RepositoryKind::parse(&raw)?,
                Err(_) => RepositoryKind::Memory,
            },
        })
    }
}
