//! Repository for account data

use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use common::db::{init_db_pool, run_migrations, DbAccount};
use common::error::{Error, Result};
use common::model::{Account, AccountField, NewAccount};
use common::query::{Field, FieldValue, Page, PageRequest, Predicate};
use dashmap::DashMap;
use sqlx::postgres::PgArguments;
use sqlx::query::{QueryAs, QueryScalar};
use sqlx::{PgPool, Postgres};
use tracing::{debug, info};

use crate::sql::{self, QueryBuf};

/// Account repository trait defining the interface for account data storage
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// All accounts ordered by id
    async fn find_all(&self) -> Result<Vec<Account>>;

    /// One page of accounts matching `predicate`, with the total match count
    async fn find_page(
        &self,
        predicate: &Predicate<AccountField>,
        page: &PageRequest<AccountField>,
    ) -> Result<Page<Account>>;

    /// Get an account by ID
    async fn find_by_id(&self, id: i32) -> Result<Option<Account>>;

    /// Store a new account and assign its id
    async fn insert(&self, account: NewAccount) -> Result<Account>;

    /// Overwrite an existing account. Returns `None` if the id is gone.
    async fn update(&self, account: Account) -> Result<Option<Account>>;

    /// Remove an account. Returns `false` if the id did not exist.
    async fn delete(&self, id: i32) -> Result<bool>;
}

/// In-memory repository for account data
pub struct InMemoryAccountRepository {
    /// Accounts by ID
    pub accounts: DashMap<i32, Account>,
    /// Next id to hand out
    next_id: AtomicI32,
}

impl InMemoryAccountRepository {
    /// Create a new in-memory account repository
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            next_id: AtomicI32::new(1),
        }
    }

    fn sorted_snapshot(&self) -> Vec<Account> {
        let mut accounts: Vec<Account> = self.accounts.iter().map(|entry| entry.value().clone()).collect();
        accounts.sort_by_key(|a| a.id);
        accounts
    }
}

impl Default for InMemoryAccountRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn find_all(&self) -> Result<Vec<Account>> {
        Ok(self.sorted_snapshot())
    }

    async fn find_page(
        &self,
        predicate: &Predicate<AccountField>,
        page: &PageRequest<AccountField>,
    ) -> Result<Page<Account>> {
        let mut matching: Vec<Account> = self
            .sorted_snapshot()
            .into_iter()
            .filter(|a| predicate.matches(a))
            .collect();

        if let Some(sort) = &page.sort {
            matching.sort_by(|a, b| sort.compare(a, b));
        }

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.size as usize)
            .collect();

        Ok(Page::new(items, page, total))
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Account>> {
        Ok(self.accounts.get(&id).map(|a| a.clone()))
    }

    async fn insert(&self, account: NewAccount) -> Result<Account> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let account = account.into_account(id);
        self.accounts.insert(id, account.clone());
        Ok(account)
    }

    async fn update(&self, account: Account) -> Result<Option<Account>> {
        match self.accounts.get_mut(&account.id) {
            Some(mut entry) => {
                *entry = account.clone();
                Ok(Some(account))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: i32) -> Result<bool> {
        Ok(self.accounts.remove(&id).is_some())
    }
}

/// Columns read back for every account query
const ACCOUNT_COLUMNS: &[AccountField] = &[
    AccountField::Id,
    AccountField::Name,
    AccountField::Type,
    AccountField::OpenDate,
];

/// PostgreSQL repository for account data
pub struct PostgresAccountRepository {
    /// Database connection pool
    pool: PgPool,
    /// Quoted `schema.table`
    table: String,
}

impl PostgresAccountRepository {
    /// Create a repository over an existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool,
            table: sql::qualified_table("bank", "accounts"),
        }
    }

    /// Create a new PostgreSQL account repository
    pub async fn new(database_url: Option<String>) -> Result<Self> {
        let database_url = match database_url {
            Some(url) => url,
            None => std::env::var("DATABASE_URL")
                .map_err(|_| Error::ConfigurationError("DATABASE_URL must be set".to_string()))?,
        };

        let pool = init_db_pool(&database_url, 5).await?;
        run_migrations(&pool).await?;
        Ok(Self::from_pool(pool))
    }

    /// Create a new PostgreSQL account repository with configuration
    pub async fn with_config(config: &crate::config::AccountServiceConfig) -> Result<Self> {
        info!("Connecting to PostgreSQL database with pool size: {}", config.db_pool_size);

        let pool = init_db_pool(&config.database_url, config.db_pool_size).await?;
        if config.run_migrations {
            run_migrations(&pool).await?;
        }
        Ok(Self::from_pool(pool))
    }

    fn returning(&self) -> String {
        ACCOUNT_COLUMNS
            .iter()
            .map(|c| sql::quoted(c.column()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn bind_rows<'q, O>(
    query: QueryAs<'q, Postgres, O, PgArguments>,
    params: &'q [FieldValue],
) -> QueryAs<'q, Postgres, O, PgArguments> {
    params.iter().fold(query, |q, p| match p {
        FieldValue::Integer(n) => q.bind(*n),
        FieldValue::Text(s) => q.bind(s.as_str()),
        FieldValue::Date(d) => q.bind(*d),
    })
}

fn bind_scalar<'q, O>(
    query: QueryScalar<'q, Postgres, O, PgArguments>,
    params: &'q [FieldValue],
) -> QueryScalar<'q, Postgres, O, PgArguments> {
    params.iter().fold(query, |q, p| match p {
        FieldValue::Integer(n) => q.bind(*n),
        FieldValue::Text(s) => q.bind(s.as_str()),
        FieldValue::Date(d) => q.bind(*d),
    })
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn find_all(&self) -> Result<Vec<Account>> {
        let q = sql::select_all(&self.table, ACCOUNT_COLUMNS);
        debug!(sql = %q.sql, "query");

        let rows = sqlx::query_as::<_, DbAccount>(&q.sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Account::from).collect())
    }

    async fn find_page(
        &self,
        predicate: &Predicate<AccountField>,
        page: &PageRequest<AccountField>,
    ) -> Result<Page<Account>> {
        let QueryBuf { sql: count_sql, params: count_params } = sql::count(&self.table, predicate);
        debug!(sql = %count_sql, params = ?count_params, "query");
        let total: i64 = bind_scalar(sqlx::query_scalar(&count_sql), &count_params)
            .fetch_one(&self.pool)
            .await?;

        let q = sql::select_page(&self.table, ACCOUNT_COLUMNS, predicate, page);
        debug!(sql = %q.sql, params = ?q.params, "query");
        let rows = bind_rows(sqlx::query_as::<_, DbAccount>(&q.sql), &q.params)
            .fetch_all(&self.pool)
            .await?;

        let items = rows.into_iter().map(Account::from).collect();
        Ok(Page::new(items, page, total.max(0) as u64))
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Account>> {
        debug!("Getting account from database: {}", id);

        let sql = format!(
            "SELECT {} FROM {} WHERE \"account_id\" = $1",
            self.returning(),
            self.table
        );
        let row = sqlx::query_as::<_, DbAccount>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Account::from))
    }

    async fn insert(&self, account: NewAccount) -> Result<Account> {
        debug!("Inserting account '{}' into database", account.name);

        let sql = format!(
            "INSERT INTO {} (\"account_name\", \"account_type\", \"open_date\") VALUES ($1, $2, $3) RETURNING {}",
            self.table,
            self.returning()
        );
        let row = sqlx::query_as::<_, DbAccount>(&sql)
            .bind(&account.name)
            .bind(&account.account_type)
            .bind(account.open_date)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn update(&self, account: Account) -> Result<Option<Account>> {
        debug!("Updating account in database: {}", account.id);

        let sql = format!(
            "UPDATE {} SET \"account_name\" = $1, \"account_type\" = $2, \"open_date\" = $3 \
             WHERE \"account_id\" = $4 RETURNING {}",
            self.table,
            self.returning()
        );
        let row = sqlx::query_as::<_, DbAccount>(&sql)
            .bind(&account.name)
            .bind(&account.account_type)
            .bind(account.open_date)
            .bind(account.id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Account::from))
    }

    async fn delete(&self, id: i32) -> Result<bool> {
        debug!("Deleting account from database: {}", id);

        let sql = format!("DELETE FROM {} WHERE \"account_id\" = $1", self.table);
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
