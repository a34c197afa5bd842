use chrono::NaiveDate;
use sqlx::FromRow;

use crate::model::account::Account;

/// Database model for the `bank.accounts` table
#[derive(Debug, Clone, FromRow)]
pub struct DbAccount {
    pub account_id: i32,
    pub account_name: String,
    pub account_type: String,
    pub open_date: NaiveDate,
}

impl From<DbAccount> for Account {
    fn from(row: DbAccount) -> Self {
        Self {
            id: row.account_id,
            name: row.account_name,
            account_type: row.account_type,
            open_date: row.open_date,
        }
    }
}
