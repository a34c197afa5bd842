//! Account models and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::query::{Field, FieldKind, FieldValue, Filterable};

/// Account entity, one row of `bank.accounts`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Store-assigned account ID
    pub id: i32,
    /// Account name, fixed at creation
    pub name: String,
    /// Account type, fixed at creation
    #[serde(rename = "type")]
    pub account_type: String,
    /// Opening date, fixed at creation
    pub open_date: NaiveDate,
}

/// A validated account that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub name: String,
    pub account_type: String,
    pub open_date: NaiveDate,
}

impl NewAccount {
    /// Attach a store-assigned id
    pub fn into_account(self, id: i32) -> Account {
        Account {
            id,
            name: self.name,
            account_type: self.account_type,
            open_date: self.open_date,
        }
    }
}

/// Queryable account fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountField {
    Id,
    Name,
    Type,
    OpenDate,
}

impl Field for AccountField {
    fn parse(name: &str) -> Option<Self> {
        match name.trim() {
            "id" => Some(AccountField::Id),
            "name" => Some(AccountField::Name),
            "type" => Some(AccountField::Type),
            "openDate" | "open_date" => Some(AccountField::OpenDate),
            _ => None,
        }
    }

    fn kind(self) -> FieldKind {
        match self {
            AccountField::Id => FieldKind::Integer,
            AccountField::Name | AccountField::Type => FieldKind::Text,
            AccountField::OpenDate => FieldKind::Date,
        }
    }

    fn column(self) -> &'static str {
        match self {
            AccountField::Id => "account_id",
            AccountField::Name => "account_name",
            AccountField::Type => "account_type",
            AccountField::OpenDate => "open_date",
        }
    }

    fn primary_key() -> Self {
        AccountField::Id
    }
}

impl Filterable for Account {
    type Field = AccountField;

    fn field_value(&self, field: AccountField) -> FieldValue {
        match field {
            AccountField::Id => FieldValue::Integer(self.id),
            AccountField::Name => FieldValue::Text(self.name.clone()),
            AccountField::Type => FieldValue::Text(self.account_type.clone()),
            AccountField::OpenDate => FieldValue::Date(self.open_date),
        }
    }
}

/// Transfer representation of an account: `{id, name, type, openDate}`.
/// Every field is optional on input; validation happens in the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub account_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_date: Option<NaiveDate>,
}

impl AccountDto {
    pub fn new(name: impl Into<String>, account_type: impl Into<String>, open_date: Option<NaiveDate>) -> Self {
        Self {
            id: None,
            name: Some(name.into()),
            account_type: Some(account_type.into()),
            open_date,
        }
    }
}

impl From<Account> for AccountDto {
    fn from(account: Account) -> Self {
        Self {
            id: Some(account.id),
            name: Some(account.name),
            account_type: Some(account.account_type),
            open_date: Some(account.open_date),
        }
    }
}

/// Named envelope for account lists: `{"accountDto": [...]}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountDtos {
    #[serde(rename = "accountDto", default)]
    pub account_dto: Vec<AccountDto>,
}

impl FromIterator<Account> for AccountDtos {
    fn from_iter<I: IntoIterator<Item = Account>>(iter: I) -> Self {
        Self {
            account_dto: iter.into_iter().map(AccountDto::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dto_wire_names() {
        let account = Account {
            id: 3,
            name: "Savings".to_string(),
            account_type: "SAVINGS".to_string(),
            open_date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        };
        let json = serde_json::to_value(AccountDto::from(account)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": 3, "name": "Savings", "type": "SAVINGS", "openDate": "2024-01-31"})
        );
    }

    #[test]
    fn field_names_resolve() {
        assert_eq!(AccountField::parse("openDate"), Some(AccountField::OpenDate));
        assert_eq!(AccountField::parse("open_date"), Some(AccountField::OpenDate));
        assert_eq!(AccountField::parse("balance"), None);
        assert_eq!(AccountField::Type.column(), "account_type");
    }
}
