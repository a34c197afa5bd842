//! Account API handlers
//!
//! Handles endpoints related to account management:
//! - List, search and filter accounts
//! - Create, get, update and delete an account
//! - Trigger a fetch from the external accounts service

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
};
use common::model::{AccountDto, AccountDtos, AccountField};
use common::query::{build_predicate, FilterCriteria, PageRequest, Predicate, Sorter};
use tracing::debug;

use crate::api::format::{Format, Negotiated, Payload};
use crate::api::response::PageResponse;
use crate::error::ApiError;
use crate::AppState;

/// XML root element for a single account
const ACCOUNT_ROOT: &str = "accountDto";
/// XML root element for account lists
const ACCOUNTS_ROOT: &str = "accountDtos";
/// XML root element for a page of accounts
const PAGE_ROOT: &str = "page";

type AccountPage = PageResponse<AccountDto>;

fn query_params(query: Result<Query<FilterCriteria>, QueryRejection>) -> Result<FilterCriteria, ApiError> {
    query
        .map(|Query(params)| params)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

fn parse_id(raw: &str) -> Result<i32, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid account id: {}", raw)))
}

/// `sort` and `direction` from the query string, each overridden by the body.
/// A body `direction` also replaces a direction written inline in the query `sort`.
fn ordering(query: &FilterCriteria, body: &FilterCriteria) -> FilterCriteria {
    let mut merged = FilterCriteria::new();
    let sort = match (body.get("sort"), query.get("sort"), body.get("direction")) {
        (Some(sort), _, _) => Some(sort),
        (None, Some(sort), Some(_)) => sort.split(',').next(),
        (None, sort, _) => sort,
    };
    if let Some(sort) = sort {
        merged.insert("sort", sort);
    }
    if let Some(direction) = body.get("direction").or_else(|| query.get("direction")) {
        merged.insert("direction", direction);
    }
    merged
}

/// List all accounts
pub async fn get_all_accounts(
    State(state): State<Arc<AppState>>,
    format: Format,
) -> Result<Negotiated<AccountDtos>, ApiError> {
    let accounts = state.accounts_service.get_all_accounts().await?;
    Ok(Negotiated::new(format, ACCOUNTS_ROOT, accounts.into_iter().collect()))
}

/// Search by name and type substring with paging and sorting
pub async fn search_accounts(
    State(state): State<Arc<AppState>>,
    format: Format,
    query: Result<Query<FilterCriteria>, QueryRejection>,
) -> Result<Negotiated<AccountPage>, ApiError> {
    let params = query_params(query)?;

    let predicate = Predicate::contains(AccountField::Name, params.get("name"))
        .and(Predicate::contains(AccountField::Type, params.get("type")));
    let page = Sorter::sort(&params, PageRequest::from_params(&params)?)?;

    let result = state.accounts_service.find_all(&predicate, &page).await?;
    Ok(Negotiated::new(format, PAGE_ROOT, result.map(AccountDto::from).into()))
}

/// Filter by a body map of field expressions.
///
/// `page` and `size` come from the query string. Ordering comes from `sort`
/// and `direction` in the body, falling back to the query string.
pub async fn filter_accounts(
    State(state): State<Arc<AppState>>,
    format: Format,
    query: Result<Query<FilterCriteria>, QueryRejection>,
    Payload(criteria): Payload<FilterCriteria>,
) -> Result<Negotiated<AccountPage>, ApiError> {
    let params = query_params(query)?;
    debug!(?criteria, "Filtering accounts");

    let predicate = build_predicate::<AccountField>(&criteria);
    let page = Sorter::sort(&ordering(&params, &criteria), PageRequest::from_params(&params)?)?;

    let result = state.accounts_service.find_all(&predicate, &page).await?;
    Ok(Negotiated::new(format, PAGE_ROOT, result.map(AccountDto::from).into()))
}

/// Get an account by ID
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    format: Format,
    Path(id): Path<String>,
) -> Result<Negotiated<AccountDto>, ApiError> {
    let account = state.accounts_service.get_account_by_id(parse_id(&id)?).await?;
    Ok(Negotiated::new(format, ACCOUNT_ROOT, account.into()))
}

/// Create a new account. Any `id` in the body is ignored.
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    format: Format,
    Payload(mut dto): Payload<AccountDto>,
) -> Result<Negotiated<AccountDto>, ApiError> {
    dto.id = None;
    let account = state.accounts_service.create_or_update_account(dto).await?;
    Ok(Negotiated::new(format, ACCOUNT_ROOT, AccountDto::from(account)).with_status(StatusCode::CREATED))
}

/// Update the account named by the path
pub async fn update_account(
    State(state): State<Arc<AppState>>,
    format: Format,
    Path(id): Path<String>,
    Payload(mut dto): Payload<AccountDto>,
) -> Result<Negotiated<AccountDto>, ApiError> {
    dto.id = Some(parse_id(&id)?);
    let account = state.accounts_service.create_or_update_account(dto).await?;
    Ok(Negotiated::new(format, ACCOUNT_ROOT, account.into()))
}

/// Delete an account
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.accounts_service.delete_account(parse_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Fetch accounts from the external accounts service
pub async fn fetch_external_accounts(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    state.accounts_service.fetch_accounts_from_another_service().await?;
    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criteria(pairs: &[(&str, &str)]) -> FilterCriteria {
        pairs.iter().copied().collect()
    }

    #[test]
    fn body_direction_applies_to_query_sort() {
        let merged = ordering(&criteria(&[("sort", "name,asc")]), &criteria(&[("direction", "desc")]));
        assert_eq!(merged, criteria(&[("sort", "name"), ("direction", "desc")]));
    }

    #[test]
    fn body_sort_replaces_query_sort() {
        let merged = ordering(
            &criteria(&[("sort", "balance"), ("direction", "asc"), ("size", "5")]),
            &criteria(&[("sort", "id"), ("name", "Sav")]),
        );
        assert_eq!(merged, criteria(&[("sort", "id"), ("direction", "asc")]));
    }

    #[test]
    fn query_ordering_used_without_body_keys() {
        let merged = ordering(&criteria(&[("sort", "name,desc")]), &FilterCriteria::new());
        assert_eq!(merged, criteria(&[("sort", "name,desc")]));
    }
}
