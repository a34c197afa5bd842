//! Common types and utilities for the banking service
//!
//! This library contains the types shared by the account service and the API
//! gateway: the error taxonomy, the account model, the dynamic query builder
//! (predicates, sorting, paging) and database helpers.

pub mod error;
pub mod model;
pub mod query;
pub mod db;

/// Re-export important types
pub use error::{Error, Result, ErrorExt, IntoError};
pub use model::{Account, AccountDto, AccountDtos, AccountField, NewAccount};
pub use query::{FilterCriteria, Page, PageRequest, Predicate, Sorter};
