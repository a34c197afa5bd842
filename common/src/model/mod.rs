//! Domain models for the banking service

pub mod account;

pub use account::{Account, AccountDto, AccountDtos, AccountField, NewAccount};
