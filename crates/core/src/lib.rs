//! Core business logic for Tally.
//!
//! This crate contains the double-entry ledger, balance aggregation and
//! financial reporting. It has no web or database dependencies; storage is
//! reached through the [`store::LedgerStore`] trait.
//!
//! # Modules
//!
//! - `ledger` - Account types, journal transactions, validation and posting
//! - `accounts` - Chart of accounts maintenance
//! - `store` - Persistence seam and in-memory implementation
//! - `balance` - Point-in-time and period balances
//! - `reports` - Balance sheet, profit and loss, trial balance, monthly series
//! - `recorder` - Transfers, payments and expenses
//! - `gateway` - Card payment gateway seam

pub mod accounts;
pub mod balance;
pub mod gateway;
pub mod ledger;
pub mod recorder;
pub mod reports;
pub mod store;
