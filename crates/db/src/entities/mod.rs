//! `SeaORM` entities for the ledger schema.

pub mod accounts;
pub mod expenses;
pub mod journal_lines;
pub mod journal_transactions;
pub mod payments;
pub mod transfers;
