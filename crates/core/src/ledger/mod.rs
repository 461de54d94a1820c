//! Double-entry bookkeeping logic.
//!
//! This module implements the core ledger functionality:
//! - Chart of accounts types and normal-balance rules
//! - Posting lines and persisted journal lines
//! - Journal transactions and entry numbering
//! - Posting validation (zero-sum, positive cent amounts, live accounts)
//! - Reversing entries
//! - The posting engine that commits through a [`crate::store::LedgerStore`]

pub mod account;
pub mod engine;
pub mod entry;
pub mod error;
pub mod reversal;
pub mod transaction;
pub mod validation;

#[cfg(test)]
mod engine_props;
#[cfg(test)]
mod validation_props;

pub use account::{
    Account, AccountClass, AccountType, AccountUpdate, NewAccount, NormalBalance, StatementSection,
};
pub use engine::PostingEngine;
pub use entry::{EntrySide, JournalLine, PostingLine};
pub use error::{InvalidAccountReason, LedgerError};
pub use reversal::reversing_request;
pub use transaction::{JournalTransaction, PostingRequest, SourceKind, format_entry_number};
pub use validation::{AccountInfo, TransactionTotals, check_amount, validate_lines, validate_posting};
