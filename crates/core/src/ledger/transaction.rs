//! Journal transaction header and the posting request that creates one.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tally_shared::types::TransactionId;

use super::entry::{JournalLine, PostingLine};
use super::error::LedgerError;
use super::validation::TransactionTotals;

/// What produced a journal transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Manual journal entry.
    Journal,
    /// Expense recorded against a bank or card account.
    Expense,
    /// Payment received or disbursed.
    Payment,
    /// Transfer between two accounts.
    Transfer,
    /// Customer invoice.
    Invoice,
    /// Supplier bill.
    Bill,
    /// Payment of a supplier bill.
    BillPayment,
    /// Reversal of an earlier transaction.
    Reversal,
}

impl SourceKind {
    /// Persisted representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Journal => "journal",
            Self::Expense => "expense",
            Self::Payment => "payment",
            Self::Transfer => "transfer",
            Self::Invoice => "invoice",
            Self::Bill => "bill",
            Self::BillPayment => "bill_payment",
            Self::Reversal => "reversal",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "journal" => Ok(Self::Journal),
            "expense" => Ok(Self::Expense),
            "payment" => Ok(Self::Payment),
            "transfer" => Ok(Self::Transfer),
            "invoice" => Ok(Self::Invoice),
            "bill" => Ok(Self::Bill),
            "bill_payment" => Ok(Self::BillPayment),
            "reversal" => Ok(Self::Reversal),
            other => Err(LedgerError::Validation(format!("unknown source kind: {other}"))),
        }
    }
}

/// Formats a sequence number as an entry number: 1 becomes `JE-0001`.
#[must_use]
pub fn format_entry_number(sequence: i64) -> String {
    format!("JE-{sequence:04}")
}

/// Request to post a balanced set of lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostingRequest {
    /// Accounting date.
    pub entry_date: NaiveDate,
    /// Transaction memo.
    #[serde(default)]
    pub memo: Option<String>,
    /// Origin of the posting.
    #[serde(default = "default_source")]
    pub source: SourceKind,
    /// Transaction reversed by this one.
    #[serde(default, skip_deserializing)]
    pub reverses: Option<TransactionId>,
    /// Lines, at least two.
    pub lines: Vec<PostingLine>,
}

fn default_source() -> SourceKind {
    SourceKind::Journal
}

impl PostingRequest {
    /// Creates a request with no memo.
    #[must_use]
    pub fn new(entry_date: NaiveDate, source: SourceKind, lines: Vec<PostingLine>) -> Self {
        Self {
            entry_date,
            memo: None,
            source,
            reverses: None,
            lines,
        }
    }

    /// Sets the memo.
    #[must_use]
    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }
}

/// A committed journal transaction with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalTransaction {
    /// Transaction ID.
    pub id: TransactionId,
    /// Sequential entry number (`JE-0001`).
    pub entry_number: String,
    /// Accounting date.
    pub entry_date: NaiveDate,
    /// Memo.
    pub memo: Option<String>,
    /// Origin.
    pub source: SourceKind,
    /// Transaction this one reverses.
    pub reverses: Option<TransactionId>,
    /// Commit time.
    pub created_at: DateTime<Utc>,
    /// Lines in posting order.
    pub lines: Vec<JournalLine>,
}

impl JournalTransaction {
    /// Debit and credit totals.
    #[must_use]
    pub fn totals(&self) -> TransactionTotals {
        TransactionTotals::new(
            self.lines.iter().map(JournalLine::debit).sum(),
            self.lines.iter().map(JournalLine::credit).sum(),
        )
    }
}
