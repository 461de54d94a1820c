//! Journal lines: requested posting lines and persisted signed lines.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, JournalLineId, TransactionId};

/// Debit or credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySide {
    /// Debit (left) side.
    Debit,
    /// Credit (right) side.
    Credit,
}

impl EntrySide {
    /// The other side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Debit => Self::Credit,
            Self::Credit => Self::Debit,
        }
    }

    /// Signed storage amount: debits positive, credits negative.
    #[must_use]
    pub fn signed(self, amount: Decimal) -> Decimal {
        match self {
            Self::Debit => amount,
            Self::Credit => -amount,
        }
    }
}

/// One line of a posting request. `amount` is always the positive magnitude.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingLine {
    /// Account to post to.
    pub account_id: AccountId,
    /// Debit or credit.
    pub side: EntrySide,
    /// Positive amount.
    pub amount: Decimal,
    /// Optional line description.
    #[serde(default)]
    pub description: Option<String>,
}

impl PostingLine {
    /// Debit line.
    #[must_use]
    pub fn debit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            side: EntrySide::Debit,
            amount,
            description: None,
        }
    }

    /// Credit line.
    #[must_use]
    pub fn credit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            side: EntrySide::Credit,
            amount,
            description: None,
        }
    }

    /// Attaches a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Signed amount as it will be stored.
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        self.side.signed(self.amount)
    }
}

/// A persisted journal line. Never updated or deleted once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    /// Line ID.
    pub id: JournalLineId,
    /// Owning transaction.
    pub transaction_id: TransactionId,
    /// Posting position within the transaction, starting at 1.
    pub line_no: i32,
    /// Account posted to.
    pub account_id: AccountId,
    /// Accounting date, copied from the transaction header.
    pub entry_date: NaiveDate,
    /// Signed amount: debit > 0, credit < 0.
    pub amount: Decimal,
    /// Optional line description.
    pub description: Option<String>,
}

impl JournalLine {
    /// Side implied by the sign.
    #[must_use]
    pub fn side(&self) -> EntrySide {
        if self.amount.is_sign_negative() {
            EntrySide::Credit
        } else {
            EntrySide::Debit
        }
    }

    /// Debit amount, zero for a credit line.
    #[must_use]
    pub fn debit(&self) -> Decimal {
        self.amount.max(Decimal::ZERO)
    }

    /// Credit amount, zero for a debit line.
    #[must_use]
    pub fn credit(&self) -> Decimal {
        (-self.amount).max(Decimal::ZERO)
    }
}
