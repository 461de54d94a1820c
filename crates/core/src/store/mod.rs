//! Ledger persistence seam.
//!
//! Services in this crate talk to storage only through [`LedgerStore`].
//! `InMemoryLedgerStore` backs tests and development; the Postgres
//! implementation lives in `tally-db`.

mod memory;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, ExpenseId, TransactionId};

use crate::ledger::{Account, AccountType, JournalTransaction, LedgerError, PostingRequest, SourceKind};
use crate::recorder::{Expense, Payment, Transfer};

pub use memory::InMemoryLedgerStore;

/// Filter for account listings.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AccountFilter {
    /// Only this type.
    #[serde(default, rename = "type")]
    pub account_type: Option<AccountType>,
    /// Only active (`true`) or inactive (`false`) accounts.
    #[serde(default)]
    pub active: Option<bool>,
}

impl AccountFilter {
    /// Whether `account` passes the filter.
    #[must_use]
    pub fn matches(&self, account: &Account) -> bool {
        self.account_type.is_none_or(|t| account.account_type == t)
            && self.active.is_none_or(|a| account.is_active == a)
    }
}

/// Filter for transaction listings.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TransactionFilter {
    /// Earliest entry date, inclusive.
    #[serde(default)]
    pub from: Option<NaiveDate>,
    /// Latest entry date, inclusive.
    #[serde(default)]
    pub to: Option<NaiveDate>,
    /// Only this source.
    #[serde(default)]
    pub source: Option<SourceKind>,
    /// Only transactions touching this account.
    #[serde(default)]
    pub account_id: Option<AccountId>,
}

impl TransactionFilter {
    /// Whether `transaction` passes the filter.
    #[must_use]
    pub fn matches(&self, transaction: &JournalTransaction) -> bool {
        self.from.is_none_or(|from| transaction.entry_date >= from)
            && self.to.is_none_or(|to| transaction.entry_date <= to)
            && self.source.is_none_or(|s| transaction.source == s)
            && self
                .account_id
                .is_none_or(|id| transaction.lines.iter().any(|l| l.account_id == id))
    }
}

/// Date window for balance sums. Both bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TotalsQuery {
    /// Earliest entry date; `None` means from the first posting.
    pub from: Option<NaiveDate>,
    /// Latest entry date.
    pub to: NaiveDate,
    /// Restrict to one account.
    pub account_id: Option<AccountId>,
}

impl TotalsQuery {
    /// Everything up to and including `as_of`.
    #[must_use]
    pub fn as_of(as_of: NaiveDate) -> Self {
        Self {
            from: None,
            to: as_of,
            account_id: None,
        }
    }

    /// Entries dated `from..=to`.
    #[must_use]
    pub fn period(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to,
            account_id: None,
        }
    }

    /// Restricts the query to one account.
    #[must_use]
    pub fn for_account(mut self, account_id: AccountId) -> Self {
        self.account_id = Some(account_id);
        self
    }

    /// Whether an entry date falls inside the window.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date <= self.to && self.from.is_none_or(|from| date >= from)
    }
}

/// Raw debit and credit sums for one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountTotals {
    /// Account ID.
    pub account_id: AccountId,
    /// Sum of debit lines.
    pub debit_total: Decimal,
    /// Sum of credit lines, as a positive number.
    pub credit_total: Decimal,
}

/// Source document written in the same storage transaction as a posting.
#[derive(Debug, Clone)]
pub enum PostingDocument {
    /// New transfer row.
    Transfer(Transfer),
    /// New payment row.
    Payment(Payment),
    /// New expense row.
    Expense(Expense),
    /// Marks an expense deleted; the posting is its reversal.
    ExpenseDeletion {
        /// Expense being deleted.
        expense_id: ExpenseId,
        /// Deletion time.
        deleted_at: DateTime<Utc>,
    },
}

/// Everything committed atomically for one journal transaction.
#[derive(Debug, Clone)]
pub struct Posting {
    /// ID assigned by the engine before commit.
    pub transaction_id: TransactionId,
    /// Header and lines.
    pub request: PostingRequest,
    /// Optional source document.
    pub document: Option<PostingDocument>,
}

/// Ledger persistence.
///
/// `commit_posting` is the only way lines are written. Implementations must:
/// - run [`crate::ledger::validate_posting`] against account state read in
///   the same storage transaction;
/// - assign the next sequential entry number;
/// - refuse a second reversal of one transaction with `AlreadyReversed`;
/// - write header, lines and document together or not at all;
/// - report write conflicts as `ConcurrencyConflict`.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Inserts an account; names are unique ignoring case.
    async fn insert_account(&self, account: Account) -> Result<Account, LedgerError>;

    /// Replaces an account record.
    ///
    /// A rename also rewrites `parent_name` on its sub-accounts in the same write.
    async fn update_account(&self, account: Account) -> Result<Account, LedgerError>;

    /// Looks up an account.
    async fn get_account(&self, id: AccountId) -> Result<Option<Account>, LedgerError>;

    /// Looks up an account by name, ignoring case.
    async fn find_account_by_name(&self, name: &str) -> Result<Option<Account>, LedgerError>;

    /// Lists accounts in report order.
    async fn list_accounts(&self, filter: &AccountFilter) -> Result<Vec<Account>, LedgerError>;

    /// Whether any journal line references the account.
    async fn account_has_postings(&self, id: AccountId) -> Result<bool, LedgerError>;

    /// Validates and commits a posting.
    async fn commit_posting(&self, posting: Posting) -> Result<JournalTransaction, LedgerError>;

    /// Looks up a transaction with its lines.
    async fn get_transaction(&self, id: TransactionId)
    -> Result<Option<JournalTransaction>, LedgerError>;

    /// Lists transactions by entry date, then entry number.
    async fn list_transactions(
        &self,
        filter: &TransactionFilter,
    ) -> Result<Vec<JournalTransaction>, LedgerError>;

    /// Sums debits and credits per account over a date window.
    ///
    /// Accounts without lines in the window may be omitted.
    async fn account_totals(&self, query: &TotalsQuery) -> Result<Vec<AccountTotals>, LedgerError>;

    /// Lists transfers, newest first.
    async fn list_transfers(&self) -> Result<Vec<Transfer>, LedgerError>;

    /// Lists payments, newest first.
    async fn list_payments(&self) -> Result<Vec<Payment>, LedgerError>;

    /// Lists expenses, newest first.
    async fn list_expenses(&self, include_deleted: bool) -> Result<Vec<Expense>, LedgerError>;

    /// Looks up an expense, deleted or not.
    async fn get_expense(&self, id: ExpenseId) -> Result<Option<Expense>, LedgerError>;
}

/// Sorts accounts into report order: type, then number, then name.
pub fn sort_accounts(accounts: &mut [Account]) {
    accounts.sort_by(|a, b| {
        a.account_type
            .cmp(&b.account_type)
            .then_with(|| a.account_number.cmp(&b.account_number))
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
}
