//! Source documents written alongside their postings.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, ExpenseId, PaymentId, TransactionId, TransferId};

/// Money moved between two accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Transfer ID.
    pub id: TransferId,
    /// Account credited.
    pub from_account_id: AccountId,
    /// Account debited.
    pub to_account_id: AccountId,
    /// Positive amount.
    pub amount: Decimal,
    /// Accounting date.
    pub transfer_date: NaiveDate,
    /// Memo.
    pub memo: Option<String>,
    /// Posting that moved the money.
    pub transaction_id: TransactionId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Input for a transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransfer {
    /// Source account.
    pub from_account_id: AccountId,
    /// Destination account.
    pub to_account_id: AccountId,
    /// Positive amount.
    pub amount: Decimal,
    /// Accounting date.
    pub transfer_date: NaiveDate,
    /// Memo.
    #[serde(default)]
    pub memo: Option<String>,
}

/// Direction of a payment relative to the business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentDirection {
    /// Money in: debit the cash account, credit the allocations.
    Received,
    /// Money out: debit the allocations, credit the cash account.
    Disbursed,
}

impl PaymentDirection {
    /// Persisted representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Disbursed => "disbursed",
        }
    }
}

/// How a payment was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash.
    Cash,
    /// Cheque.
    Cheque,
    /// Bank transfer or e-transfer.
    BankTransfer,
    /// Company credit card, recorded without the gateway.
    CreditCard,
    /// Card charged online through the payment gateway.
    Card,
}

impl PaymentMethod {
    /// Persisted representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Cheque => "cheque",
            Self::BankTransfer => "bank_transfer",
            Self::CreditCard => "credit_card",
            Self::Card => "card",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = crate::ledger::LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(Self::Cash),
            "cheque" => Ok(Self::Cheque),
            "bank_transfer" => Ok(Self::BankTransfer),
            "credit_card" => Ok(Self::CreditCard),
            "card" => Ok(Self::Card),
            other => Err(crate::ledger::LedgerError::Validation(format!(
                "unknown payment method: {other}"
            ))),
        }
    }
}

impl std::str::FromStr for PaymentDirection {
    type Err = crate::ledger::LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "received" => Ok(Self::Received),
            "disbursed" => Ok(Self::Disbursed),
            other => Err(crate::ledger::LedgerError::Validation(format!(
                "unknown payment direction: {other}"
            ))),
        }
    }
}

/// Share of a payment posted against one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAllocation {
    /// Counter account (receivable, income, tax, ...).
    pub account_id: AccountId,
    /// Positive amount.
    pub amount: Decimal,
    /// Line description.
    #[serde(default)]
    pub description: Option<String>,
}

/// A recorded payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Payment ID.
    pub id: PaymentId,
    /// In or out.
    pub direction: PaymentDirection,
    /// Accounting date.
    pub payment_date: NaiveDate,
    /// Total amount.
    pub amount: Decimal,
    /// Payment method.
    pub payment_method: PaymentMethod,
    /// Cheque number, e-transfer reference.
    pub reference_number: Option<String>,
    /// Memo.
    pub memo: Option<String>,
    /// Bank or undeposited-funds account.
    pub cash_account_id: AccountId,
    /// Counter lines, summing to `amount`.
    pub allocations: Vec<PaymentAllocation>,
    /// Gateway capture reference for card payments.
    pub gateway_reference: Option<String>,
    /// Posting.
    pub transaction_id: TransactionId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Input for a payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPayment {
    /// In or out.
    pub direction: PaymentDirection,
    /// Accounting date.
    pub payment_date: NaiveDate,
    /// Total amount.
    pub amount: Decimal,
    /// Payment method.
    pub payment_method: PaymentMethod,
    /// Reference number.
    #[serde(default)]
    pub reference_number: Option<String>,
    /// Memo.
    #[serde(default)]
    pub memo: Option<String>,
    /// Bank or undeposited-funds account.
    pub cash_account_id: AccountId,
    /// Counter lines.
    pub allocations: Vec<PaymentAllocation>,
}

impl NewPayment {
    /// Only money coming in by card goes through the gateway.
    #[must_use]
    pub fn requires_capture(&self) -> bool {
        self.direction == PaymentDirection::Received && self.payment_method == PaymentMethod::Card
    }
}

/// A recorded expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    /// Expense ID.
    pub id: ExpenseId,
    /// Who was paid.
    pub payee_name: Option<String>,
    /// Accounting date.
    pub expense_date: NaiveDate,
    /// Account debited with the subtotal.
    pub expense_account_id: AccountId,
    /// Bank or card account credited with the total.
    pub payment_account_id: AccountId,
    /// Amount before tax.
    pub subtotal: Decimal,
    /// Recoverable sales tax.
    pub tax_amount: Decimal,
    /// Subtotal plus tax.
    pub total: Decimal,
    /// Memo.
    pub memo: Option<String>,
    /// Posting.
    pub transaction_id: TransactionId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Set when deleted; the row stays.
    pub deleted_at: Option<DateTime<Utc>>,
    /// Posting that reversed this expense on deletion.
    pub reversal_transaction_id: Option<TransactionId>,
}

impl Expense {
    /// Whether the expense has been deleted.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Input for an expense.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewExpense {
    /// Who was paid.
    #[serde(default)]
    pub payee_name: Option<String>,
    /// Accounting date.
    pub expense_date: NaiveDate,
    /// Expense account.
    pub expense_account_id: AccountId,
    /// Bank or card account.
    pub payment_account_id: AccountId,
    /// Amount before tax.
    pub subtotal: Decimal,
    /// Recoverable sales tax.
    #[serde(default)]
    pub tax_amount: Decimal,
    /// Memo.
    #[serde(default)]
    pub memo: Option<String>,
}

/// Ledger effect of a customer invoice.
///
/// Only the posting is kept; invoice line items live elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInvoice {
    /// Invoice number, used in the entry memo.
    pub invoice_number: String,
    /// Accounting date.
    pub invoice_date: NaiveDate,
    /// Accounts Receivable account debited with the total.
    pub receivable_account_id: AccountId,
    /// Income account credited with the subtotal.
    pub income_account_id: AccountId,
    /// Amount before tax.
    pub subtotal: Decimal,
    /// Sales tax charged, owed to the tax authority.
    #[serde(default)]
    pub tax_amount: Decimal,
    /// Memo.
    #[serde(default)]
    pub memo: Option<String>,
}

/// Ledger effect of a supplier bill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBill {
    /// Supplier's bill number, used in the entry memo.
    pub bill_number: String,
    /// Accounting date.
    pub bill_date: NaiveDate,
    /// Accounts Payable account credited with the total.
    pub payable_account_id: AccountId,
    /// Expense or asset account debited with the subtotal.
    pub expense_account_id: AccountId,
    /// Amount before tax.
    pub subtotal: Decimal,
    /// Recoverable sales tax.
    #[serde(default)]
    pub tax_amount: Decimal,
    /// Memo.
    #[serde(default)]
    pub memo: Option<String>,
}

/// Payment of one or more supplier bills.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBillPayment {
    /// Accounting date.
    pub payment_date: NaiveDate,
    /// Accounts Payable account debited.
    pub payable_account_id: AccountId,
    /// Bank or card account credited.
    pub payment_account_id: AccountId,
    /// Positive amount.
    pub amount: Decimal,
    /// Cheque or confirmation number.
    #[serde(default)]
    pub reference_number: Option<String>,
    /// Memo.
    #[serde(default)]
    pub memo: Option<String>,
}

/// Result of a bulk expense deletion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkDeleteOutcome {
    /// Expenses deleted and reversed.
    pub deleted: Vec<Expense>,
    /// Expenses that could not be deleted.
    pub failed: Vec<FailedDeletion>,
}

/// One expense a bulk deletion skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedDeletion {
    /// Expense ID.
    pub expense_id: ExpenseId,
    /// Error code.
    pub error: String,
    /// Error message.
    pub message: String,
}
