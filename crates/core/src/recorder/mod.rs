//! Transfer, payment, expense, invoice and bill recording.
//!
//! Every document is written in the same storage transaction as the journal
//! transaction that moves its money. Invoices and bills have no document of
//! their own; only their journal transaction is written.

pub mod service;
pub mod types;

pub use service::Recorder;
pub use types::{
    BulkDeleteOutcome, Expense, FailedDeletion, NewBill, NewBillPayment, NewExpense, NewInvoice,
    NewPayment, NewTransfer, Payment, PaymentAllocation, PaymentDirection, PaymentMethod, Transfer,
};
