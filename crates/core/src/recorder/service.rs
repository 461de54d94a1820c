//! Transfers, payments, expenses, invoices and bills.
//!
//! Each operation turns a business document into journal lines and commits
//! both through the posting engine in one storage transaction.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tally_shared::types::{AccountId, ExpenseId, PaymentId, TransactionId, TransferId, is_cent_precise};
use tracing::{info, warn};

use super::types::{
    BulkDeleteOutcome, Expense, FailedDeletion, NewBill, NewBillPayment, NewExpense, NewInvoice,
    NewPayment, NewTransfer, Payment, PaymentDirection, Transfer,
};
use crate::accounts::{AccountService, GST_HST_PAYABLE, GST_HST_RECEIVABLE};
use crate::gateway::{CaptureRequest, PaymentGateway, commit_or_compensate};
use crate::ledger::{
    AccountType, JournalTransaction, LedgerError, PostingEngine, PostingLine, PostingRequest,
    SourceKind, check_amount, validate_lines,
};
use crate::store::PostingDocument;

/// Records money movements as balanced journal transactions.
#[derive(Clone)]
pub struct Recorder {
    engine: PostingEngine,
    accounts: AccountService,
    gateway: Arc<dyn PaymentGateway>,
    currency: String,
}

impl Recorder {
    /// Creates a recorder.
    #[must_use]
    pub fn new(
        engine: PostingEngine,
        accounts: AccountService,
        gateway: Arc<dyn PaymentGateway>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            accounts,
            gateway,
            currency: currency.into(),
        }
    }

    /// Moves `amount` from one account to another.
    ///
    /// Credits the source and debits the destination. Account-type
    /// restrictions are the caller's concern.
    pub async fn transfer(&self, input: NewTransfer) -> Result<Transfer, LedgerError> {
        if input.from_account_id == input.to_account_id {
            return Err(LedgerError::SameAccountTransfer);
        }
        check_amount(input.amount)?;

        let transaction_id = TransactionId::new();
        let transfer = Transfer {
            id: TransferId::new(),
            from_account_id: input.from_account_id,
            to_account_id: input.to_account_id,
            amount: input.amount,
            transfer_date: input.transfer_date,
            memo: input.memo,
            transaction_id,
            created_at: Utc::now(),
        };

        let mut request = PostingRequest::new(
            transfer.transfer_date,
            SourceKind::Transfer,
            vec![
                PostingLine::credit(transfer.from_account_id, transfer.amount),
                PostingLine::debit(transfer.to_account_id, transfer.amount),
            ],
        );
        request.memo = Some(
            transfer
                .memo
                .clone()
                .unwrap_or_else(|| "Transfer".to_string()),
        );

        self.engine
            .post_with_document(
                transaction_id,
                request,
                Some(PostingDocument::Transfer(transfer.clone())),
            )
            .await?;

        info!(transfer_id = %transfer.id, amount = %transfer.amount, "Transfer recorded");
        Ok(transfer)
    }

    /// Records a payment against its allocations.
    ///
    /// Card payments received are captured at the gateway first. If the
    /// posting fails afterwards the capture is refunded before the error is
    /// returned.
    pub async fn record_payment(&self, input: NewPayment) -> Result<Payment, LedgerError> {
        if input.allocations.is_empty() {
            return Err(LedgerError::Validation(
                "payment needs at least one allocation".into(),
            ));
        }
        check_amount(input.amount)?;

        let lines = payment_lines(&input);
        // Refuse bad input before any money moves.
        validate_lines(&lines)?;

        let transaction_id = TransactionId::new();
        let mut payment = Payment {
            id: PaymentId::new(),
            direction: input.direction,
            payment_date: input.payment_date,
            amount: input.amount,
            payment_method: input.payment_method,
            reference_number: input.reference_number.clone(),
            memo: input.memo.clone(),
            cash_account_id: input.cash_account_id,
            allocations: input.allocations.clone(),
            gateway_reference: None,
            transaction_id,
            created_at: Utc::now(),
        };
        let mut request = PostingRequest::new(input.payment_date, SourceKind::Payment, lines);
        request.memo = input.memo.clone();

        if !input.requires_capture() {
            self.engine
                .post_with_document(
                    transaction_id,
                    request,
                    Some(PostingDocument::Payment(payment.clone())),
                )
                .await?;
            info!(payment_id = %payment.id, amount = %payment.amount, "Payment recorded");
            return Ok(payment);
        }

        let capture = self
            .gateway
            .capture(&CaptureRequest {
                amount: input.amount,
                currency: self.currency.clone(),
                reference: payment.id.to_string(),
                description: input.memo.clone(),
            })
            .await?;
        payment.gateway_reference = Some(capture.reference.clone());

        commit_or_compensate(
            self.gateway.as_ref(),
            &capture,
            self.engine.post_with_document(
                transaction_id,
                request,
                Some(PostingDocument::Payment(payment.clone())),
            ),
        )
        .await?;

        info!(
            payment_id = %payment.id,
            amount = %payment.amount,
            capture_reference = %capture.reference,
            "Card payment captured and recorded"
        );
        Ok(payment)
    }

    /// Records an expense.
    ///
    /// Debits the expense account with the subtotal and GST/HST Receivable
    /// with the tax, and credits the payment account with the total.
    pub async fn record_expense(&self, input: NewExpense) -> Result<Expense, LedgerError> {
        let total = taxed_total(input.subtotal, input.tax_amount)?;
        let mut lines = vec![
            PostingLine::debit(input.expense_account_id, input.subtotal)
                .with_description(input.payee_name.clone().unwrap_or_else(|| "Expense".into())),
        ];
        if !input.tax_amount.is_zero() {
            let tax_account = self
                .accounts
                .find_or_create_system_account(GST_HST_RECEIVABLE)
                .await?;
            lines.push(
                PostingLine::debit(tax_account.id, input.tax_amount).with_description("GST/HST"),
            );
        }
        lines.push(PostingLine::credit(input.payment_account_id, total));

        let transaction_id = TransactionId::new();
        let expense = Expense {
            id: ExpenseId::new(),
            payee_name: input.payee_name,
            expense_date: input.expense_date,
            expense_account_id: input.expense_account_id,
            payment_account_id: input.payment_account_id,
            subtotal: input.subtotal,
            tax_amount: input.tax_amount,
            total,
            memo: input.memo,
            transaction_id,
            created_at: Utc::now(),
            deleted_at: None,
            reversal_transaction_id: None,
        };

        let mut request = PostingRequest::new(expense.expense_date, SourceKind::Expense, lines);
        request.memo = expense.memo.clone();
        self.engine
            .post_with_document(
                transaction_id,
                request,
                Some(PostingDocument::Expense(expense.clone())),
            )
            .await?;

        info!(expense_id = %expense.id, total = %expense.total, "Expense recorded");
        Ok(expense)
    }

    /// Records the ledger effect of a customer invoice.
    ///
    /// Debits Accounts Receivable with the total, credits the income account
    /// with the subtotal and GST/HST Payable with the tax.
    pub async fn record_invoice(&self, input: NewInvoice) -> Result<JournalTransaction, LedgerError> {
        let total = taxed_total(input.subtotal, input.tax_amount)?;
        self.expect_account(input.receivable_account_id, "invoice receivable", |t| {
            t == AccountType::AccountsReceivable
        })
        .await?;
        self.expect_account(input.income_account_id, "invoice income", |t| {
            matches!(t, AccountType::Income | AccountType::OtherIncome)
        })
        .await?;

        let mut lines = vec![
            PostingLine::debit(input.receivable_account_id, total),
            PostingLine::credit(input.income_account_id, input.subtotal),
        ];
        if !input.tax_amount.is_zero() {
            let tax_account = self
                .accounts
                .find_or_create_system_account(GST_HST_PAYABLE)
                .await?;
            lines.push(
                PostingLine::credit(tax_account.id, input.tax_amount).with_description("GST/HST"),
            );
        }

        let mut request = PostingRequest::new(input.invoice_date, SourceKind::Invoice, lines);
        request.memo = Some(
            input
                .memo
                .unwrap_or_else(|| format!("Invoice {}", input.invoice_number)),
        );
        let transaction = self.engine.post(request).await?;

        info!(
            invoice_number = %input.invoice_number,
            entry_number = %transaction.entry_number,
            total = %total,
            "Invoice recorded"
        );
        Ok(transaction)
    }

    /// Records the ledger effect of a supplier bill.
    ///
    /// Debits the expense account with the subtotal and GST/HST Receivable
    /// with the tax, and credits Accounts Payable with the total.
    pub async fn record_bill(&self, input: NewBill) -> Result<JournalTransaction, LedgerError> {
        let total = taxed_total(input.subtotal, input.tax_amount)?;
        self.expect_account(input.payable_account_id, "bill payable", |t| {
            t == AccountType::AccountsPayable
        })
        .await?;

        let mut lines = vec![PostingLine::debit(input.expense_account_id, input.subtotal)];
        if !input.tax_amount.is_zero() {
            let tax_account = self
                .accounts
                .find_or_create_system_account(GST_HST_RECEIVABLE)
                .await?;
            lines.push(
                PostingLine::debit(tax_account.id, input.tax_amount).with_description("GST/HST"),
            );
        }
        lines.push(PostingLine::credit(input.payable_account_id, total));

        let mut request = PostingRequest::new(input.bill_date, SourceKind::Bill, lines);
        request.memo = Some(
            input
                .memo
                .unwrap_or_else(|| format!("Bill {}", input.bill_number)),
        );
        let transaction = self.engine.post(request).await?;

        info!(
            bill_number = %input.bill_number,
            entry_number = %transaction.entry_number,
            total = %total,
            "Bill recorded"
        );
        Ok(transaction)
    }

    /// Pays down Accounts Payable from a bank or card account.
    pub async fn record_bill_payment(
        &self,
        input: NewBillPayment,
    ) -> Result<JournalTransaction, LedgerError> {
        check_amount(input.amount)?;
        self.expect_account(input.payable_account_id, "bill payment payable", |t| {
            t == AccountType::AccountsPayable
        })
        .await?;
        self.expect_account(input.payment_account_id, "bill payment source", AccountType::is_bank_like)
            .await?;

        let mut request = PostingRequest::new(
            input.payment_date,
            SourceKind::BillPayment,
            vec![
                PostingLine::debit(input.payable_account_id, input.amount),
                PostingLine::credit(input.payment_account_id, input.amount),
            ],
        );
        request.memo = input.memo.or_else(|| {
            Some(match &input.reference_number {
                Some(reference) => format!("Bill payment {reference}"),
                None => "Bill payment".to_string(),
            })
        });
        let transaction = self.engine.post(request).await?;

        info!(
            entry_number = %transaction.entry_number,
            amount = %input.amount,
            "Bill payment recorded"
        );
        Ok(transaction)
    }

    /// Deletes expenses by reversing their postings, dated `reversal_date`.
    ///
    /// Unknown or already deleted expenses are reported in `failed`; only
    /// storage failures abort the batch.
    pub async fn delete_expenses(
        &self,
        ids: &[ExpenseId],
        reversal_date: NaiveDate,
    ) -> Result<BulkDeleteOutcome, LedgerError> {
        let mut outcome = BulkDeleteOutcome::default();
        for &expense_id in ids {
            match self.delete_expense(expense_id, reversal_date).await {
                Ok(expense) => outcome.deleted.push(expense),
                Err(e @ LedgerError::Storage(_)) => return Err(e),
                Err(e) => {
                    warn!(expense_id = %expense_id, error = %e, "Expense not deleted");
                    outcome.failed.push(FailedDeletion {
                        expense_id,
                        error: e.error_code().to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }
        Ok(outcome)
    }

    async fn delete_expense(
        &self,
        expense_id: ExpenseId,
        reversal_date: NaiveDate,
    ) -> Result<Expense, LedgerError> {
        let expense = self
            .engine
            .store()
            .get_expense(expense_id)
            .await?
            .ok_or(LedgerError::ExpenseNotFound(expense_id))?;
        if expense.is_deleted() {
            return Err(LedgerError::ExpenseAlreadyDeleted(expense_id));
        }

        let deleted_at = Utc::now();
        let reversal = self
            .engine
            .reverse_with_document(
                expense.transaction_id,
                "Expense deleted",
                reversal_date,
                Some(PostingDocument::ExpenseDeletion {
                    expense_id,
                    deleted_at,
                }),
            )
            .await?;

        Ok(Expense {
            deleted_at: Some(deleted_at),
            reversal_transaction_id: Some(reversal.id),
            ..expense
        })
    }

    /// Lists transfers, newest first.
    pub async fn transfers(&self) -> Result<Vec<Transfer>, LedgerError> {
        self.engine.store().list_transfers().await
    }

    /// Lists payments, newest first.
    pub async fn payments(&self) -> Result<Vec<Payment>, LedgerError> {
        self.engine.store().list_payments().await
    }

    /// Lists expenses, newest first.
    pub async fn expenses(&self, include_deleted: bool) -> Result<Vec<Expense>, LedgerError> {
        self.engine.store().list_expenses(include_deleted).await
    }

    async fn expect_account(
        &self,
        id: AccountId,
        role: &str,
        accepts: fn(AccountType) -> bool,
    ) -> Result<(), LedgerError> {
        let account = self.accounts.get(id).await?;
        if accepts(account.account_type) {
            Ok(())
        } else {
            Err(LedgerError::Validation(format!(
                "'{}' is a {} account and cannot be the {role} account",
                account.name, account.account_type
            )))
        }
    }
}

/// Subtotal plus tax, refusing negative or sub-cent tax and unstorable sums.
fn taxed_total(subtotal: Decimal, tax_amount: Decimal) -> Result<Decimal, LedgerError> {
    check_amount(subtotal)?;
    if tax_amount.is_sign_negative() {
        return Err(LedgerError::Validation("tax amount cannot be negative".into()));
    }
    if !is_cent_precise(tax_amount) {
        return Err(LedgerError::SubCentAmount(tax_amount));
    }
    let total = subtotal
        .checked_add(tax_amount)
        .ok_or(LedgerError::AmountOutOfRange(tax_amount))?;
    check_amount(total)?;
    Ok(total)
}

/// Cash line first, then one line per allocation on the opposite side.
fn payment_lines(input: &NewPayment) -> Vec<PostingLine> {
    type Side = fn(AccountId, Decimal) -> PostingLine;
    let (cash_line, allocation_line): (Side, Side) = match input.direction {
        PaymentDirection::Received => (PostingLine::debit, PostingLine::credit),
        PaymentDirection::Disbursed => (PostingLine::credit, PostingLine::debit),
    };

    let mut lines = Vec::with_capacity(input.allocations.len() + 1);
    lines.push(cash_line(input.cash_account_id, input.amount));
    lines.extend(input.allocations.iter().map(|allocation| {
        let line = allocation_line(allocation.account_id, allocation.amount);
        match &allocation.description {
            Some(description) => line.with_description(description.clone()),
            None => line,
        }
    }));
    lines
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
