//! Conversions between `SeaORM` models and ledger types.

use chrono::Utc;
use sea_orm::{DbErr, RuntimeErr, Set, SqlErr};
use tally_core::ledger::{Account, JournalLine, JournalTransaction, LedgerError};
use tally_core::recorder::{Expense, Payment, Transfer};

use crate::entities::{accounts, expenses, journal_lines, journal_transactions, payments, transfers};

/// SQLSTATE of a database error, when the driver reported one.
pub(crate) fn sqlstate(err: &DbErr) -> Option<String> {
    let runtime = match err {
        DbErr::Exec(e) | DbErr::Query(e) | DbErr::Conn(e) => e,
        _ => return None,
    };
    match runtime {
        RuntimeErr::SqlxError(sqlx::Error::Database(db)) => db.code().map(|c| c.into_owned()),
        _ => None,
    }
}

/// Message of a unique-constraint violation.
pub(crate) fn unique_violation(err: &DbErr) -> Option<String> {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(message)) => Some(message),
        _ => None,
    }
}

/// Maps a database error to the ledger taxonomy.
///
/// Serialization failures, deadlocks and lost uniqueness races become
/// `ConcurrencyConflict`; everything else is `Storage`.
pub(crate) fn db_error(err: DbErr) -> LedgerError {
    if matches!(sqlstate(&err).as_deref(), Some("40001" | "40P01")) {
        return LedgerError::ConcurrencyConflict(err.to_string());
    }
    if let Some(message) = unique_violation(&err) {
        return LedgerError::ConcurrencyConflict(message);
    }
    LedgerError::Storage(err.to_string())
}

pub(crate) fn account_from_model(model: accounts::Model) -> Result<Account, LedgerError> {
    Ok(Account {
        id: model.id.into(),
        account_type: model.account_type.parse()?,
        name: model.name,
        detail_type: model.detail_type,
        account_number: model.account_number,
        description: model.description,
        is_active: model.is_active,
        is_sub_account: model.is_sub_account,
        parent_name: model.parent_name,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

pub(crate) fn account_to_active(account: &Account) -> accounts::ActiveModel {
    accounts::ActiveModel {
        id: Set(account.id.into_inner()),
        name: Set(account.name.clone()),
        account_type: Set(account.account_type.as_str().to_string()),
        detail_type: Set(account.detail_type.clone()),
        account_number: Set(account.account_number.clone()),
        description: Set(account.description.clone()),
        is_active: Set(account.is_active),
        is_sub_account: Set(account.is_sub_account),
        parent_name: Set(account.parent_name.clone()),
        created_at: Set(account.created_at.into()),
        updated_at: Set(account.updated_at.into()),
    }
}

pub(crate) fn line_from_model(model: journal_lines::Model) -> JournalLine {
    JournalLine {
        id: model.id.into(),
        transaction_id: model.transaction_id.into(),
        line_no: model.line_no,
        account_id: model.account_id.into(),
        entry_date: model.entry_date,
        amount: model.amount,
        description: model.description,
    }
}

pub(crate) fn line_to_active(line: &JournalLine) -> journal_lines::ActiveModel {
    journal_lines::ActiveModel {
        id: Set(line.id.into_inner()),
        transaction_id: Set(line.transaction_id.into_inner()),
        line_no: Set(line.line_no),
        account_id: Set(line.account_id.into_inner()),
        entry_date: Set(line.entry_date),
        amount: Set(line.amount),
        description: Set(line.description.clone()),
        created_at: Set(Utc::now().into()),
    }
}

pub(crate) fn transaction_from_model(
    model: journal_transactions::Model,
    lines: Vec<JournalLine>,
) -> Result<JournalTransaction, LedgerError> {
    Ok(JournalTransaction {
        id: model.id.into(),
        entry_number: model.entry_number,
        entry_date: model.entry_date,
        memo: model.memo,
        source: model.source.parse()?,
        reverses: model.reverses.map(Into::into),
        created_at: model.created_at.with_timezone(&Utc),
        lines,
    })
}

pub(crate) fn transaction_to_active(tx: &JournalTransaction) -> journal_transactions::ActiveModel {
    journal_transactions::ActiveModel {
        id: Set(tx.id.into_inner()),
        entry_number: Set(tx.entry_number.clone()),
        entry_date: Set(tx.entry_date),
        memo: Set(tx.memo.clone()),
        source: Set(tx.source.as_str().to_string()),
        reverses: Set(tx.reverses.map(|id| id.into_inner())),
        created_at: Set(tx.created_at.into()),
    }
}

pub(crate) fn transfer_from_model(model: transfers::Model) -> Transfer {
    Transfer {
        id: model.id.into(),
        from_account_id: model.from_account_id.into(),
        to_account_id: model.to_account_id.into(),
        amount: model.amount,
        transfer_date: model.transfer_date,
        memo: model.memo,
        transaction_id: model.transaction_id.into(),
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub(crate) fn transfer_to_active(transfer: &Transfer) -> transfers::ActiveModel {
    transfers::ActiveModel {
        id: Set(transfer.id.into_inner()),
        from_account_id: Set(transfer.from_account_id.into_inner()),
        to_account_id: Set(transfer.to_account_id.into_inner()),
        amount: Set(transfer.amount),
        transfer_date: Set(transfer.transfer_date),
        memo: Set(transfer.memo.clone()),
        transaction_id: Set(transfer.transaction_id.into_inner()),
        created_at: Set(transfer.created_at.into()),
    }
}

pub(crate) fn payment_from_model(model: payments::Model) -> Result<Payment, LedgerError> {
    Ok(Payment {
        id: model.id.into(),
        direction: model.direction.parse()?,
        payment_date: model.payment_date,
        amount: model.amount,
        payment_method: model.payment_method.parse()?,
        reference_number: model.reference_number,
        memo: model.memo,
        cash_account_id: model.cash_account_id.into(),
        allocations: serde_json::from_value(model.allocations)
            .map_err(|e| LedgerError::Storage(format!("corrupt payment allocations: {e}")))?,
        gateway_reference: model.gateway_reference,
        transaction_id: model.transaction_id.into(),
        created_at: model.created_at.with_timezone(&Utc),
    })
}

pub(crate) fn payment_to_active(payment: &Payment) -> Result<payments::ActiveModel, LedgerError> {
    let allocations = serde_json::to_value(&payment.allocations)
        .map_err(|e| LedgerError::Storage(format!("cannot encode allocations: {e}")))?;
    Ok(payments::ActiveModel {
        id: Set(payment.id.into_inner()),
        direction: Set(payment.direction.as_str().to_string()),
        payment_date: Set(payment.payment_date),
        amount: Set(payment.amount),
        payment_method: Set(payment.payment_method.as_str().to_string()),
        reference_number: Set(payment.reference_number.clone()),
        memo: Set(payment.memo.clone()),
        cash_account_id: Set(payment.cash_account_id.into_inner()),
        allocations: Set(allocations),
        gateway_reference: Set(payment.gateway_reference.clone()),
        transaction_id: Set(payment.transaction_id.into_inner()),
        created_at: Set(payment.created_at.into()),
    })
}

pub(crate) fn expense_from_model(model: expenses::Model) -> Expense {
    Expense {
        id: model.id.into(),
        payee_name: model.payee_name,
        expense_date: model.expense_date,
        expense_account_id: model.expense_account_id.into(),
        payment_account_id: model.payment_account_id.into(),
        subtotal: model.subtotal,
        tax_amount: model.tax_amount,
        total: model.total,
        memo: model.memo,
        transaction_id: model.transaction_id.into(),
        created_at: model.created_at.with_timezone(&Utc),
        deleted_at: model.deleted_at.map(|t| t.with_timezone(&Utc)),
        reversal_transaction_id: model.reversal_transaction_id.map(Into::into),
    }
}

pub(crate) fn expense_to_active(expense: &Expense) -> expenses::ActiveModel {
    expenses::ActiveModel {
        id: Set(expense.id.into_inner()),
        payee_name: Set(expense.payee_name.clone()),
        expense_date: Set(expense.expense_date),
        expense_account_id: Set(expense.expense_account_id.into_inner()),
        payment_account_id: Set(expense.payment_account_id.into_inner()),
        subtotal: Set(expense.subtotal),
        tax_amount: Set(expense.tax_amount),
        total: Set(expense.total),
        memo: Set(expense.memo.clone()),
        transaction_id: Set(expense.transaction_id.into_inner()),
        created_at: Set(expense.created_at.into()),
        deleted_at: Set(expense.deleted_at.map(Into::into)),
        reversal_transaction_id: Set(expense.reversal_transaction_id.map(|id| id.into_inner())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tally_core::accounts::new_account_record;
    use tally_core::ledger::{AccountType, NewAccount};
    use tally_core::recorder::{PaymentAllocation, PaymentDirection, PaymentMethod};
    use tally_shared::types::{AccountId, PaymentId, TransactionId};

    #[test]
    fn test_account_round_trips_through_model() {
        let account = new_account_record(
            NewAccount::new("Long Term Loan", AccountType::LongTermLiabilities).with_number("2500"),
        );
        let active = account_to_active(&account);
        let model = accounts::Model {
            id: active.id.unwrap(),
            name: active.name.unwrap(),
            account_type: active.account_type.unwrap(),
            detail_type: active.detail_type.unwrap(),
            account_number: active.account_number.unwrap(),
            description: active.description.unwrap(),
            is_active: active.is_active.unwrap(),
            is_sub_account: active.is_sub_account.unwrap(),
            parent_name: active.parent_name.unwrap(),
            created_at: active.created_at.unwrap(),
            updated_at: active.updated_at.unwrap(),
        };
        assert_eq!(model.account_type, "Long-Term Liabilities");
        assert_eq!(account_from_model(model).unwrap(), account);
    }

    #[test]
    fn test_unknown_account_type_is_rejected() {
        let account = new_account_record(NewAccount::new("Cash", AccountType::Bank));
        let active = account_to_active(&account);
        let model = accounts::Model {
            id: active.id.unwrap(),
            name: active.name.unwrap(),
            account_type: "Crypto".into(),
            detail_type: active.detail_type.unwrap(),
            account_number: None,
            description: None,
            is_active: true,
            is_sub_account: false,
            parent_name: None,
            created_at: active.created_at.unwrap(),
            updated_at: active.updated_at.unwrap(),
        };
        assert!(matches!(
            account_from_model(model),
            Err(LedgerError::InvalidAccountType(_))
        ));
    }

    #[test]
    fn test_payment_allocations_stored_as_json() {
        let payment = Payment {
            id: PaymentId::new(),
            direction: PaymentDirection::Received,
            payment_date: chrono::NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            amount: dec!(113.00),
            payment_method: PaymentMethod::BankTransfer,
            reference_number: Some("ET-991".into()),
            memo: None,
            cash_account_id: AccountId::new(),
            allocations: vec![PaymentAllocation {
                account_id: AccountId::new(),
                amount: dec!(113.00),
                description: Some("Invoice 1001".into()),
            }],
            gateway_reference: None,
            transaction_id: TransactionId::new(),
            created_at: Utc::now(),
        };
        let active = payment_to_active(&payment).unwrap();
        let json = active.allocations.clone().unwrap();
        assert_eq!(json[0]["amount"], "113.00");
        assert_eq!(active.payment_method.unwrap(), "bank_transfer");
    }

    #[test]
    fn test_non_database_errors_map_to_storage() {
        let err = db_error(DbErr::RecordNotFound("accounts".into()));
        assert!(matches!(err, LedgerError::Storage(_)));
        assert!(!err.is_retryable());
    }
}
