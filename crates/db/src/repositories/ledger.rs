//! PostgreSQL ledger store.
//!
//! Each posting runs in one database transaction: referenced accounts are
//! share-locked while validated, the entry number comes from a locked counter
//! row, and header, lines and source document are written before commit. The
//! deferred balance trigger re-checks the lines at commit time.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Func, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbBackend, DbErr,
    EntityTrait, FromQueryResult, QueryFilter, QueryOrder, QuerySelect, Set, Statement,
    TransactionTrait,
};
use tally_core::ledger::{
    Account, AccountInfo, JournalLine, JournalTransaction, LedgerError, format_entry_number,
    validate_posting,
};
use tally_core::recorder::{Expense, Payment, Transfer};
use tally_core::store::{
    AccountFilter, AccountTotals, LedgerStore, Posting, PostingDocument, TotalsQuery,
    TransactionFilter, sort_accounts,
};
use tally_shared::types::{AccountId, ExpenseId, JournalLineId, TransactionId};
use uuid::Uuid;

use super::mapping::{
    account_from_model, account_to_active, db_error, expense_from_model, expense_to_active,
    line_from_model, line_to_active, payment_from_model, payment_to_active, transaction_from_model,
    transaction_to_active, transfer_from_model, transfer_to_active, unique_violation,
};
use crate::entities::{accounts, expenses, journal_lines, journal_transactions, payments, transfers};

const NEXT_ENTRY_NUMBER_SQL: &str = "UPDATE ledger_counters SET value = value + 1 \
     WHERE name = 'journal_entry' RETURNING value";

const ACCOUNT_NAME_INDEX: &str = "idx_accounts_name_lower";
const REVERSAL_INDEX: &str = "idx_journal_transactions_reverses";

#[derive(Debug, FromQueryResult)]
struct Counter {
    value: i64,
}

#[derive(Debug, FromQueryResult)]
struct TotalsRow {
    account_id: Uuid,
    debit_total: Decimal,
    credit_total: Decimal,
}

/// Ledger store backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct SeaLedgerStore {
    db: DatabaseConnection,
}

impl SeaLedgerStore {
    /// Creates a new store on an open connection pool.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The underlying connection pool.
    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Maps an account write error, naming the account on a name collision.
    fn account_write_error(err: DbErr, name: &str) -> LedgerError {
        match unique_violation(&err) {
            Some(message) if message.contains(ACCOUNT_NAME_INDEX) => {
                LedgerError::DuplicateAccountName(name.to_string())
            }
            _ => db_error(err),
        }
    }

    async fn lines_for(
        &self,
        transaction_ids: Vec<Uuid>,
    ) -> Result<HashMap<Uuid, Vec<JournalLine>>, LedgerError> {
        let models = journal_lines::Entity::find()
            .filter(journal_lines::Column::TransactionId.is_in(transaction_ids))
            .order_by_asc(journal_lines::Column::TransactionId)
            .order_by_asc(journal_lines::Column::LineNo)
            .all(&self.db)
            .await
            .map_err(db_error)?;

        let mut grouped: HashMap<Uuid, Vec<JournalLine>> = HashMap::new();
        for model in models {
            grouped
                .entry(model.transaction_id)
                .or_default()
                .push(line_from_model(model));
        }
        Ok(grouped)
    }

    async fn next_entry_number(txn: &DatabaseTransaction) -> Result<String, LedgerError> {
        let counter = Counter::find_by_statement(Statement::from_string(
            DbBackend::Postgres,
            NEXT_ENTRY_NUMBER_SQL,
        ))
        .one(txn)
        .await
        .map_err(db_error)?
        .ok_or_else(|| LedgerError::Storage("journal entry counter is missing".to_string()))?;
        Ok(format_entry_number(counter.value))
    }

    async fn check_document(
        txn: &DatabaseTransaction,
        document: Option<&PostingDocument>,
    ) -> Result<(), LedgerError> {
        let Some(PostingDocument::ExpenseDeletion { expense_id, .. }) = document else {
            return Ok(());
        };
        let expense = expenses::Entity::find_by_id(expense_id.into_inner())
            .lock_exclusive()
            .one(txn)
            .await
            .map_err(db_error)?
            .ok_or(LedgerError::ExpenseNotFound(*expense_id))?;
        if expense.deleted_at.is_some() {
            return Err(LedgerError::ExpenseAlreadyDeleted(*expense_id));
        }
        Ok(())
    }

    async fn write_document(
        txn: &DatabaseTransaction,
        document: PostingDocument,
        transaction_id: TransactionId,
    ) -> Result<(), LedgerError> {
        match document {
            PostingDocument::Transfer(transfer) => {
                transfer_to_active(&transfer).insert(txn).await.map_err(db_error)?;
            }
            PostingDocument::Payment(payment) => {
                payment_to_active(&payment)?.insert(txn).await.map_err(db_error)?;
            }
            PostingDocument::Expense(expense) => {
                expense_to_active(&expense).insert(txn).await.map_err(db_error)?;
            }
            PostingDocument::ExpenseDeletion {
                expense_id,
                deleted_at,
            } => {
                let active = expenses::ActiveModel {
                    id: Set(expense_id.into_inner()),
                    deleted_at: Set(Some(deleted_at.into())),
                    reversal_transaction_id: Set(Some(transaction_id.into_inner())),
                    ..Default::default()
                };
                active.update(txn).await.map_err(db_error)?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for SeaLedgerStore {
    async fn insert_account(&self, account: Account) -> Result<Account, LedgerError> {
        let model = account_to_active(&account)
            .insert(&self.db)
            .await
            .map_err(|e| Self::account_write_error(e, &account.name))?;
        account_from_model(model)
    }

    async fn update_account(&self, account: Account) -> Result<Account, LedgerError> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let Some(existing) = accounts::Entity::find_by_id(account.id.into_inner())
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_error)?
        else {
            return Err(LedgerError::AccountNotFound(account.id));
        };

        let model = account_to_active(&account)
            .update(&txn)
            .await
            .map_err(|e| Self::account_write_error(e, &account.name))?;

        // Sub-accounts follow a renamed parent.
        let old_name = existing.name.to_lowercase();
        if old_name != account.name.to_lowercase() {
            let moved = accounts::Entity::update_many()
                .col_expr(accounts::Column::ParentName, Expr::value(account.name.clone()))
                .col_expr(accounts::Column::UpdatedAt, Expr::value(model.updated_at))
                .filter(Expr::expr(Func::lower(Expr::col(accounts::Column::ParentName))).eq(old_name))
                .exec(&txn)
                .await
                .map_err(db_error)?;
            if moved.rows_affected > 0 {
                tracing::debug!(
                    account_id = %account.id,
                    sub_accounts = moved.rows_affected,
                    "Sub-accounts moved to renamed parent"
                );
            }
        }

        txn.commit().await.map_err(db_error)?;
        account_from_model(model)
    }

    async fn get_account(&self, id: AccountId) -> Result<Option<Account>, LedgerError> {
        accounts::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_error)?
            .map(account_from_model)
            .transpose()
    }

    async fn find_account_by_name(&self, name: &str) -> Result<Option<Account>, LedgerError> {
        accounts::Entity::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(accounts::Column::Name)))
                    .eq(name.trim().to_lowercase()),
            )
            .one(&self.db)
            .await
            .map_err(db_error)?
            .map(account_from_model)
            .transpose()
    }

    async fn list_accounts(&self, filter: &AccountFilter) -> Result<Vec<Account>, LedgerError> {
        let mut query = accounts::Entity::find();
        if let Some(account_type) = filter.account_type {
            query = query.filter(accounts::Column::AccountType.eq(account_type.as_str()));
        }
        if let Some(active) = filter.active {
            query = query.filter(accounts::Column::IsActive.eq(active));
        }

        let mut accounts = query
            .all(&self.db)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(account_from_model)
            .collect::<Result<Vec<_>, _>>()?;
        // Type order is the enum's, not the column's collation.
        sort_accounts(&mut accounts);
        Ok(accounts)
    }

    async fn account_has_postings(&self, id: AccountId) -> Result<bool, LedgerError> {
        let line = journal_lines::Entity::find()
            .filter(journal_lines::Column::AccountId.eq(id.into_inner()))
            .one(&self.db)
            .await
            .map_err(db_error)?;
        Ok(line.is_some())
    }

    async fn commit_posting(&self, posting: Posting) -> Result<JournalTransaction, LedgerError> {
        let Posting {
            transaction_id,
            request,
            document,
        } = posting;

        let txn = self.db.begin().await.map_err(db_error)?;

        // Share-lock referenced accounts so none is deactivated mid-posting.
        let mut ids: Vec<Uuid> = request.lines.iter().map(|l| l.account_id.into_inner()).collect();
        ids.sort_unstable();
        ids.dedup();
        let referenced: HashMap<AccountId, AccountInfo> = accounts::Entity::find()
            .filter(accounts::Column::Id.is_in(ids))
            .lock_shared()
            .all(&txn)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(account_from_model)
            .map(|account| account.map(|a| (a.id, AccountInfo::from(&a))))
            .collect::<Result<_, _>>()?;

        validate_posting(&request.lines, |id| referenced.get(&id).copied())?;

        if let Some(original) = request.reverses {
            let existing = journal_transactions::Entity::find()
                .filter(journal_transactions::Column::Reverses.eq(original.into_inner()))
                .one(&txn)
                .await
                .map_err(db_error)?;
            if existing.is_some() {
                return Err(LedgerError::AlreadyReversed(original));
            }
        }

        Self::check_document(&txn, document.as_ref()).await?;

        let lines: Vec<JournalLine> = request
            .lines
            .iter()
            .zip(1..)
            .map(|(line, line_no)| JournalLine {
                id: JournalLineId::new(),
                transaction_id,
                line_no,
                account_id: line.account_id,
                entry_date: request.entry_date,
                amount: line.signed_amount(),
                description: line.description.clone(),
            })
            .collect();

        let transaction = JournalTransaction {
            id: transaction_id,
            entry_number: Self::next_entry_number(&txn).await?,
            entry_date: request.entry_date,
            memo: request.memo,
            source: request.source,
            reverses: request.reverses,
            created_at: Utc::now(),
            lines,
        };

        transaction_to_active(&transaction)
            .insert(&txn)
            .await
            .map_err(|e| match (unique_violation(&e), transaction.reverses) {
                (Some(message), Some(original)) if message.contains(REVERSAL_INDEX) => {
                    LedgerError::AlreadyReversed(original)
                }
                _ => db_error(e),
            })?;

        journal_lines::Entity::insert_many(transaction.lines.iter().map(line_to_active))
            .exec_without_returning(&txn)
            .await
            .map_err(db_error)?;

        if let Some(document) = document {
            Self::write_document(&txn, document, transaction_id).await?;
        }

        txn.commit().await.map_err(db_error)?;

        tracing::debug!(
            transaction_id = %transaction.id,
            entry_number = %transaction.entry_number,
            lines = transaction.lines.len(),
            "Committed journal transaction"
        );

        Ok(transaction)
    }

    async fn get_transaction(
        &self,
        id: TransactionId,
    ) -> Result<Option<JournalTransaction>, LedgerError> {
        let Some(header) = journal_transactions::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_error)?
        else {
            return Ok(None);
        };

        let mut lines = self.lines_for(vec![header.id]).await?;
        let lines = lines.remove(&header.id).unwrap_or_default();
        transaction_from_model(header, lines).map(Some)
    }

    async fn list_transactions(
        &self,
        filter: &TransactionFilter,
    ) -> Result<Vec<JournalTransaction>, LedgerError> {
        let mut query = journal_transactions::Entity::find();
        if let Some(from) = filter.from {
            query = query.filter(journal_transactions::Column::EntryDate.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(journal_transactions::Column::EntryDate.lte(to));
        }
        if let Some(source) = filter.source {
            query = query.filter(journal_transactions::Column::Source.eq(source.as_str()));
        }
        if let Some(account_id) = filter.account_id {
            query = query.filter(
                journal_transactions::Column::Id.in_subquery(
                    Query::select()
                        .column(journal_lines::Column::TransactionId)
                        .from(journal_lines::Entity)
                        .and_where(journal_lines::Column::AccountId.eq(account_id.into_inner()))
                        .to_owned(),
                ),
            );
        }

        // Entry numbers are zero-padded, so shorter ones sort first.
        let headers = query
            .order_by_asc(journal_transactions::Column::EntryDate)
            .order_by_asc(Expr::cust("length(entry_number)"))
            .order_by_asc(journal_transactions::Column::EntryNumber)
            .all(&self.db)
            .await
            .map_err(db_error)?;
        if headers.is_empty() {
            return Ok(Vec::new());
        }

        let mut lines = self
            .lines_for(headers.iter().map(|h| h.id).collect())
            .await?;
        headers
            .into_iter()
            .map(|header| {
                let own = lines.remove(&header.id).unwrap_or_default();
                transaction_from_model(header, own)
            })
            .collect()
    }

    async fn account_totals(&self, query: &TotalsQuery) -> Result<Vec<AccountTotals>, LedgerError> {
        let mut select = journal_lines::Entity::find()
            .select_only()
            .column(journal_lines::Column::AccountId)
            .column_as(
                Expr::cust("COALESCE(SUM(CASE WHEN amount > 0 THEN amount ELSE 0 END), 0)"),
                "debit_total",
            )
            .column_as(
                Expr::cust("COALESCE(SUM(CASE WHEN amount < 0 THEN -amount ELSE 0 END), 0)"),
                "credit_total",
            )
            .filter(journal_lines::Column::EntryDate.lte(query.to));
        if let Some(from) = query.from {
            select = select.filter(journal_lines::Column::EntryDate.gte(from));
        }
        if let Some(account_id) = query.account_id {
            select = select.filter(journal_lines::Column::AccountId.eq(account_id.into_inner()));
        }

        let rows = select
            .group_by(journal_lines::Column::AccountId)
            .into_model::<TotalsRow>()
            .all(&self.db)
            .await
            .map_err(db_error)?;

        Ok(rows
            .into_iter()
            .map(|row| AccountTotals {
                account_id: row.account_id.into(),
                debit_total: row.debit_total,
                credit_total: row.credit_total,
            })
            .collect())
    }

    async fn list_transfers(&self) -> Result<Vec<Transfer>, LedgerError> {
        Ok(transfers::Entity::find()
            .order_by_desc(transfers::Column::TransferDate)
            .order_by_desc(transfers::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(transfer_from_model)
            .collect())
    }

    async fn list_payments(&self) -> Result<Vec<Payment>, LedgerError> {
        payments::Entity::find()
            .order_by_desc(payments::Column::PaymentDate)
            .order_by_desc(payments::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(payment_from_model)
            .collect()
    }

    async fn list_expenses(&self, include_deleted: bool) -> Result<Vec<Expense>, LedgerError> {
        let mut query = expenses::Entity::find();
        if !include_deleted {
            query = query.filter(expenses::Column::DeletedAt.is_null());
        }
        Ok(query
            .order_by_desc(expenses::Column::ExpenseDate)
            .order_by_desc(expenses::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(expense_from_model)
            .collect())
    }

    async fn get_expense(&self, id: ExpenseId) -> Result<Option<Expense>, LedgerError> {
        Ok(expenses::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_error)?
            .map(expense_from_model))
    }
}
