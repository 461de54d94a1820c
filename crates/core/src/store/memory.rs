use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tally_shared::types::{AccountId, ExpenseId, JournalLineId, TransactionId};
use tokio::sync::RwLock;

use super::{
    AccountFilter, AccountTotals, LedgerStore, Posting, PostingDocument, TotalsQuery,
    TransactionFilter, sort_accounts,
};
use crate::ledger::{
    Account, AccountInfo, JournalLine, JournalTransaction, LedgerError, format_entry_number,
    validate_posting,
};
use crate::recorder::{Expense, Payment, Transfer};

#[derive(Debug, Default)]
struct State {
    accounts: BTreeMap<AccountId, Account>,
    transactions: Vec<JournalTransaction>,
    transfers: Vec<Transfer>,
    payments: Vec<Payment>,
    expenses: BTreeMap<ExpenseId, Expense>,
    last_entry_number: i64,
}

impl State {
    fn name_taken(&self, name: &str, except: Option<AccountId>) -> bool {
        let name = name.trim().to_lowercase();
        self.accounts
            .values()
            .any(|a| Some(a.id) != except && a.name.to_lowercase() == name)
    }

    fn is_reversed(&self, id: TransactionId) -> bool {
        self.transactions.iter().any(|t| t.reverses == Some(id))
    }
}

/// In-memory ledger store.
///
/// One write lock covers a whole commit, so a posting and its document are
/// visible to readers together or not at all. Intended for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    state: RwLock<State>,
}

impl InMemoryLedgerStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of journal lines written so far.
    pub async fn line_count(&self) -> usize {
        let state = self.state.read().await;
        state.transactions.iter().map(|t| t.lines.len()).sum()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn insert_account(&self, account: Account) -> Result<Account, LedgerError> {
        let mut state = self.state.write().await;
        if state.name_taken(&account.name, None) {
            return Err(LedgerError::DuplicateAccountName(account.name));
        }
        state.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn update_account(&self, account: Account) -> Result<Account, LedgerError> {
        let mut state = self.state.write().await;
        if !state.accounts.contains_key(&account.id) {
            return Err(LedgerError::AccountNotFound(account.id));
        }
        if state.name_taken(&account.name, Some(account.id)) {
            return Err(LedgerError::DuplicateAccountName(account.name));
        }
        let old_name = state.accounts[&account.id].name.to_lowercase();
        if old_name != account.name.to_lowercase() {
            for child in state.accounts.values_mut() {
                if child
                    .parent_name
                    .as_deref()
                    .is_some_and(|p| p.to_lowercase() == old_name)
                {
                    child.parent_name = Some(account.name.clone());
                    child.updated_at = account.updated_at;
                }
            }
        }
        state.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn get_account(&self, id: AccountId) -> Result<Option<Account>, LedgerError> {
        Ok(self.state.read().await.accounts.get(&id).cloned())
    }

    async fn find_account_by_name(&self, name: &str) -> Result<Option<Account>, LedgerError> {
        let name = name.trim().to_lowercase();
        let state = self.state.read().await;
        Ok(state
            .accounts
            .values()
            .find(|a| a.name.to_lowercase() == name)
            .cloned())
    }

    async fn list_accounts(&self, filter: &AccountFilter) -> Result<Vec<Account>, LedgerError> {
        let state = self.state.read().await;
        let mut accounts: Vec<Account> = state
            .accounts
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        sort_accounts(&mut accounts);
        Ok(accounts)
    }

    async fn account_has_postings(&self, id: AccountId) -> Result<bool, LedgerError> {
        let state = self.state.read().await;
        Ok(state
            .transactions
            .iter()
            .flat_map(|t| &t.lines)
            .any(|l| l.account_id == id))
    }

    async fn commit_posting(&self, posting: Posting) -> Result<JournalTransaction, LedgerError> {
        let Posting {
            transaction_id,
            request,
            document,
        } = posting;

        let mut state = self.state.write().await;

        validate_posting(&request.lines, |id| {
            state.accounts.get(&id).map(AccountInfo::from)
        })?;

        if let Some(original) = request.reverses
            && state.is_reversed(original)
        {
            return Err(LedgerError::AlreadyReversed(original));
        }

        // Check the document before touching any state.
        if let Some(PostingDocument::ExpenseDeletion { expense_id, .. }) = &document {
            match state.expenses.get(expense_id) {
                None => return Err(LedgerError::ExpenseNotFound(*expense_id)),
                Some(expense) if expense.is_deleted() => {
                    return Err(LedgerError::ExpenseAlreadyDeleted(*expense_id));
                }
                Some(_) => {}
            }
        }

        let lines = request
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

        state.last_entry_number += 1;
        let transaction = JournalTransaction {
            id: transaction_id,
            entry_number: format_entry_number(state.last_entry_number),
            entry_date: request.entry_date,
            memo: request.memo,
            source: request.source,
            reverses: request.reverses,
            created_at: Utc::now(),
            lines,
        };

        match document {
            Some(PostingDocument::Transfer(transfer)) => state.transfers.push(transfer),
            Some(PostingDocument::Payment(payment)) => state.payments.push(payment),
            Some(PostingDocument::Expense(expense)) => {
                state.expenses.insert(expense.id, expense);
            }
            Some(PostingDocument::ExpenseDeletion {
                expense_id,
                deleted_at,
            }) => {
                if let Some(expense) = state.expenses.get_mut(&expense_id) {
                    expense.deleted_at = Some(deleted_at);
                    expense.reversal_transaction_id = Some(transaction_id);
                }
            }
            None => {}
        }

        state.transactions.push(transaction.clone());
        Ok(transaction)
    }

    async fn get_transaction(
        &self,
        id: TransactionId,
    ) -> Result<Option<JournalTransaction>, LedgerError> {
        let state = self.state.read().await;
        Ok(state.transactions.iter().find(|t| t.id == id).cloned())
    }

    async fn list_transactions(
        &self,
        filter: &TransactionFilter,
    ) -> Result<Vec<JournalTransaction>, LedgerError> {
        let state = self.state.read().await;
        let mut transactions: Vec<JournalTransaction> = state
            .transactions
            .iter()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        // Commit order already follows entry number.
        transactions.sort_by_key(|t| t.entry_date);
        Ok(transactions)
    }

    async fn account_totals(&self, query: &TotalsQuery) -> Result<Vec<AccountTotals>, LedgerError> {
        let state = self.state.read().await;
        let totals = state
            .transactions
            .iter()
            .flat_map(|t| &t.lines)
            .filter(|l| query.contains(l.entry_date))
            .filter(|l| query.account_id.is_none_or(|id| l.account_id == id))
            .fold(HashMap::<AccountId, AccountTotals>::new(), |mut acc, line| {
                let entry = acc.entry(line.account_id).or_insert(AccountTotals {
                    account_id: line.account_id,
                    debit_total: Decimal::ZERO,
                    credit_total: Decimal::ZERO,
                });
                entry.debit_total += line.debit();
                entry.credit_total += line.credit();
                acc
            });
        Ok(totals.into_values().collect())
    }

    async fn list_transfers(&self) -> Result<Vec<Transfer>, LedgerError> {
        let state = self.state.read().await;
        let mut transfers = state.transfers.clone();
        transfers.sort_by(|a, b| b.transfer_date.cmp(&a.transfer_date).then(b.id.cmp(&a.id)));
        Ok(transfers)
    }

    async fn list_payments(&self) -> Result<Vec<Payment>, LedgerError> {
        let state = self.state.read().await;
        let mut payments = state.payments.clone();
        payments.sort_by(|a, b| b.payment_date.cmp(&a.payment_date).then(b.id.cmp(&a.id)));
        Ok(payments)
    }

    async fn list_expenses(&self, include_deleted: bool) -> Result<Vec<Expense>, LedgerError> {
        let state = self.state.read().await;
        let mut expenses: Vec<Expense> = state
            .expenses
            .values()
            .filter(|e| include_deleted || !e.is_deleted())
            .cloned()
            .collect();
        expenses.sort_by(|a, b| b.expense_date.cmp(&a.expense_date).then(b.id.cmp(&a.id)));
        Ok(expenses)
    }

    async fn get_expense(&self, id: ExpenseId) -> Result<Option<Expense>, LedgerError> {
        Ok(self.state.read().await.expenses.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{AccountType, NewAccount, PostingLine, PostingRequest, SourceKind};
    use crate::accounts::new_account_record;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, d).unwrap()
    }

    async fn account(store: &InMemoryLedgerStore, name: &str, t: AccountType) -> AccountId {
        store
            .insert_account(new_account_record(NewAccount::new(name, t)))
            .await
            .unwrap()
            .id
    }

    fn posting(lines: Vec<PostingLine>, on: NaiveDate) -> Posting {
        Posting {
            transaction_id: TransactionId::new(),
            request: PostingRequest::new(on, SourceKind::Journal, lines),
            document: None,
        }
    }

    #[tokio::test]
    async fn test_entry_numbers_are_sequential() {
        let store = InMemoryLedgerStore::new();
        let cash = account(&store, "Cash", AccountType::Bank).await;
        let equity = account(&store, "Owner's Equity", AccountType::Equity).await;

        for expected in ["JE-0001", "JE-0002"] {
            let tx = store
                .commit_posting(posting(
                    vec![PostingLine::debit(cash, dec!(10)), PostingLine::credit(equity, dec!(10))],
                    date(1, 1),
                ))
                .await
                .unwrap();
            assert_eq!(tx.entry_number, expected);
        }
    }

    #[tokio::test]
    async fn test_rejected_posting_writes_nothing() {
        let store = InMemoryLedgerStore::new();
        let cash = account(&store, "Cash", AccountType::Bank).await;
        let sales = account(&store, "Revenue", AccountType::Income).await;

        let result = store
            .commit_posting(posting(
                vec![
                    PostingLine::debit(cash, dec!(100.00)),
                    PostingLine::credit(sales, dec!(99.99)),
                ],
                date(1, 1),
            ))
            .await;

        assert!(matches!(result, Err(LedgerError::UnbalancedEntry { .. })));
        assert_eq!(store.line_count().await, 0);
    }

    #[tokio::test]
    async fn test_duplicate_names_rejected_ignoring_case() {
        let store = InMemoryLedgerStore::new();
        account(&store, "Cash", AccountType::Bank).await;
        let result = store
            .insert_account(new_account_record(NewAccount::new("CASH", AccountType::Bank)))
            .await;
        assert!(matches!(result, Err(LedgerError::DuplicateAccountName(_))));
    }

    #[tokio::test]
    async fn test_totals_respect_window() {
        let store = InMemoryLedgerStore::new();
        let cash = account(&store, "Cash", AccountType::Bank).await;
        let equity = account(&store, "Owner's Equity", AccountType::Equity).await;
        for (on, amount) in [(date(1, 10), dec!(100)), (date(2, 10), dec!(50))] {
            store
                .commit_posting(posting(
                    vec![PostingLine::debit(cash, amount), PostingLine::credit(equity, amount)],
                    on,
                ))
                .await
                .unwrap();
        }

        let january = store
            .account_totals(&TotalsQuery::as_of(date(1, 31)).for_account(cash))
            .await
            .unwrap();
        assert_eq!(january.len(), 1);
        assert_eq!(january[0].debit_total, dec!(100));

        let february = store
            .account_totals(&TotalsQuery::period(date(2, 1), date(2, 28)).for_account(equity))
            .await
            .unwrap();
        assert_eq!(february[0].credit_total, dec!(50));
        assert_eq!(february[0].debit_total, Decimal::ZERO);
    }
}
