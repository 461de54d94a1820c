//! Balance aggregation.
//!
//! Balances are never stored. Every query folds the journal lines dated up to
//! the requested day (or inside the requested period) and reduces the debit
//! and credit sums on the account's normal side. Inactive accounts are
//! included; accounts without postings report zero.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::AccountId;

use crate::ledger::{Account, AccountType, LedgerError};
use crate::store::{AccountFilter, AccountTotals, LedgerStore, TotalsQuery};

/// Balance of one account over a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// Account ID.
    pub account_id: AccountId,
    /// Account name.
    pub name: String,
    /// Account number.
    pub account_number: Option<String>,
    /// Account type.
    pub account_type: AccountType,
    /// Whether the account is active.
    pub is_active: bool,
    /// Sum of debits.
    pub debit_total: Decimal,
    /// Sum of credits.
    pub credit_total: Decimal,
    /// Balance on the normal side.
    pub balance: Decimal,
}

impl AccountBalance {
    /// Reduces raw totals for `account`.
    #[must_use]
    pub fn from_totals(account: &Account, debit_total: Decimal, credit_total: Decimal) -> Self {
        Self {
            account_id: account.id,
            name: account.name.clone(),
            account_number: account.account_number.clone(),
            account_type: account.account_type,
            is_active: account.is_active,
            debit_total,
            credit_total,
            balance: account
                .account_type
                .normal_balance()
                .balance(debit_total, credit_total),
        }
    }
}

/// Computes balances from the journal on demand.
#[derive(Clone)]
pub struct BalanceAggregator {
    store: Arc<dyn LedgerStore>,
}

impl BalanceAggregator {
    /// Creates an aggregator over a store.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Balance of one account from the first posting through `as_of`.
    pub async fn balance_as_of(
        &self,
        account_id: AccountId,
        as_of: NaiveDate,
    ) -> Result<AccountBalance, LedgerError> {
        let account = self
            .store
            .get_account(account_id)
            .await?
            .ok_or(LedgerError::AccountNotFound(account_id))?;

        let totals = self
            .store
            .account_totals(&TotalsQuery::as_of(as_of).for_account(account_id))
            .await?;
        let (debit, credit) = totals
            .iter()
            .filter(|t| t.account_id == account_id)
            .fold((Decimal::ZERO, Decimal::ZERO), |(d, c), t| {
                (d + t.debit_total, c + t.credit_total)
            });

        Ok(AccountBalance::from_totals(&account, debit, credit))
    }

    /// Balances of every account through `as_of`, in report order.
    pub async fn balances_as_of(&self, as_of: NaiveDate) -> Result<Vec<AccountBalance>, LedgerError> {
        self.balances(&TotalsQuery::as_of(as_of)).await
    }

    /// Balances of every account over `from..=to`, in report order.
    pub async fn period_balances(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AccountBalance>, LedgerError> {
        if from > to {
            return Err(LedgerError::InvalidDateRange { from, to });
        }
        self.balances(&TotalsQuery::period(from, to)).await
    }

    /// Balances through `as_of` grouped by account type.
    pub async fn balances_grouped_by_type(
        &self,
        as_of: NaiveDate,
    ) -> Result<BTreeMap<AccountType, Vec<AccountBalance>>, LedgerError> {
        let mut grouped: BTreeMap<AccountType, Vec<AccountBalance>> = BTreeMap::new();
        for balance in self.balances_as_of(as_of).await? {
            grouped.entry(balance.account_type).or_default().push(balance);
        }
        Ok(grouped)
    }

    async fn balances(&self, query: &TotalsQuery) -> Result<Vec<AccountBalance>, LedgerError> {
        let accounts = self.store.list_accounts(&AccountFilter::default()).await?;
        let totals = self.store.account_totals(query).await?;
        Ok(fold_balances(&accounts, &totals))
    }
}

/// Joins accounts with their totals; accounts with no totals get zero.
#[must_use]
pub fn fold_balances(accounts: &[Account], totals: &[AccountTotals]) -> Vec<AccountBalance> {
    let by_account: HashMap<AccountId, &AccountTotals> =
        totals.iter().map(|t| (t.account_id, t)).collect();
    accounts
        .iter()
        .map(|account| {
            let (debit, credit) = by_account
                .get(&account.id)
                .map_or((Decimal::ZERO, Decimal::ZERO), |t| (t.debit_total, t.credit_total));
            AccountBalance::from_totals(account, debit, credit)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::AccountService;
    use crate::ledger::{AccountUpdate, NewAccount, PostingEngine, PostingLine, PostingRequest, SourceKind};
    use crate::store::InMemoryLedgerStore;
    use rust_decimal_macros::dec;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, d).unwrap()
    }

    struct Fixture {
        accounts: AccountService,
        engine: PostingEngine,
        balances: BalanceAggregator,
    }

    fn fixture() -> Fixture {
        let store: Arc<dyn LedgerStore> = Arc::new(InMemoryLedgerStore::new());
        Fixture {
            accounts: AccountService::new(store.clone()),
            engine: PostingEngine::new(store.clone()),
            balances: BalanceAggregator::new(store),
        }
    }

    async fn open(f: &Fixture, name: &str, t: AccountType) -> AccountId {
        f.accounts.create(NewAccount::new(name, t)).await.unwrap().id
    }

    async fn post(f: &Fixture, on: NaiveDate, debit: AccountId, credit: AccountId, amount: Decimal) {
        f.engine
            .post(PostingRequest::new(
                on,
                SourceKind::Journal,
                vec![PostingLine::debit(debit, amount), PostingLine::credit(credit, amount)],
            ))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_balance_uses_normal_side() {
        let f = fixture();
        let cash = open(&f, "Cash", AccountType::Bank).await;
        let revenue = open(&f, "Revenue", AccountType::Income).await;
        post(&f, date(1, 10), cash, revenue, dec!(300)).await;

        let cash_balance = f.balances.balance_as_of(cash, date(1, 31)).await.unwrap();
        let revenue_balance = f.balances.balance_as_of(revenue, date(1, 31)).await.unwrap();
        assert_eq!(cash_balance.balance, dec!(300));
        assert_eq!(revenue_balance.balance, dec!(300));
        assert_eq!(revenue_balance.credit_total, dec!(300));
    }

    #[tokio::test]
    async fn test_balance_excludes_later_entries() {
        let f = fixture();
        let cash = open(&f, "Cash", AccountType::Bank).await;
        let equity = open(&f, "Owner's Equity", AccountType::Equity).await;
        post(&f, date(1, 10), cash, equity, dec!(100)).await;
        post(&f, date(3, 10), cash, equity, dec!(50)).await;

        assert_eq!(
            f.balances.balance_as_of(cash, date(1, 9)).await.unwrap().balance,
            Decimal::ZERO
        );
        assert_eq!(
            f.balances.balance_as_of(cash, date(1, 10)).await.unwrap().balance,
            dec!(100)
        );
        assert_eq!(
            f.balances.balance_as_of(cash, date(12, 31)).await.unwrap().balance,
            dec!(150)
        );
    }

    #[tokio::test]
    async fn test_repeated_queries_are_identical() {
        let f = fixture();
        let cash = open(&f, "Cash", AccountType::Bank).await;
        let equity = open(&f, "Owner's Equity", AccountType::Equity).await;
        post(&f, date(2, 1), cash, equity, dec!(42.42)).await;

        let first = f.balances.balances_as_of(date(2, 28)).await.unwrap();
        let second = f.balances.balances_as_of(date(2, 28)).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_unknown_account_and_empty_account() {
        let f = fixture();
        let ghost = AccountId::new();
        assert!(matches!(
            f.balances.balance_as_of(ghost, date(1, 1)).await,
            Err(LedgerError::AccountNotFound(id)) if id == ghost
        ));

        let idle = open(&f, "Petty Cash", AccountType::Bank).await;
        let balance = f.balances.balance_as_of(idle, date(1, 1)).await.unwrap();
        assert_eq!(balance.balance, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_inactive_accounts_keep_their_balance() {
        let f = fixture();
        let cash = open(&f, "Cash", AccountType::Bank).await;
        let old = open(&f, "Old Bank", AccountType::Bank).await;
        post(&f, date(1, 1), old, cash, dec!(75)).await;
        f.accounts
            .update(
                old,
                AccountUpdate {
                    is_active: Some(false),
                    ..AccountUpdate::default()
                },
            )
            .await
            .unwrap();

        let grouped = f.balances.balances_grouped_by_type(date(1, 31)).await.unwrap();
        let banks = &grouped[&AccountType::Bank];
        let old_balance = banks.iter().find(|b| b.account_id == old).unwrap();
        assert!(!old_balance.is_active);
        assert_eq!(old_balance.balance, dec!(75));
    }

    #[tokio::test]
    async fn test_period_balances_reject_inverted_range() {
        let f = fixture();
        assert!(matches!(
            f.balances.period_balances(date(2, 1), date(1, 1)).await,
            Err(LedgerError::InvalidDateRange { .. })
        ));
    }
}
