//! Property-based tests for the posting engine over the in-memory store.

use std::sync::Arc;

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::AccountId;
use tokio::runtime::Runtime;

use super::{AccountType, LedgerError, NewAccount, PostingEngine, PostingLine, PostingRequest, SourceKind};
use crate::accounts::AccountService;
use crate::balance::BalanceAggregator;
use crate::recorder::{NewTransfer, Recorder};
use crate::gateway::DisabledGateway;
use crate::store::{InMemoryLedgerStore, LedgerStore, TotalsQuery};

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn day() -> impl Strategy<Value = NaiveDate> {
    (1u32..=28, 1u32..=12).prop_map(|(d, m)| NaiveDate::from_ymd_opt(2026, m, d).unwrap())
}

struct Books {
    store: Arc<dyn LedgerStore>,
    engine: PostingEngine,
    recorder: Recorder,
    balances: BalanceAggregator,
    accounts: Vec<AccountId>,
}

async fn books() -> Books {
    let store: Arc<dyn LedgerStore> = Arc::new(InMemoryLedgerStore::new());
    let accounts = AccountService::new(store.clone());
    let mut ids = Vec::new();
    for (name, account_type) in [
        ("Bank A", AccountType::Bank),
        ("Bank B", AccountType::Bank),
        ("Owner's Equity", AccountType::Equity),
        ("Revenue", AccountType::Income),
    ] {
        ids.push(
            accounts
                .create(NewAccount::new(name, account_type))
                .await
                .unwrap()
                .id,
        );
    }
    let engine = PostingEngine::new(store.clone());
    Books {
        recorder: Recorder::new(engine.clone(), accounts, Arc::new(DisabledGateway), "CAD"),
        balances: BalanceAggregator::new(store.clone()),
        engine,
        store,
        accounts: ids,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Every committed transaction's signed lines sum to zero, and so does
    /// the whole journal.
    #[test]
    fn prop_journal_sums_to_zero(
        postings in prop::collection::vec((0usize..4, 0usize..4, positive_amount(), day()), 1..20),
    ) {
        runtime().block_on(async {
            let b = books().await;
            for (debit, credit, amount, on) in postings {
                let result = b
                    .engine
                    .post(PostingRequest::new(
                        on,
                        SourceKind::Journal,
                        vec![
                            PostingLine::debit(b.accounts[debit], amount),
                            PostingLine::credit(b.accounts[credit], amount),
                        ],
                    ))
                    .await;
                let tx = result.unwrap();
                prop_assert_eq!(tx.lines.iter().map(|l| l.amount).sum::<Decimal>(), Decimal::ZERO);
            }

            let end = NaiveDate::from_ymd_opt(2026, 12, 31).unwrap();
            let totals = b.store.account_totals(&TotalsQuery::as_of(end)).await.unwrap();
            let debits: Decimal = totals.iter().map(|t| t.debit_total).sum();
            let credits: Decimal = totals.iter().map(|t| t.credit_total).sum();
            prop_assert_eq!(debits, credits);
            Ok(())
        })?;
    }

    /// A transfer moves exactly the amount out of one account and into the other.
    #[test]
    fn prop_transfer_moves_exact_amount(amount in positive_amount(), on in day()) {
        runtime().block_on(async {
            let b = books().await;
            let (from, to) = (b.accounts[0], b.accounts[1]);
            let before_from = b.balances.balance_as_of(from, on).await.unwrap().balance;
            let before_to = b.balances.balance_as_of(to, on).await.unwrap().balance;

            b.recorder
                .transfer(NewTransfer {
                    from_account_id: from,
                    to_account_id: to,
                    amount,
                    transfer_date: on,
                    memo: None,
                })
                .await
                .unwrap();

            let after_from = b.balances.balance_as_of(from, on).await.unwrap().balance;
            let after_to = b.balances.balance_as_of(to, on).await.unwrap().balance;
            prop_assert_eq!(before_from - after_from, amount);
            prop_assert_eq!(after_to - before_to, amount);
            Ok(())
        })?;
    }

    /// Reading a balance twice with no posting in between gives the same answer.
    #[test]
    fn prop_balance_reads_are_idempotent(amount in positive_amount(), on in day(), probe in day()) {
        runtime().block_on(async {
            let b = books().await;
            b.engine
                .post(PostingRequest::new(
                    on,
                    SourceKind::Journal,
                    vec![
                        PostingLine::debit(b.accounts[0], amount),
                        PostingLine::credit(b.accounts[3], amount),
                    ],
                ))
                .await
                .unwrap();

            let first = b.balances.balances_as_of(probe).await.unwrap();
            let second = b.balances.balances_as_of(probe).await.unwrap();
            prop_assert_eq!(&first, &second);

            let expected = if on <= probe { amount } else { Decimal::ZERO };
            prop_assert_eq!(first[0].balance, expected);
            Ok(())
        })?;
    }

    /// A rejected posting leaves the totals untouched.
    #[test]
    fn prop_unbalanced_posting_changes_nothing(
        amount in positive_amount(),
        skew in (1i64..100i64).prop_map(|c| Decimal::new(c, 2)),
    ) {
        runtime().block_on(async {
            let b = books().await;
            let end = NaiveDate::from_ymd_opt(2026, 12, 31).unwrap();
            let before = b.balances.balances_as_of(end).await.unwrap();

            let result = b
                .engine
                .post(PostingRequest::new(
                    end,
                    SourceKind::Journal,
                    vec![
                        PostingLine::debit(b.accounts[0], amount + skew),
                        PostingLine::credit(b.accounts[3], amount),
                    ],
                ))
                .await;
            let is_unbalanced = matches!(result, Err(LedgerError::UnbalancedEntry { .. }));
            prop_assert!(is_unbalanced);
            prop_assert_eq!(before, b.balances.balances_as_of(end).await.unwrap());
            Ok(())
        })?;
    }
}
