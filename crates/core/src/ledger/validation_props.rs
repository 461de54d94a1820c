//! Property-based tests for posting validation.

use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::AccountId;

use super::entry::{EntrySide, PostingLine};
use super::error::LedgerError;
use super::validation::{TransactionTotals, validate_lines};

/// Strategy to generate a valid positive amount (> 0).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    // 0.01 to 1,000,000.00
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Splits `total` into `parts` positive cent amounts that sum back to it.
fn split(total_cents: i64, parts: usize) -> Vec<Decimal> {
    let parts = i64::try_from(parts).unwrap().min(total_cents);
    let base = total_cents / parts;
    let mut amounts: Vec<Decimal> = (0..parts).map(|_| Decimal::new(base, 2)).collect();
    let remainder = total_cents - base * parts;
    if let Some(last) = amounts.last_mut() {
        *last += Decimal::new(remainder, 2);
    }
    amounts
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Any accepted posting sums to zero when signed.
    #[test]
    fn prop_accepted_postings_sum_to_zero(
        total_cents in 2i64..100_000_000i64,
        debit_parts in 1usize..6,
        credit_parts in 1usize..6,
    ) {
        let mut lines: Vec<PostingLine> = split(total_cents, debit_parts)
            .into_iter()
            .map(|amount| PostingLine::debit(AccountId::new(), amount))
            .collect();
        lines.extend(
            split(total_cents, credit_parts)
                .into_iter()
                .map(|amount| PostingLine::credit(AccountId::new(), amount)),
        );

        let totals = validate_lines(&lines).unwrap();
        let signed: Decimal = lines.iter().map(PostingLine::signed_amount).sum();
        prop_assert_eq!(signed, Decimal::ZERO);
        prop_assert_eq!(totals.difference(), Decimal::ZERO);
    }

    /// Any one-cent-or-more imbalance is rejected with the exact totals.
    #[test]
    fn prop_imbalance_rejected(
        debit in positive_amount(),
        skew_cents in 1i64..10_000i64,
    ) {
        let credit = debit + Decimal::new(skew_cents, 2);
        let lines = vec![
            PostingLine::debit(AccountId::new(), debit),
            PostingLine::credit(AccountId::new(), credit),
        ];

        let result = validate_lines(&lines);
        prop_assert!(
            matches!(result, Err(LedgerError::UnbalancedEntry { debit: d, credit: c }) if d == debit && c == credit),
            "imbalance should be rejected, got: {:?}",
            result
        );
    }

    /// Non-positive amounts are rejected regardless of balance.
    #[test]
    fn prop_non_positive_rejected(
        amount in positive_amount(),
        side in prop_oneof![Just(EntrySide::Debit), Just(EntrySide::Credit)],
    ) {
        let lines = vec![
            PostingLine { account_id: AccountId::new(), side, amount: -amount, description: None },
            PostingLine { account_id: AccountId::new(), side: side.opposite(), amount: -amount, description: None },
        ];
        prop_assert!(matches!(validate_lines(&lines), Err(LedgerError::NonPositiveAmount(_))));
    }

    /// Totals are order-independent.
    #[test]
    fn prop_totals_order_independent(amounts in proptest::collection::vec(positive_amount(), 2..10)) {
        let lines: Vec<PostingLine> = amounts
            .iter()
            .enumerate()
            .map(|(i, amount)| {
                if i % 2 == 0 {
                    PostingLine::debit(AccountId::new(), *amount)
                } else {
                    PostingLine::credit(AccountId::new(), *amount)
                }
            })
            .collect();
        let mut reversed = lines.clone();
        reversed.reverse();
        prop_assert_eq!(
            TransactionTotals::of_lines(&lines).unwrap(),
            TransactionTotals::of_lines(&reversed).unwrap()
        );
    }
}
