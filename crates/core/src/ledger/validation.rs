//! Posting validation.
//!
//! Every store calls [`validate_posting`] inside the storage transaction that
//! writes the lines, so account state is read at commit time.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, is_cent_precise, is_storable};

use super::account::{Account, AccountType};
use super::entry::{EntrySide, PostingLine};
use super::error::{InvalidAccountReason, LedgerError};

/// Debit and credit totals of a set of lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionTotals {
    /// Total debits.
    pub debit: Decimal,
    /// Total credits.
    pub credit: Decimal,
    /// Whether debits equal credits.
    pub is_balanced: bool,
}

impl TransactionTotals {
    /// Creates totals from debit and credit sums.
    #[must_use]
    pub fn new(debit: Decimal, credit: Decimal) -> Self {
        Self {
            debit,
            credit,
            is_balanced: debit == credit,
        }
    }

    /// Sums posting lines by side.
    ///
    /// # Errors
    ///
    /// `AmountOutOfRange` when a side's total overflows.
    pub fn of_lines(lines: &[PostingLine]) -> Result<Self, LedgerError> {
        let (mut debit, mut credit) = (Decimal::ZERO, Decimal::ZERO);
        for line in lines {
            let total = match line.side {
                EntrySide::Debit => &mut debit,
                EntrySide::Credit => &mut credit,
            };
            *total = total
                .checked_add(line.amount)
                .ok_or(LedgerError::AmountOutOfRange(line.amount))?;
        }
        Ok(Self::new(debit, credit))
    }

    /// Debits minus credits.
    #[must_use]
    pub fn difference(&self) -> Decimal {
        self.debit - self.credit
    }
}

/// What validation needs to know about an account.
#[derive(Debug, Clone, Copy)]
pub struct AccountInfo {
    /// Account ID.
    pub id: AccountId,
    /// Account type.
    pub account_type: AccountType,
    /// Whether new postings are accepted.
    pub is_active: bool,
}

impl From<&Account> for AccountInfo {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            account_type: account.account_type,
            is_active: account.is_active,
        }
    }
}

/// Checks the rules that need no account lookup: line count, positive
/// cent-precise storable amounts, and debits equal to credits.
///
/// # Errors
///
/// `InsufficientLines`, `NonPositiveAmount`, `SubCentAmount`,
/// `AmountOutOfRange` or `UnbalancedEntry`.
pub fn validate_lines(lines: &[PostingLine]) -> Result<TransactionTotals, LedgerError> {
    if lines.len() < 2 {
        return Err(LedgerError::InsufficientLines);
    }

    for line in lines {
        check_amount(line.amount)?;
    }

    let totals = TransactionTotals::of_lines(lines)?;
    if !totals.is_balanced {
        return Err(LedgerError::UnbalancedEntry {
            debit: totals.debit,
            credit: totals.credit,
        });
    }
    Ok(totals)
}

/// Full posting validation.
///
/// Rules run in order: line count, amounts, account existence and activity,
/// then balance. `lookup` resolves an account as seen by the committing
/// storage transaction.
///
/// # Errors
///
/// The first rule violated.
pub fn validate_posting<F>(lines: &[PostingLine], lookup: F) -> Result<TransactionTotals, LedgerError>
where
    F: Fn(AccountId) -> Option<AccountInfo>,
{
    if lines.len() < 2 {
        return Err(LedgerError::InsufficientLines);
    }

    for line in lines {
        check_amount(line.amount)?;
    }

    for line in lines {
        match lookup(line.account_id) {
            None => {
                return Err(LedgerError::InvalidAccount {
                    account_id: line.account_id,
                    reason: InvalidAccountReason::NotFound,
                });
            }
            Some(info) if !info.is_active => {
                return Err(LedgerError::InvalidAccount {
                    account_id: line.account_id,
                    reason: InvalidAccountReason::Inactive,
                });
            }
            Some(_) => {}
        }
    }

    let totals = TransactionTotals::of_lines(lines)?;
    if !totals.is_balanced {
        return Err(LedgerError::UnbalancedEntry {
            debit: totals.debit,
            credit: totals.credit,
        });
    }
    Ok(totals)
}

/// Rejects zero, negative, sub-cent and unstorable amounts.
///
/// # Errors
///
/// `NonPositiveAmount`, `SubCentAmount` or `AmountOutOfRange`.
pub fn check_amount(amount: Decimal) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::NonPositiveAmount(amount));
    }
    if !is_cent_precise(amount) {
        return Err(LedgerError::SubCentAmount(amount));
    }
    if !is_storable(amount) {
        return Err(LedgerError::AmountOutOfRange(amount));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn accounts(active: &[AccountId], inactive: &[AccountId]) -> HashMap<AccountId, AccountInfo> {
        let mut map = HashMap::new();
        for (ids, is_active) in [(active, true), (inactive, false)] {
            for id in ids {
                map.insert(
                    *id,
                    AccountInfo {
                        id: *id,
                        account_type: AccountType::Bank,
                        is_active,
                    },
                );
            }
        }
        map
    }

    #[test]
    fn test_balanced_posting_accepted() {
        let (cash, sales) = (AccountId::new(), AccountId::new());
        let known = accounts(&[cash, sales], &[]);
        let lines = vec![
            PostingLine::debit(cash, dec!(100.00)),
            PostingLine::credit(sales, dec!(100.00)),
        ];

        let totals = validate_posting(&lines, |id| known.get(&id).copied()).unwrap();
        assert!(totals.is_balanced);
        assert_eq!(totals.debit, dec!(100.00));
    }

    #[test]
    fn test_unbalanced_posting_reports_both_totals() {
        let (cash, sales) = (AccountId::new(), AccountId::new());
        let known = accounts(&[cash, sales], &[]);
        let lines = vec![
            PostingLine::debit(cash, dec!(100.00)),
            PostingLine::credit(sales, dec!(99.99)),
        ];

        let err = validate_posting(&lines, |id| known.get(&id).copied()).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::UnbalancedEntry { debit, credit }
                if debit == dec!(100.00) && credit == dec!(99.99)
        ));
    }

    #[test]
    fn test_single_line_rejected() {
        let cash = AccountId::new();
        let lines = vec![PostingLine::debit(cash, dec!(10))];
        assert!(matches!(
            validate_lines(&lines),
            Err(LedgerError::InsufficientLines)
        ));
    }

    #[test]
    fn test_zero_and_sub_cent_amounts_rejected() {
        let (a, b) = (AccountId::new(), AccountId::new());
        let zero = vec![PostingLine::debit(a, Decimal::ZERO), PostingLine::credit(b, Decimal::ZERO)];
        assert!(matches!(
            validate_lines(&zero),
            Err(LedgerError::NonPositiveAmount(_))
        ));

        let sub_cent = vec![PostingLine::debit(a, dec!(1.005)), PostingLine::credit(b, dec!(1.005))];
        assert!(matches!(
            validate_lines(&sub_cent),
            Err(LedgerError::SubCentAmount(amount)) if amount == dec!(1.005)
        ));
    }

    #[test]
    fn test_missing_and_inactive_accounts_rejected() {
        let (cash, closed, ghost) = (AccountId::new(), AccountId::new(), AccountId::new());
        let known = accounts(&[cash], &[closed]);

        let to_closed = vec![
            PostingLine::debit(cash, dec!(5)),
            PostingLine::credit(closed, dec!(5)),
        ];
        assert!(matches!(
            validate_posting(&to_closed, |id| known.get(&id).copied()),
            Err(LedgerError::InvalidAccount { account_id, reason: InvalidAccountReason::Inactive })
                if account_id == closed
        ));

        let to_ghost = vec![
            PostingLine::debit(cash, dec!(5)),
            PostingLine::credit(ghost, dec!(5)),
        ];
        assert!(matches!(
            validate_posting(&to_ghost, |id| known.get(&id).copied()),
            Err(LedgerError::InvalidAccount { account_id, reason: InvalidAccountReason::NotFound })
                if account_id == ghost
        ));
    }

    #[test]
    fn test_amounts_beyond_storage_rejected() {
        let (a, b) = (AccountId::new(), AccountId::new());
        let lines = vec![
            PostingLine::debit(a, Decimal::MAX),
            PostingLine::debit(a, Decimal::MAX),
            PostingLine::credit(b, dec!(1)),
        ];
        assert!(matches!(
            validate_lines(&lines),
            Err(LedgerError::AmountOutOfRange(amount)) if amount == Decimal::MAX
        ));

        let just_over = dec!(100000000000000000.00);
        let lines = vec![PostingLine::debit(a, just_over), PostingLine::credit(b, just_over)];
        assert!(matches!(
            validate_lines(&lines),
            Err(LedgerError::AmountOutOfRange(_))
        ));

        let largest = dec!(99999999999999999.99);
        let lines = vec![PostingLine::debit(a, largest), PostingLine::credit(b, largest)];
        assert!(validate_lines(&lines).is_ok());
    }

    #[test]
    fn test_totals_overflow_is_an_error() {
        let (a, b) = (AccountId::new(), AccountId::new());
        let lines = vec![
            PostingLine::debit(a, Decimal::MAX),
            PostingLine::debit(a, Decimal::MAX),
            PostingLine::credit(b, dec!(1)),
        ];
        assert!(matches!(
            TransactionTotals::of_lines(&lines),
            Err(LedgerError::AmountOutOfRange(_))
        ));
    }

    #[test]
    fn test_transaction_totals_difference() {
        let totals = TransactionTotals::new(dec!(100.00), dec!(50.00));
        assert!(!totals.is_balanced);
        assert_eq!(totals.difference(), dec!(50.00));
    }
}
