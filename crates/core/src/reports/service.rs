//! Report assembly from account balances.
//!
//! Everything here is a pure function of the balances passed in; fetching
//! them is [`super::ReportBuilder`]'s job.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use super::types::{
    BalanceSheetReport, ProfitAndLossReport, ReportInconsistencyWarning, ReportLine,
    ReportSection, TrialBalanceLine, TrialBalanceReport,
};
use crate::balance::AccountBalance;
use crate::ledger::{AccountType, NormalBalance, StatementSection};

/// Short month names, January first.
pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Last calendar day of `month` in `year`, or `None` for an invalid month.
#[must_use]
pub fn month_end(year: i32, month: u32) -> Option<NaiveDate> {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month.checked_add(1)?, 1)?
    };
    first_of_next.pred_opt()
}

/// First calendar day of `month` in `year`.
#[must_use]
pub fn month_start(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// Stateless report assembly.
pub struct ReportService;

impl ReportService {
    /// Assembles a balance sheet.
    ///
    /// `balances` are cumulative through `as_of`. Income and expense accounts
    /// roll into a single derived equity line labelled `retained_earnings_label`.
    /// When assets differ from liabilities plus equity the report still
    /// renders, with a warning carrying the exact delta.
    #[must_use]
    pub fn balance_sheet(
        balances: &[AccountBalance],
        as_of: NaiveDate,
        currency: &str,
        retained_earnings_label: &str,
    ) -> BalanceSheetReport {
        let mut assets = ReportSection::default();
        let mut liabilities = ReportSection::default();
        let mut equity = ReportSection::default();

        for balance in balances {
            match balance.account_type.section() {
                StatementSection::Assets => assets.push(balance.into()),
                StatementSection::Liabilities => liabilities.push(balance.into()),
                StatementSection::Equity => equity.push(balance.into()),
                StatementSection::ProfitAndLoss => {}
            }
        }

        equity.push(ReportLine {
            account_id: None,
            name: retained_earnings_label.to_string(),
            account_number: None,
            account_type: None,
            amount: Self::net_income(balances),
        });

        let total_assets = assets.total;
        let total_liabilities = liabilities.total;
        let total_equity = equity.total;
        let liabilities_and_equity = total_liabilities + total_equity;
        let delta = total_assets - liabilities_and_equity;

        let warning = (!delta.is_zero()).then(|| ReportInconsistencyWarning {
            delta,
            message: format!(
                "Total assets ({total_assets}) differ from liabilities plus equity ({liabilities_and_equity}) by {delta}"
            ),
        });

        BalanceSheetReport {
            report_type: "balance_sheet".to_string(),
            as_of,
            currency: currency.to_string(),
            assets,
            liabilities,
            equity,
            total_assets,
            total_liabilities,
            total_equity,
            liabilities_and_equity,
            is_balanced: warning.is_none(),
            warning,
        }
    }

    /// Assembles a profit and loss statement from period balances.
    #[must_use]
    pub fn profit_and_loss(
        balances: &[AccountBalance],
        period_start: NaiveDate,
        period_end: NaiveDate,
        currency: &str,
    ) -> ProfitAndLossReport {
        let mut income = ReportSection::default();
        let mut cost_of_goods_sold = ReportSection::default();
        let mut expenses = ReportSection::default();
        let mut other_income = ReportSection::default();
        let mut other_expenses = ReportSection::default();

        for balance in balances {
            let section = match balance.account_type {
                AccountType::Income => &mut income,
                AccountType::CostOfGoodsSold => &mut cost_of_goods_sold,
                AccountType::Expenses => &mut expenses,
                AccountType::OtherIncome => &mut other_income,
                AccountType::OtherExpenses => &mut other_expenses,
                _ => continue,
            };
            section.push(balance.into());
        }

        let gross_profit = income.total - cost_of_goods_sold.total;
        let total_income = income.total + other_income.total;
        let total_expenses = cost_of_goods_sold.total + expenses.total + other_expenses.total;

        ProfitAndLossReport {
            report_type: "profit_and_loss".to_string(),
            period_start,
            period_end,
            currency: currency.to_string(),
            income,
            cost_of_goods_sold,
            gross_profit,
            expenses,
            other_income,
            other_expenses,
            total_income,
            total_expenses,
            net_income: total_income - total_expenses,
        }
    }

    /// Assembles a trial balance.
    ///
    /// Each account's net goes into the debit or credit column by sign.
    #[must_use]
    pub fn trial_balance(
        balances: &[AccountBalance],
        as_of: NaiveDate,
        currency: &str,
    ) -> TrialBalanceReport {
        let accounts: Vec<TrialBalanceLine> = balances
            .iter()
            .map(|b| {
                let net = b.debit_total - b.credit_total;
                TrialBalanceLine {
                    account_id: b.account_id,
                    name: b.name.clone(),
                    account_number: b.account_number.clone(),
                    account_type: b.account_type,
                    debit: net.max(Decimal::ZERO),
                    credit: (-net).max(Decimal::ZERO),
                }
            })
            .collect();

        let total_debit: Decimal = accounts.iter().map(|a| a.debit).sum();
        let total_credit: Decimal = accounts.iter().map(|a| a.credit).sum();

        TrialBalanceReport {
            report_type: "trial_balance".to_string(),
            as_of,
            currency: currency.to_string(),
            accounts,
            total_debit,
            total_credit,
            is_balanced: total_debit == total_credit,
        }
    }

    /// Income minus expenses over the balances given.
    #[must_use]
    pub fn net_income(balances: &[AccountBalance]) -> Decimal {
        balances
            .iter()
            .filter(|b| b.account_type.section() == StatementSection::ProfitAndLoss)
            .map(|b| match b.account_type.normal_balance() {
                NormalBalance::Credit => b.balance,
                NormalBalance::Debit => -b.balance,
            })
            .sum()
    }

    /// Short month name of `date`.
    #[must_use]
    pub fn month_label(date: NaiveDate) -> &'static str {
        MONTH_LABELS
            .get(date.month0() as usize)
            .copied()
            .unwrap_or_default()
    }
}
