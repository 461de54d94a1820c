//! Report data types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::AccountId;

use crate::balance::AccountBalance;
use crate::ledger::AccountType;

/// One row of a report section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportLine {
    /// Account ID; `None` for derived lines such as retained earnings.
    pub account_id: Option<AccountId>,
    /// Display name.
    pub name: String,
    /// Account number.
    pub account_number: Option<String>,
    /// Account type; `None` for derived lines.
    pub account_type: Option<AccountType>,
    /// Amount on the section's normal side.
    pub amount: Decimal,
}

impl From<&AccountBalance> for ReportLine {
    fn from(balance: &AccountBalance) -> Self {
        Self {
            account_id: Some(balance.account_id),
            name: balance.name.clone(),
            account_number: balance.account_number.clone(),
            account_type: Some(balance.account_type),
            amount: balance.balance,
        }
    }
}

/// A titled group of report lines with its total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSection {
    /// Section total.
    pub total: Decimal,
    /// Lines in account order.
    pub lines: Vec<ReportLine>,
}

impl ReportSection {
    /// Adds a line to the section.
    pub fn push(&mut self, line: ReportLine) {
        self.total += line.amount;
        self.lines.push(line);
    }
}

/// Assets differ from liabilities plus equity.
///
/// Advisory only: the report is still produced and the delta is shown as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportInconsistencyWarning {
    /// `total_assets - (total_liabilities + total_equity)`, never zero.
    pub delta: Decimal,
    /// Human-readable message including the delta.
    pub message: String,
}

/// Balance sheet snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSheetReport {
    /// Report type identifier.
    pub report_type: String,
    /// As of date, inclusive.
    pub as_of: NaiveDate,
    /// Currency code.
    pub currency: String,
    /// Assets section.
    pub assets: ReportSection,
    /// Liabilities section.
    pub liabilities: ReportSection,
    /// Equity section, including the derived retained earnings line.
    pub equity: ReportSection,
    /// Total assets.
    pub total_assets: Decimal,
    /// Total liabilities.
    pub total_liabilities: Decimal,
    /// Total equity.
    pub total_equity: Decimal,
    /// Liabilities plus equity.
    pub liabilities_and_equity: Decimal,
    /// Whether assets equal liabilities plus equity.
    pub is_balanced: bool,
    /// Present when not balanced.
    pub warning: Option<ReportInconsistencyWarning>,
}

/// Profit and loss statement for a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitAndLossReport {
    /// Report type identifier.
    pub report_type: String,
    /// Period start, inclusive.
    pub period_start: NaiveDate,
    /// Period end, inclusive.
    pub period_end: NaiveDate,
    /// Currency code.
    pub currency: String,
    /// Operating income.
    pub income: ReportSection,
    /// Cost of goods sold.
    pub cost_of_goods_sold: ReportSection,
    /// Income minus cost of goods sold.
    pub gross_profit: Decimal,
    /// Operating expenses.
    pub expenses: ReportSection,
    /// Non-operating income.
    pub other_income: ReportSection,
    /// Non-operating expenses.
    pub other_expenses: ReportSection,
    /// Income plus other income.
    pub total_income: Decimal,
    /// Cost of goods sold, expenses and other expenses.
    pub total_expenses: Decimal,
    /// Total income minus total expenses.
    pub net_income: Decimal,
}

/// Trial balance row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceLine {
    /// Account ID.
    pub account_id: AccountId,
    /// Account name.
    pub name: String,
    /// Account number.
    pub account_number: Option<String>,
    /// Account type.
    pub account_type: AccountType,
    /// Net debit balance, zero when the account nets to credit.
    pub debit: Decimal,
    /// Net credit balance, zero when the account nets to debit.
    pub credit: Decimal,
}

/// Trial balance report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceReport {
    /// Report type identifier.
    pub report_type: String,
    /// As of date.
    pub as_of: NaiveDate,
    /// Currency code.
    pub currency: String,
    /// Account rows.
    pub accounts: Vec<TrialBalanceLine>,
    /// Total of the debit column.
    pub total_debit: Decimal,
    /// Total of the credit column.
    pub total_credit: Decimal,
    /// Whether the columns agree.
    pub is_balanced: bool,
}

/// Balance sheet taken at one month end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlySnapshot {
    /// Month number, 1 to 12.
    pub month: u32,
    /// Short month name ("Jan").
    pub label: String,
    /// The snapshot, computed as of the month's last day.
    pub report: BalanceSheetReport,
}

/// Twelve month-end balance sheets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyBalanceSheet {
    /// Calendar year.
    pub year: i32,
    /// Currency code.
    pub currency: String,
    /// January through December.
    pub months: Vec<MonthlySnapshot>,
}

/// Profit and loss for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyProfitAndLossPoint {
    /// Month number, 1 to 12.
    pub month: u32,
    /// Short month name ("Jan").
    pub label: String,
    /// Total income for the month.
    pub income: Decimal,
    /// Total expenses for the month.
    pub expenses: Decimal,
    /// Income minus expenses.
    pub net_income: Decimal,
}

/// Twelve monthly profit and loss totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyProfitAndLoss {
    /// Calendar year.
    pub year: i32,
    /// Currency code.
    pub currency: String,
    /// January through December.
    pub months: Vec<MonthlyProfitAndLossPoint>,
}
