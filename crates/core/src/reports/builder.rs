//! Report builder: fetches balances and assembles reports.

use std::sync::Arc;

use chrono::NaiveDate;

use super::service::{MONTH_LABELS, ReportService, month_end, month_start};
use super::types::{
    BalanceSheetReport, MonthlyBalanceSheet, MonthlyProfitAndLoss, MonthlyProfitAndLossPoint,
    MonthlySnapshot, ProfitAndLossReport, TrialBalanceReport,
};
use crate::balance::BalanceAggregator;
use crate::ledger::LedgerError;
use crate::store::LedgerStore;

/// Reporting currency and labels.
#[derive(Debug, Clone)]
pub struct ReportSettings {
    /// ISO 4217 code printed on every report.
    pub currency: String,
    /// Name of the derived equity line.
    pub retained_earnings_label: String,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            currency: "CAD".to_string(),
            retained_earnings_label: "Retained Earnings (Net Income)".to_string(),
        }
    }
}

/// Builds reports on demand. Nothing is cached.
#[derive(Clone)]
pub struct ReportBuilder {
    balances: BalanceAggregator,
    settings: ReportSettings,
}

impl ReportBuilder {
    /// Creates a builder over a store.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>, settings: ReportSettings) -> Self {
        Self {
            balances: BalanceAggregator::new(store),
            settings,
        }
    }

    /// Balance sheet as of the end of `as_of`.
    pub async fn balance_sheet(&self, as_of: NaiveDate) -> Result<BalanceSheetReport, LedgerError> {
        let balances = self.balances.balances_as_of(as_of).await?;
        Ok(ReportService::balance_sheet(
            &balances,
            as_of,
            &self.settings.currency,
            &self.settings.retained_earnings_label,
        ))
    }

    /// Profit and loss over `from..=to`.
    pub async fn profit_and_loss(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<ProfitAndLossReport, LedgerError> {
        let balances = self.balances.period_balances(from, to).await?;
        Ok(ReportService::profit_and_loss(
            &balances,
            from,
            to,
            &self.settings.currency,
        ))
    }

    /// Trial balance as of the end of `as_of`.
    pub async fn trial_balance(&self, as_of: NaiveDate) -> Result<TrialBalanceReport, LedgerError> {
        let balances = self.balances.balances_as_of(as_of).await?;
        Ok(ReportService::trial_balance(
            &balances,
            as_of,
            &self.settings.currency,
        ))
    }

    /// One balance sheet per month end of `year`.
    ///
    /// Each month re-runs the full aggregation as of its last day; no month
    /// is derived from another.
    pub async fn monthly_balance_sheet(&self, year: i32) -> Result<MonthlyBalanceSheet, LedgerError> {
        let mut months = Vec::with_capacity(12);
        for (month, label) in (1..=12).zip(MONTH_LABELS) {
            let as_of = month_end(year, month).ok_or_else(|| invalid_year(year))?;
            months.push(MonthlySnapshot {
                month,
                label: label.to_string(),
                report: self.balance_sheet(as_of).await?,
            });
        }
        Ok(MonthlyBalanceSheet {
            year,
            currency: self.settings.currency.clone(),
            months,
        })
    }

    /// Income, expenses and net income for each month of `year`.
    pub async fn monthly_profit_and_loss(
        &self,
        year: i32,
    ) -> Result<MonthlyProfitAndLoss, LedgerError> {
        let mut months = Vec::with_capacity(12);
        for (month, label) in (1..=12).zip(MONTH_LABELS) {
            let start = month_start(year, month).ok_or_else(|| invalid_year(year))?;
            let end = month_end(year, month).ok_or_else(|| invalid_year(year))?;
            let report = self.profit_and_loss(start, end).await?;
            months.push(MonthlyProfitAndLossPoint {
                month,
                label: label.to_string(),
                income: report.total_income,
                expenses: report.total_expenses,
                net_income: report.net_income,
            });
        }
        Ok(MonthlyProfitAndLoss {
            year,
            currency: self.settings.currency.clone(),
            months,
        })
    }
}

fn invalid_year(year: i32) -> LedgerError {
    LedgerError::Validation(format!("year {year} is out of range"))
}
