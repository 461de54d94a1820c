//! CSV and JSON export of report snapshots.
//!
//! Pure serialization: rows mirror the report structures one-to-one and
//! amounts are written with exactly two decimals.

use std::io::Write;
use std::str::FromStr;

use tally_shared::types::format_amount;
use thiserror::Error;

use super::types::{
    BalanceSheetReport, MonthlyBalanceSheet, MonthlyProfitAndLoss, ProfitAndLossReport,
    ReportSection, TrialBalanceReport,
};

/// Export failures.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV encoding failed.
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),
    /// Writer failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON encoding failed.
    #[error("JSON encode error: {0}")]
    Json(#[from] serde_json::Error),
    /// Requested format is neither JSON nor CSV.
    #[error("unsupported format '{0}', expected json or csv")]
    UnsupportedFormat(String),
}

/// Output format for report exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// JSON document.
    #[default]
    Json,
    /// Comma-separated values.
    Csv,
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    /// Parses `json` or `csv`, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

const STATEMENT_HEADER: [&str; 4] = ["section", "account_number", "account", "amount"];
const TRIAL_BALANCE_HEADER: [&str; 4] = ["account_number", "account", "debit", "credit"];
const MONTHLY_BALANCE_HEADER: [&str; 7] = [
    "month",
    "as_of",
    "total_assets",
    "total_liabilities",
    "total_equity",
    "liabilities_and_equity",
    "delta",
];
const MONTHLY_PNL_HEADER: [&str; 4] = ["month", "income", "expenses", "net_income"];

fn writer<W: Write>(out: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(out)
}

fn write_section<W: Write>(
    csv: &mut csv::Writer<W>,
    title: &str,
    section: &ReportSection,
) -> Result<(), ExportError> {
    for line in &section.lines {
        csv.write_record([
            title,
            line.account_number.as_deref().unwrap_or(""),
            line.name.as_str(),
            format_amount(line.amount).as_str(),
        ])?;
    }
    csv.write_record([title, "", format!("Total {title}").as_str(), format_amount(section.total).as_str()])?;
    Ok(())
}

/// Writes a balance sheet as CSV.
///
/// An unbalanced report ends with a `warning` row holding the delta.
pub fn balance_sheet_csv<W: Write>(report: &BalanceSheetReport, out: W) -> Result<(), ExportError> {
    let mut csv = writer(out);
    csv.write_record(STATEMENT_HEADER)?;
    write_section(&mut csv, "Assets", &report.assets)?;
    write_section(&mut csv, "Liabilities", &report.liabilities)?;
    write_section(&mut csv, "Equity", &report.equity)?;
    csv.write_record([
        "Summary",
        "",
        "Total Liabilities and Equity",
        format_amount(report.liabilities_and_equity).as_str(),
    ])?;
    if let Some(warning) = &report.warning {
        csv.write_record(["warning", "", warning.message.as_str(), format_amount(warning.delta).as_str()])?;
    }
    csv.flush()?;
    Ok(())
}

/// Writes a profit and loss statement as CSV.
pub fn profit_and_loss_csv<W: Write>(report: &ProfitAndLossReport, out: W) -> Result<(), ExportError> {
    let mut csv = writer(out);
    csv.write_record(STATEMENT_HEADER)?;
    write_section(&mut csv, "Income", &report.income)?;
    write_section(&mut csv, "Cost of Goods Sold", &report.cost_of_goods_sold)?;
    csv.write_record(["Summary", "", "Gross Profit", format_amount(report.gross_profit).as_str()])?;
    write_section(&mut csv, "Expenses", &report.expenses)?;
    write_section(&mut csv, "Other Income", &report.other_income)?;
    write_section(&mut csv, "Other Expenses", &report.other_expenses)?;
    csv.write_record(["Summary", "", "Net Income", format_amount(report.net_income).as_str()])?;
    csv.flush()?;
    Ok(())
}

/// Writes a trial balance as CSV.
pub fn trial_balance_csv<W: Write>(report: &TrialBalanceReport, out: W) -> Result<(), ExportError> {
    let mut csv = writer(out);
    csv.write_record(TRIAL_BALANCE_HEADER)?;
    for line in &report.accounts {
        csv.write_record([
            line.account_number.as_deref().unwrap_or(""),
            line.name.as_str(),
            format_amount(line.debit).as_str(),
            format_amount(line.credit).as_str(),
        ])?;
    }
    csv.write_record([
        "",
        "Total",
        format_amount(report.total_debit).as_str(),
        format_amount(report.total_credit).as_str(),
    ])?;
    csv.flush()?;
    Ok(())
}

/// Writes the month-end balance sheet series as CSV, one row per month.
pub fn monthly_balance_sheet_csv<W: Write>(
    series: &MonthlyBalanceSheet,
    out: W,
) -> Result<(), ExportError> {
    let mut csv = writer(out);
    csv.write_record(MONTHLY_BALANCE_HEADER)?;
    for snapshot in &series.months {
        let report = &snapshot.report;
        let delta = report.warning.as_ref().map(|w| w.delta).unwrap_or_default();
        csv.write_record([
            snapshot.label.as_str(),
            report.as_of.to_string().as_str(),
            format_amount(report.total_assets).as_str(),
            format_amount(report.total_liabilities).as_str(),
            format_amount(report.total_equity).as_str(),
            format_amount(report.liabilities_and_equity).as_str(),
            format_amount(delta).as_str(),
        ])?;
    }
    csv.flush()?;
    Ok(())
}

/// Writes the monthly profit and loss series as CSV.
pub fn monthly_profit_and_loss_csv<W: Write>(
    series: &MonthlyProfitAndLoss,
    out: W,
) -> Result<(), ExportError> {
    let mut csv = writer(out);
    csv.write_record(MONTHLY_PNL_HEADER)?;
    for point in &series.months {
        csv.write_record([
            point.label.as_str(),
            format_amount(point.income).as_str(),
            format_amount(point.expenses).as_str(),
            format_amount(point.net_income).as_str(),
        ])?;
    }
    csv.flush()?;
    Ok(())
}

/// Renders any report to a JSON string.
pub fn to_json<T: serde::Serialize>(report: &T) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Renders a CSV export into a `String`.
pub fn csv_string<F>(write: F) -> Result<String, ExportError>
where
    F: FnOnce(&mut Vec<u8>) -> Result<(), ExportError>,
{
    let mut buffer = Vec::new();
    write(&mut buffer)?;
    String::from_utf8(buffer).map_err(|e| {
        ExportError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })
}
