//! Financial report generation.
//!
//! - Balance sheet with a derived retained earnings line
//! - Profit and loss
//! - Trial balance
//! - Month-end balance sheet and monthly profit and loss series
//! - CSV and JSON export

pub mod builder;
pub mod export;
pub mod service;
pub mod types;


pub use builder::{ReportBuilder, ReportSettings};
pub use export::{ExportError, ExportFormat};
pub use service::{MONTH_LABELS, ReportService, month_end, month_start};
pub use types::*;
