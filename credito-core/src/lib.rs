//! credito-core: entry contract, monthly aggregation, report and session state

pub mod aggregate;
pub mod entry;
pub mod report;
pub mod session;

pub use aggregate::{aggregate, Aggregation, BestMonth, PivotRow, Statistics};
pub use entry::{parse_entry_date, Entry, ExtractionResult, MonthKey};
pub use report::MonthlyReport;
pub use session::Session;
