//! Report assembly for presentation and export consumers

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::aggregate::{aggregate, Aggregation};
use crate::entry::Entry;

/// Everything an exporter needs besides currency formatting
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyReport {
    /// User-confirmed name, independent of the extracted client name
    pub display_name: String,
    pub generated_at: DateTime<Local>,
    pub aggregation: Aggregation,
}

impl MonthlyReport {
    pub fn build(entries: &[Entry], display_name: impl Into<String>, generated_at: DateTime<Local>) -> Self {
        Self {
            display_name: display_name.into(),
            generated_at,
            aggregation: aggregate(entries),
        }
    }

    /// Title line, falling back to a generic label when the name is unknown
    pub fn title(&self) -> String {
        if self.display_name.trim().is_empty() {
            "Monthly credits".to_string()
        } else {
            format!("Monthly credits - {}", self.display_name.trim())
        }
    }
}
