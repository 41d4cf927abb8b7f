//! Entry types for normalized credit transactions

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single credit transaction as handed over by extraction or user edits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entry {
    /// Free text; grouping uses exact string equality
    pub description: String,
    /// Signed amount, summed as-is
    pub amount: f64,
    /// Expected as YYYY-MM-DD; kept verbatim so malformed dates survive in the list
    pub date: String,
}

/// Output of one successful extraction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ExtractionResult {
    /// Account holder name, empty when unknown
    #[serde(rename = "clientName")]
    pub client_name: String,
    pub entries: Vec<Entry>,
}

/// `YYYY-MM` grouping key derived from an entry date
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct MonthKey(String);

impl MonthKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn year(&self) -> &str {
        &self.0[..4]
    }

    pub fn month(&self) -> &str {
        &self.0[5..]
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse a strict `YYYY-MM-DD` date: 4/2/2 ASCII digits and a real calendar day.
pub fn parse_entry_date(date: &str) -> Option<NaiveDate> {
    let b = date.as_bytes();
    if b.len() != 10 || b[4] != b'-' || b[7] != b'-' {
        return None;
    }
    let digits_ok = b
        .iter()
        .enumerate()
        .all(|(i, c)| i == 4 || i == 7 || c.is_ascii_digit());
    if !digits_ok {
        return None;
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

impl Entry {
    pub fn new(description: impl Into<String>, amount: f64, date: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            amount,
            date: date.into(),
        }
    }

    /// Row inserted by the user: empty description, zero amount, today's date.
    pub fn blank(today: NaiveDate) -> Self {
        Self::new("", 0.0, today.format("%Y-%m-%d").to_string())
    }

    /// Month key when the date is well formed
    pub fn month_key(&self) -> Option<MonthKey> {
        parse_entry_date(&self.date)?;
        Some(MonthKey(self.date[..7].to_string()))
    }

    /// Whether this entry takes part in aggregation
    pub fn is_aggregatable(&self) -> bool {
        !self.description.is_empty() && self.month_key().is_some()
    }
}
