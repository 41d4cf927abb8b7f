//! In-memory analysis session: the current entry list plus names.
//!
//! Nothing here touches disk; a session lives as long as the process.

use anyhow::{bail, Result};
use chrono::{DateTime, Local, NaiveDate};

use crate::aggregate::{aggregate, Aggregation};
use crate::entry::{Entry, ExtractionResult};
use crate::report::MonthlyReport;

#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Name returned by extraction; may be empty
    pub client_name: String,
    /// Name confirmed by the user for the report
    pub display_name: String,
    pub entries: Vec<Entry>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held list with a fresh analysis result.
    /// The display name is reset to the extracted name.
    pub fn replace(&mut self, result: ExtractionResult) {
        self.display_name = result.client_name.clone();
        self.client_name = result.client_name;
        self.entries = result.entries;
    }

    /// Append a blank row and return its index
    pub fn add_row(&mut self, today: NaiveDate) -> usize {
        self.entries.push(Entry::blank(today));
        self.entries.len() - 1
    }

    pub fn update_row(&mut self, index: usize, entry: Entry) -> Result<()> {
        match self.entries.get_mut(index) {
            Some(slot) => {
                *slot = entry;
                Ok(())
            }
            None => bail!("row {} out of range ({} rows)", index, self.entries.len()),
        }
    }

    pub fn remove_row(&mut self, index: usize) -> Result<Entry> {
        if index >= self.entries.len() {
            bail!("row {} out of range ({} rows)", index, self.entries.len());
        }
        Ok(self.entries.remove(index))
    }

    pub fn set_display_name(&mut self, name: impl Into<String>) {
        self.display_name = name.into();
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn aggregate(&self) -> Aggregation {
        aggregate(&self.entries)
    }

    pub fn report(&self, now: DateTime<Local>) -> MonthlyReport {
        MonthlyReport::build(&self.entries, self.display_name.clone(), now)
    }
}
