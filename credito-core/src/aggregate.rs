//! Monthly aggregation: pivots entries into description x month sums
//! with row/column totals and summary statistics.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::entry::{Entry, MonthKey};

/// Month with the highest column total
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestMonth {
    pub month: MonthKey,
    pub total: f64,
}

/// Derived summary values shown next to the pivot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    /// Length of the unfiltered input, including excluded entries
    pub transaction_count: usize,
    pub monthly_average: f64,
    pub best_month: Option<BestMonth>,
}

/// Pivot table over aggregatable entries.
///
/// Cell presence is tracked by key: a (description, month) pair without entries
/// has no key, while a pair whose amounts cancel out holds `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregation {
    pub cells: BTreeMap<String, BTreeMap<MonthKey, f64>>,
    pub row_totals: BTreeMap<String, f64>,
    pub column_totals: BTreeMap<MonthKey, f64>,
    pub grand_total: f64,
    pub sorted_descriptions: Vec<String>,
    pub sorted_months: Vec<MonthKey>,
    pub statistics: Statistics,
    #[serde(skip)]
    included: usize,
}

/// One rendered row: description, per-month cells in `sorted_months` order, row total
#[derive(Debug, Clone, PartialEq)]
pub struct PivotRow<'a> {
    pub description: &'a str,
    pub cells: Vec<Option<f64>>,
    pub total: f64,
}

/// Aggregate `entries` by description and calendar month.
///
/// Entries with an empty description or a date that is not `YYYY-MM-DD` are
/// skipped; they still count towards `statistics.transaction_count`.
pub fn aggregate(entries: &[Entry]) -> Aggregation {
    let mut cells: BTreeMap<String, BTreeMap<MonthKey, f64>> = BTreeMap::new();
    let mut row_totals: BTreeMap<String, f64> = BTreeMap::new();
    let mut column_totals: BTreeMap<MonthKey, f64> = BTreeMap::new();
    let mut grand_total = 0.0;
    let mut included = 0;

    for entry in entries {
        if entry.description.is_empty() {
            continue;
        }
        let Some(month) = entry.month_key() else {
            continue;
        };

        *cells
            .entry(entry.description.clone())
            .or_default()
            .entry(month.clone())
            .or_insert(0.0) += entry.amount;
        *row_totals.entry(entry.description.clone()).or_insert(0.0) += entry.amount;
        *column_totals.entry(month).or_insert(0.0) += entry.amount;
        grand_total += entry.amount;
        included += 1;
    }

    // BTreeMap keys iterate in ascending code-point order
    let sorted_descriptions: Vec<String> = row_totals.keys().cloned().collect();
    let sorted_months: Vec<MonthKey> = column_totals.keys().cloned().collect();

    let monthly_average = if sorted_months.is_empty() {
        0.0
    } else {
        grand_total / sorted_months.len() as f64
    };

    let statistics = Statistics {
        transaction_count: entries.len(),
        monthly_average,
        best_month: best_month(&column_totals),
    };

    Aggregation {
        cells,
        row_totals,
        column_totals,
        grand_total,
        sorted_descriptions,
        sorted_months,
        statistics,
        included,
    }
}

/// Maximum column total; ties keep the earliest month.
fn best_month(column_totals: &BTreeMap<MonthKey, f64>) -> Option<BestMonth> {
    let mut best: Option<BestMonth> = None;
    for (month, &total) in column_totals {
        match &best {
            Some(b) if total <= b.total => {}
            _ => {
                best = Some(BestMonth {
                    month: month.clone(),
                    total,
                })
            }
        }
    }
    best
}

impl Aggregation {
    /// Summed amount for a pair, `None` when no entry fell into it
    pub fn cell(&self, description: &str, month: &MonthKey) -> Option<f64> {
        self.cells.get(description)?.get(month).copied()
    }

    /// Number of entries that contributed to the sums
    pub fn included_count(&self) -> usize {
        self.included
    }

    /// Entries dropped for a missing description or malformed date
    pub fn excluded_count(&self) -> usize {
        self.statistics.transaction_count - self.included
    }

    pub fn is_empty(&self) -> bool {
        self.sorted_descriptions.is_empty()
    }

    /// Rows in description order, cells aligned with `sorted_months`
    pub fn rows(&self) -> impl Iterator<Item = PivotRow<'_>> + '_ {
        self.sorted_descriptions.iter().map(move |desc| PivotRow {
            description: desc.as_str(),
            cells: self
                .sorted_months
                .iter()
                .map(|m| self.cell(desc, m))
                .collect(),
            total: self.row_totals.get(desc).copied().unwrap_or(0.0),
        })
    }
}
