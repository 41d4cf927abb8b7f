//! Presentation: currency formatting and table / CSV / JSON / Markdown output.
//!
//! The core hands over plain numbers; everything locale-specific lives here.

use anyhow::{Context, Result};
use clap::ValueEnum;
use credito_core::{Aggregation, MonthlyReport};
use serde::{Deserialize, Serialize};

/// Shown for a (description, month) pair without transactions
pub const EMPTY_CELL: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Table,
    Csv,
    Json,
    Markdown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyFormat {
    pub symbol: String,
    pub decimal_separator: char,
    pub thousands_separator: char,
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self {
            symbol: "R$".to_string(),
            decimal_separator: ',',
            thousands_separator: '.',
        }
    }
}

impl CurrencyFormat {
    /// `1234.5` -> `R$ 1.234,50`, negatives as `-R$ 10,00`
    pub fn format(&self, amount: f64) -> String {
        let fixed = format!("{:.2}", amount.abs());
        let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

        let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
        for (i, ch) in int_part.chars().enumerate() {
            if i > 0 && (int_part.len() - i) % 3 == 0 {
                grouped.push(self.thousands_separator);
            }
            grouped.push(ch);
        }

        // -0.001 rounds to zero and should not carry a sign
        let negative = amount < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0');
        let sign = if negative { "-" } else { "" };
        let space = if self.symbol.is_empty() { "" } else { " " };
        format!(
            "{sign}{}{space}{grouped}{}{frac_part}",
            self.symbol, self.decimal_separator
        )
    }

    pub fn cell(&self, value: Option<f64>) -> String {
        value.map(|v| self.format(v)).unwrap_or_else(|| EMPTY_CELL.to_string())
    }
}

pub fn render(report: &MonthlyReport, format: OutputFormat, currency: &CurrencyFormat) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(render_table(report, currency)),
        OutputFormat::Csv => render_csv(&report.aggregation),
        OutputFormat::Json => serde_json::to_string_pretty(report).context("serialize report"),
        OutputFormat::Markdown => Ok(render_markdown(report, currency)),
    }
}

/// Header plus one line per description and a totals line, all as text cells.
fn grid(agg: &Aggregation, currency: &CurrencyFormat) -> Vec<Vec<String>> {
    let mut rows = Vec::with_capacity(agg.sorted_descriptions.len() + 2);

    let mut header = vec!["Description".to_string()];
    header.extend(agg.sorted_months.iter().map(|m| m.to_string()));
    header.push("Total".to_string());
    rows.push(header);

    for row in agg.rows() {
        let mut line = vec![row.description.to_string()];
        line.extend(row.cells.iter().map(|c| currency.cell(*c)));
        line.push(currency.format(row.total));
        rows.push(line);
    }

    let mut totals = vec!["Total".to_string()];
    totals.extend(
        agg.sorted_months
            .iter()
            .map(|m| currency.cell(agg.column_totals.get(m).copied())),
    );
    totals.push(currency.format(agg.grand_total));
    rows.push(totals);

    rows
}

fn summary_lines(report: &MonthlyReport, currency: &CurrencyFormat) -> Vec<String> {
    let agg = &report.aggregation;
    let stats = &agg.statistics;
    let mut lines = vec![
        format!("Total received: {}", currency.format(agg.grand_total)),
        format!("Transactions: {}", stats.transaction_count),
        format!("Monthly average: {}", currency.format(stats.monthly_average)),
    ];
    match &stats.best_month {
        Some(best) => lines.push(format!("Best month: {} ({})", best.month, currency.format(best.total))),
        None => lines.push(format!("Best month: {EMPTY_CELL}")),
    }
    if agg.excluded_count() > 0 {
        lines.push(format!(
            "Skipped {} entries without a description or a YYYY-MM-DD date",
            agg.excluded_count()
        ));
    }
    lines
}

fn generated_line(report: &MonthlyReport) -> String {
    format!("Generated {}", report.generated_at.format("%Y-%m-%d %H:%M"))
}

pub fn render_table(report: &MonthlyReport, currency: &CurrencyFormat) -> String {
    let mut out = String::new();
    out.push_str(&report.title());
    out.push('\n');
    out.push_str(&generated_line(report));
    out.push_str("\n\n");

    if report.aggregation.is_empty() {
        out.push_str("No credits to show.\n\n");
    } else {
        let rows = grid(&report.aggregation, currency);
        let cols = rows[0].len();
        let widths: Vec<usize> = (0..cols)
            .map(|c| rows.iter().map(|r| r[c].chars().count()).max().unwrap_or(0))
            .collect();

        let last = rows.len() - 1;
        for (i, row) in rows.iter().enumerate() {
            if i == last {
                let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
                out.push_str(rule.join("  ").trim_end());
                out.push('\n');
            }
            let cells: Vec<String> = row
                .iter()
                .enumerate()
                .map(|(c, text)| {
                    if c == 0 {
                        format!("{:<width$}", text, width = widths[c])
                    } else {
                        format!("{:>width$}", text, width = widths[c])
                    }
                })
                .collect();
            out.push_str(cells.join("  ").trim_end());
            out.push('\n');
        }
        out.push('\n');
    }

    for line in summary_lines(report, currency) {
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// Machine-readable pivot: plain decimals, empty field for absent cells.
pub fn render_csv(agg: &Aggregation) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());

    let mut header = vec!["description".to_string()];
    header.extend(agg.sorted_months.iter().map(|m| m.to_string()));
    header.push("total".to_string());
    wtr.write_record(&header)?;

    for row in agg.rows() {
        let mut line = vec![row.description.to_string()];
        line.extend(row.cells.iter().map(|c| c.map(|v| format!("{v:.2}")).unwrap_or_default()));
        line.push(format!("{:.2}", row.total));
        wtr.write_record(&line)?;
    }

    let mut totals = vec!["total".to_string()];
    totals.extend(agg.sorted_months.iter().map(|m| {
        agg.column_totals
            .get(m)
            .map(|v| format!("{v:.2}"))
            .unwrap_or_default()
    }));
    totals.push(format!("{:.2}", agg.grand_total));
    wtr.write_record(&totals)?;

    let bytes = wtr
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flush csv: {}", e.error()))?;
    String::from_utf8(bytes).context("csv output is not utf-8")
}

pub fn render_markdown(report: &MonthlyReport, currency: &CurrencyFormat) -> String {
    let mut out = format!("# {}\n\n_{}_\n\n", report.title(), generated_line(report));

    if !report.aggregation.is_empty() {
        let rows = grid(&report.aggregation, currency);
        let cols = rows[0].len();
        for (i, row) in rows.iter().enumerate() {
            let escaped: Vec<String> = row.iter().map(|c| c.replace('|', "\\|")).collect();
            out.push_str(&format!("| {} |\n", escaped.join(" | ")));
            if i == 0 {
                let mut align = vec![":---".to_string()];
                align.extend(std::iter::repeat("---:".to_string()).take(cols - 1));
                out.push_str(&format!("| {} |\n", align.join(" | ")));
            }
        }
        out.push('\n');
    }

    for line in summary_lines(report, currency) {
        out.push_str(&format!("- {line}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};
    use credito_core::Entry;

    fn report() -> MonthlyReport {
        let entries = vec![
            Entry::new("SALARIO", 1000.0, "2024-01-10"),
            Entry::new("SALARIO", 1000.0, "2024-02-10"),
            Entry::new("PIX", 500.0, "2024-01-15"),
        ];
        let now = Local.with_ymd_and_hms(2024, 3, 5, 14, 0, 0).unwrap();
        MonthlyReport::build(&entries, "Carla", now)
    }

    #[test]
    fn test_brl_format() {
        let c = CurrencyFormat::default();
        assert_eq!(c.format(0.0), "R$ 0,00");
        assert_eq!(c.format(1234.5), "R$ 1.234,50");
        assert_eq!(c.format(1234567.891), "R$ 1.234.567,89");
        assert_eq!(c.format(-10.0), "-R$ 10,00");
        assert_eq!(c.format(-0.001), "R$ 0,00");
        assert_eq!(c.format(999.999), "R$ 1.000,00");
    }

    #[test]
    fn test_custom_format() {
        let c = CurrencyFormat {
            symbol: "$".into(),
            decimal_separator: '.',
            thousands_separator: ',',
        };
        assert_eq!(c.format(2500.0), "$ 2,500.00");
    }

    #[test]
    fn test_absent_cell_vs_zero() {
        let c = CurrencyFormat::default();
        assert_eq!(c.cell(None), "-");
        assert_eq!(c.cell(Some(0.0)), "R$ 0,00");
    }

    #[test]
    fn test_table_contents() {
        let out = render_table(&report(), &CurrencyFormat::default());
        assert!(out.starts_with("Monthly credits - Carla\nGenerated 2024-03-05 14:00"));
        assert!(out.contains("2024-01"));
        assert!(out.contains("R$ 2.500,00"));
        assert!(out.contains("Monthly average: R$ 1.250,00"));
        assert!(out.contains("Best month: 2024-01 (R$ 1.500,00)"));
        assert!(out.contains("Transactions: 3"));

        let pix = out.lines().find(|l| l.starts_with("PIX")).unwrap();
        assert!(pix.contains(" - "), "absent cell should render as dash: {pix}");
    }

    #[test]
    fn test_csv_output() {
        let csv = render_csv(&report().aggregation).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "description,2024-01,2024-02,total");
        assert_eq!(lines[1], "PIX,500.00,,500.00");
        assert_eq!(lines[2], "SALARIO,1000.00,1000.00,2000.00");
        assert_eq!(lines[3], "total,1500.00,1000.00,2500.00");
    }

    #[test]
    fn test_json_keeps_numbers() {
        let json = render(&report(), OutputFormat::Json, &CurrencyFormat::default()).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["display_name"], "Carla");
        assert_eq!(v["aggregation"]["grand_total"], 2500.0);
        assert_eq!(v["aggregation"]["cells"]["PIX"]["2024-01"], 500.0);
        assert!(v["aggregation"]["cells"]["PIX"].get("2024-02").is_none());
    }

    #[test]
    fn test_markdown_table() {
        let md = render_markdown(&report(), &CurrencyFormat::default());
        assert!(md.starts_with("# Monthly credits - Carla"));
        assert!(md.contains("| Description | 2024-01 | 2024-02 | Total |"));
        assert!(md.contains("| :--- | ---: | ---: | ---: |"));
        assert!(md.contains("| PIX | R$ 500,00 | - | R$ 500,00 |"));
    }

    #[test]
    fn test_empty_report() {
        let now = Local.with_ymd_and_hms(2024, 3, 5, 14, 0, 0).unwrap();
        let r = MonthlyReport::build(&[], "", now);
        let out = render_table(&r, &CurrencyFormat::default());
        assert!(out.contains("No credits to show."));
        assert!(out.contains("Best month: -"));
    }
}
