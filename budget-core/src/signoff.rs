//! Expense sign-off reconciliation.
//!
//! Turns the loosely structured "Expenses" tab into a [`SignOffSummary`].
//! Only rows that carry an invoice date are tracked; a row without a date
//! is treated as already paid outside this window and left out of every
//! total and count.

use crate::columns::{resolve_columns, ColumnIndices, ColumnResolution};
use crate::money::{format_usd, parse_currency, percent_complete, sum_amounts};
use crate::RawRow;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};

/// A tracked expense line that passed filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRow {
    /// Trimmed category cell.
    pub category: String,
    /// Parsed cost, always positive.
    pub cost: Decimal,
    /// Trimmed date cell, never empty.
    pub date: String,
    /// Whether the sign-off cell had any non-whitespace content.
    pub signed_off: bool,
    /// Trimmed sign-off cell as entered by the contractor.
    pub sign_off_raw_value: String,
}

/// Aggregate sign-off status over all tracked rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignOffSummary {
    /// Sum of all tracked costs.
    pub total_amount: Decimal,
    /// Sum of signed-off costs.
    pub signed_off_amount: Decimal,
    /// `total_amount - signed_off_amount`.
    pub pending_amount: Decimal,
    /// Number of tracked rows.
    pub total_count: usize,
    /// Number of signed-off rows.
    pub signed_off_count: usize,
    /// Number of rows still awaiting sign-off.
    pub pending_count: usize,
    /// Tracked rows in sheet order.
    pub items: Vec<ExpenseRow>,
}

impl SignOffSummary {
    /// The all-zero summary returned for empty or unrecognisable sheets.
    pub fn empty() -> Self {
        Self::default()
    }

    fn from_items(items: Vec<ExpenseRow>) -> Self {
        let total_amount = sum_amounts(items.iter().map(|item| item.cost));
        let signed_off_amount = sum_amounts(
            items
                .iter()
                .filter(|item| item.signed_off)
                .map(|item| item.cost),
        );
        let signed_off_count = items.iter().filter(|item| item.signed_off).count();

        Self {
            total_amount,
            signed_off_amount,
            pending_amount: total_amount.saturating_sub(signed_off_amount),
            total_count: items.len(),
            signed_off_count,
            pending_count: items.len() - signed_off_count,
            items,
        }
    }

    /// Signed-off share of the total amount, 0 when nothing is tracked.
    pub fn percent_complete(&self) -> u32 {
        percent_complete(self.signed_off_amount, self.total_amount)
    }

    /// Wire form with amounts rendered as `$1,234.56`.
    pub fn to_report(&self) -> SignOffReport {
        SignOffReport {
            total_amount: format_usd(self.total_amount),
            signed_off_amount: format_usd(self.signed_off_amount),
            pending_amount: format_usd(self.pending_amount),
            signed_off_count: self.signed_off_count,
            pending_count: self.pending_count,
            total_count: self.total_count,
            percent_complete: self.percent_complete(),
        }
    }
}

/// Display form of a [`SignOffSummary`] as served to the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignOffReport {
    /// Formatted total amount.
    pub total_amount: String,
    /// Formatted signed-off amount.
    pub signed_off_amount: String,
    /// Formatted pending amount.
    pub pending_amount: String,
    /// Number of signed-off rows.
    pub signed_off_count: usize,
    /// Number of pending rows.
    pub pending_count: usize,
    /// Number of tracked rows.
    pub total_count: usize,
    /// Signed-off share of the total, in whole percent.
    pub percent_complete: u32,
}

/// Why a data row was left out of the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowSkip {
    MissingCategoryOrCost,
    AlreadySettled,
    NonPositiveCost,
}

fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(String::as_str).unwrap_or("")
}

fn classify_row(row: &[String], cols: &ColumnIndices) -> Result<ExpenseRow, RowSkip> {
    let category = cell(row, cols.category).trim();
    let cost_cell = cell(row, cols.cost).trim();
    if category.is_empty() || cost_cell.is_empty() {
        return Err(RowSkip::MissingCategoryOrCost);
    }

    let cost = parse_currency(cost_cell);

    let date = cell(row, cols.date).trim();
    if date.is_empty() {
        return Err(RowSkip::AlreadySettled);
    }

    if cost <= Decimal::ZERO {
        return Err(RowSkip::NonPositiveCost);
    }

    let sign_off = cell(row, cols.sign_off).trim();
    Ok(ExpenseRow {
        category: category.to_string(),
        cost,
        date: date.to_string(),
        signed_off: !sign_off.is_empty(),
        sign_off_raw_value: sign_off.to_string(),
    })
}

/// Reconcile raw expense rows into a sign-off summary.
///
/// `rows[0]` is the header. Never fails: an empty sheet, a header-only
/// sheet, or a header missing any required column yields
/// [`SignOffSummary::empty`].
pub fn parse(rows: &[RawRow]) -> SignOffSummary {
    let Some((header, data)) = rows.split_first() else {
        return SignOffSummary::empty();
    };
    if data.is_empty() {
        return SignOffSummary::empty();
    }

    let cols = match resolve_columns(header) {
        ColumnResolution::Resolved(cols) => cols,
        ColumnResolution::Unresolved { missing } => {
            warn!(?missing, ?header, "Expenses header is missing required columns");
            return SignOffSummary::empty();
        }
    };

    debug!(
        category = cols.category,
        cost = cols.cost,
        date = cols.date,
        sign_off = cols.sign_off,
        "Resolved expense columns"
    );

    let mut items = Vec::new();
    let mut settled = 0usize;

    for (offset, row) in data.iter().enumerate() {
        // Sheet rows are 1-based and the header occupies row 1.
        let sheet_row = offset + 2;
        match classify_row(row, &cols) {
            Ok(item) => items.push(item),
            Err(skip) => {
                if skip == RowSkip::AlreadySettled {
                    settled += 1;
                }
                debug!(row = sheet_row, reason = ?skip, "Skipping expense row");
            }
        }
    }

    debug!(
        settled,
        tracked = items.len(),
        "Parsed expense rows"
    );

    SignOffSummary::from_items(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn rows(raw: &[&[&str]]) -> Vec<RawRow> {
        raw.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    const HEADER: &[&str] = &["Category", "Cost", "Date", "Contractor Sign-off"];

    #[test]
    fn test_end_to_end_scenario() {
        let input = rows(&[
            HEADER,
            &["Foundation", "$5,000", "2025-01-01", ""],
            &["Framing", "3000", "", "2025-01-02"],
            &["Roofing", "2000", "2025-02-01", "yes"],
        ]);

        let summary = parse(&input);
        assert_eq!(summary.total_amount, dec!(7000));
        assert_eq!(summary.signed_off_amount, dec!(2000));
        assert_eq!(summary.pending_amount, dec!(5000));
        assert_eq!(summary.total_count, 2);
        assert_eq!(summary.signed_off_count, 1);
        assert_eq!(summary.pending_count, 1);
        assert_eq!(summary.items[0].category, "Foundation");
        assert!(!summary.items[0].signed_off);
        assert_eq!(summary.items[1].sign_off_raw_value, "yes");
    }

    #[test]
    fn test_empty_and_header_only_yield_zero_summary() {
        assert_eq!(parse(&[]), SignOffSummary::empty());
        assert_eq!(parse(&rows(&[HEADER])), SignOffSummary::empty());
    }

    #[test]
    fn test_unresolved_header_yields_zero_summary() {
        let input = rows(&[
            &["Category", "Amount", "Date", "Sign-off"],
            &["Foundation", "5000", "2025-01-01", "yes"],
        ]);
        let summary = parse(&input);
        assert_eq!(summary, SignOffSummary::empty());
        assert!(summary.items.is_empty());
    }

    #[test]
    fn test_short_rows_are_padded() {
        // Trailing blank sign-off cell omitted by the API.
        let input = rows(&[HEADER, &["Plumbing", "$1,396.30", "2025-03-01"]]);
        let summary = parse(&input);
        assert_eq!(summary.total_count, 1);
        assert_eq!(summary.pending_amount, dec!(1396.30));
        assert_eq!(summary.items[0].sign_off_raw_value, "");
    }

    #[test]
    fn test_rows_missing_category_or_cost_are_excluded() {
        let input = rows(&[
            HEADER,
            &["", "100", "2025-01-01", "yes"],
            &["Footings", "   ", "2025-01-01", "yes"],
            &["  ", "100", "2025-01-01", ""],
            &["Footings"],
        ]);
        assert_eq!(parse(&input), SignOffSummary::empty());
    }

    #[test]
    fn test_undated_rows_never_count() {
        let input = rows(&[
            HEADER,
            &["Demo", "4500", "", "yes"],
            &["Demo", "4500", "   ", ""],
        ]);
        let summary = parse(&input);
        assert_eq!(summary.total_amount, Decimal::ZERO);
        assert_eq!(summary.total_count, 0);
    }

    #[test]
    fn test_non_positive_and_unparsable_costs_are_skipped() {
        let input = rows(&[
            HEADER,
            &["Landscaping", "TBD", "2025-04-01", ""],
            &["Credit", "-$250", "2025-04-01", ""],
            &["Trash Fee", "$0.00", "2025-04-01", "ok"],
            &["Lighting", "$450.25", "2025-04-01", "ok"],
        ]);
        let summary = parse(&input);
        assert_eq!(summary.total_count, 1);
        assert_eq!(summary.total_amount, dec!(450.25));
        assert_eq!(summary.signed_off_amount, dec!(450.25));
    }

    #[test]
    fn test_whitespace_sign_off_is_not_signed() {
        let input = rows(&[HEADER, &["Framing", "100", "2025-01-01", "   "]]);
        let summary = parse(&input);
        assert_eq!(summary.signed_off_count, 0);
        assert_eq!(summary.pending_count, 1);
    }

    #[test]
    fn test_any_sign_off_text_counts_as_signed() {
        let input = rows(&[
            HEADER,
            &["Framing", "100", "2025-01-01", "no"],
            &["Framing", "100", "2025-01-01", "✓"],
        ]);
        assert_eq!(parse(&input).signed_off_count, 2);
    }

    #[test]
    fn test_report_formats_amounts() {
        let input = rows(&[
            HEADER,
            &["Foundation", "$5,000", "2025-01-01", ""],
            &["Roofing", "2000", "2025-02-01", "yes"],
        ]);
        let report = parse(&input).to_report();
        assert_eq!(report.total_amount, "$7,000.00");
        assert_eq!(report.signed_off_amount, "$2,000.00");
        assert_eq!(report.pending_amount, "$5,000.00");
        assert_eq!(report.percent_complete, 29);
    }

    #[test]
    fn test_huge_costs_clamp_totals() {
        let input = rows(&[
            HEADER,
            &["Foundation", "5e28", "2025-01-01", "ok"],
            &["Framing", "5e28", "2025-01-02", ""],
            &["Roofing", "79228162514264337593543950335", "2025-01-03", ""],
            &["Siding", "1", "2025-01-04", ""],
        ]);

        let half_range = Decimal::from_scientific("5e28").unwrap();
        let summary = parse(&input);
        assert_eq!(summary.total_count, 4);
        assert_eq!(summary.signed_off_count, 1);
        assert_eq!(summary.total_amount, Decimal::MAX);
        assert_eq!(summary.signed_off_amount, half_range);
        assert_eq!(summary.pending_amount, Decimal::MAX - half_range);

        let report = summary.to_report();
        assert!(report.total_amount.starts_with("$79,228,162,514,264,337,593,543,950,335"));
        assert_eq!(report.percent_complete, 63);
    }

    #[test]
    fn test_report_of_empty_summary() {
        let report = SignOffSummary::empty().to_report();
        assert_eq!(report.total_amount, "$0.00");
        assert_eq!(report.percent_complete, 0);
        assert_eq!(report.total_count, 0);
    }
}
