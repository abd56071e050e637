//! Header role resolution for the expenses tab.
//!
//! Columns are located by case-insensitive substring match on the header
//! row, not by position, so the sheet owner can reorder or rename columns
//! freely as long as the keywords survive.

use std::fmt;

/// Semantic role of a column in the expenses header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnRole {
    /// Expense category, matched by "category".
    Category,
    /// Line item cost, matched by "cost".
    Cost,
    /// Invoice date, matched by "date".
    Date,
    /// Contractor sign-off, matched by "contractor", "johnny" or "sign".
    SignOff,
}

impl ColumnRole {
    /// Every role the parser needs, in resolution order.
    pub const ALL: [ColumnRole; 4] = [
        ColumnRole::Category,
        ColumnRole::Cost,
        ColumnRole::Date,
        ColumnRole::SignOff,
    ];

    /// Whether a header cell carries this role.
    pub fn matches(self, header_cell: &str) -> bool {
        let cell = header_cell.to_lowercase();
        match self {
            ColumnRole::Category => cell.contains("category"),
            ColumnRole::Cost => cell.contains("cost"),
            ColumnRole::Date => cell.contains("date"),
            ColumnRole::SignOff => {
                cell.contains("contractor") || cell.contains("johnny") || cell.contains("sign")
            }
        }
    }

    /// Index of the first header cell carrying this role.
    pub fn find(self, header: &[String]) -> Option<usize> {
        header.iter().position(|cell| self.matches(cell))
    }

    /// Stable lowercase name used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ColumnRole::Category => "category",
            ColumnRole::Cost => "cost",
            ColumnRole::Date => "date",
            ColumnRole::SignOff => "signoff",
        }
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column positions for all four roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnIndices {
    /// Category column.
    pub category: usize,
    /// Cost column.
    pub cost: usize,
    /// Date column.
    pub date: usize,
    /// Sign-off column.
    pub sign_off: usize,
}

/// Outcome of matching a header row against the four roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnResolution {
    /// Every role was found.
    Resolved(ColumnIndices),
    /// At least one role is absent from the header.
    Unresolved {
        /// Roles with no matching header cell, in [`ColumnRole::ALL`] order.
        missing: Vec<ColumnRole>,
    },
}

/// Locate the category, cost, date and sign-off columns in a header row.
pub fn resolve_columns(header: &[String]) -> ColumnResolution {
    let category = ColumnRole::Category.find(header);
    let cost = ColumnRole::Cost.find(header);
    let date = ColumnRole::Date.find(header);
    let sign_off = ColumnRole::SignOff.find(header);

    match (category, cost, date, sign_off) {
        (Some(category), Some(cost), Some(date), Some(sign_off)) => {
            ColumnResolution::Resolved(ColumnIndices {
                category,
                cost,
                date,
                sign_off,
            })
        }
        _ => {
            let found = [category, cost, date, sign_off];
            let missing = ColumnRole::ALL
                .iter()
                .zip(found)
                .filter(|(_, idx)| idx.is_none())
                .map(|(role, _)| *role)
                .collect();
            ColumnResolution::Unresolved { missing }
        }
    }
}
