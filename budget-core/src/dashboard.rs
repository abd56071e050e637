//! Dashboard dataset: budget phases, line items and the payment schedule.

use crate::money::{parse_currency, sum_amounts, utilization};
use crate::RawRow;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// One budgeted task inside a phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseItem {
    /// Task name.
    pub task: String,
    /// Budgeted cost.
    pub cost: Decimal,
}

/// A construction phase and its budgeted tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseCategory {
    /// Display name, e.g. `"Phase 2: Foundation"`.
    pub category: String,
    /// Tasks in display order.
    pub items: Vec<ExpenseItem>,
    /// Sum of item costs.
    #[serde(default)]
    pub total: Decimal,
    /// Ordering key on the dashboard.
    pub phase: u32,
}

impl ExpenseCategory {
    fn new(category: &str, phase: u32, items: &[(&str, Decimal)]) -> Self {
        let mut category = Self {
            category: category.to_string(),
            items: items
                .iter()
                .map(|(task, cost)| ExpenseItem {
                    task: task.to_string(),
                    cost: *cost,
                })
                .collect(),
            total: Decimal::ZERO,
            phase,
        };
        category.recompute_total();
        category
    }

    /// Sum of the item costs.
    pub fn items_total(&self) -> Decimal {
        sum_amounts(self.items.iter().map(|item| item.cost))
    }

    /// Reset `total` to the sum of the items.
    pub fn recompute_total(&mut self) {
        self.total = self.items_total();
    }
}

/// A scheduled contractor payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMilestone {
    /// 1-based position in the schedule.
    pub num: u32,
    /// Milestone title.
    pub title: String,
    /// Planned payment.
    pub planned: Decimal,
    /// Amount actually paid so far.
    pub actual: Decimal,
    /// `actual / planned` in percent, capped at 100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utilization: Option<Decimal>,
}

/// Everything the dashboard renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AduData {
    /// Budget phases.
    pub expenses: Vec<ExpenseCategory>,
    /// Payment schedule, only present when read from the spreadsheet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payments: Option<Vec<PaymentMilestone>>,
    /// When this dataset was produced; always set by the server.
    #[serde(default = "Utc::now", skip_deserializing)]
    pub last_updated: DateTime<Utc>,
}

impl AduData {
    /// Sum of all phase totals.
    pub fn total_budget(&self) -> Decimal {
        sum_amounts(self.expenses.iter().map(|phase| phase.total))
    }

    /// Recompute every phase total from its items.
    pub fn recompute_totals(&mut self) {
        for phase in &mut self.expenses {
            phase.recompute_total();
        }
    }

    /// Stamp the dataset with the current time.
    pub fn touch(mut self) -> Self {
        self.last_updated = Utc::now();
        self
    }

    /// Build the dataset from the "Payment Schedule" and flat "Expenses"
    /// ranges. Both include their header row.
    pub fn from_sheet_rows(payment_rows: &[RawRow], expense_rows: &[RawRow]) -> Self {
        Self {
            expenses: group_expense_lines(parse_expense_lines(expense_rows)),
            payments: Some(parse_payments(payment_rows)),
            last_updated: Utc::now(),
        }
    }

    /// Built-in dataset served when neither the spreadsheet nor a saved
    /// fallback file is available.
    pub fn fallback() -> Self {
        let expenses = vec![
            ExpenseCategory::new(
                "Phase 1: Site Mobilization",
                1,
                &[
                    ("Architect and Engineering", dec!(8000)),
                    ("Porta Potty", dec!(2100)),
                    ("Trash Fee", dec!(2600)),
                    ("Demo", dec!(4500)),
                    ("Clearing and Grubbing", dec!(2100)),
                    ("Excavation and Grading", dec!(2500)),
                ],
            ),
            ExpenseCategory::new("Phase 2: Foundation", 2, &[("Footings", dec!(26000))]),
            ExpenseCategory::new(
                "Phase 3: Rough MEP",
                3,
                &[
                    ("Plumbing, gas, and electrical", dec!(9500)),
                    ("HVAC & Mechanical", dec!(7400)),
                    ("Electrical", dec!(12000)),
                    ("Plumbing", dec!(5200)),
                ],
            ),
            ExpenseCategory::new("Phase 4: Framing", 4, &[("Framing", dec!(28000))]),
            ExpenseCategory::new(
                "Phase 5: Exterior",
                5,
                &[
                    ("Roofing", dec!(17000)),
                    ("Doors and Windows", dec!(11500)),
                    ("Exterior Stucco", dec!(12000)),
                    ("Exterior Stairs", dec!(3000)),
                    ("Insulation", dec!(4000)),
                    ("Drywall", dec!(11500)),
                ],
            ),
            ExpenseCategory::new(
                "Phase 6: Final Completion",
                6,
                &[
                    ("Interior Painting", dec!(4400)),
                    ("Flooring", dec!(6576)),
                    ("ADU Kitchen", dec!(5500)),
                    ("ADU Bathroom 1", dec!(9500)),
                    ("Powder Room", dec!(5800)),
                    ("Lighting", dec!(4500)),
                    ("Baseboards", dec!(2700)),
                    ("Door Trim", dec!(2600)),
                    ("Paving", dec!(2500)),
                    ("Deputy Inspection", dec!(1500)),
                ],
            ),
            ExpenseCategory::new(
                "OHP (Overhead & Profit)",
                7,
                &[
                    ("General Contractor Overhead", dec!(6000)),
                    ("General Contractor Profit", dec!(5124)),
                ],
            ),
        ];

        Self {
            expenses,
            payments: None,
            last_updated: Utc::now(),
        }
    }
}

/// Parse the "Payment Schedule" range.
///
/// The header is skipped; rows with fewer than four cells are ignored but
/// still advance the milestone number. Title is column B, planned column C
/// and actual column E.
pub fn parse_payments(rows: &[RawRow]) -> Vec<PaymentMilestone> {
    rows.iter()
        .skip(1)
        .enumerate()
        .filter(|(_, row)| row.len() >= 4)
        .map(|(i, row)| {
            let planned = parse_currency(&row[2]);
            let actual = row.get(4).map(|c| parse_currency(c)).unwrap_or(Decimal::ZERO);
            PaymentMilestone {
                num: (i + 1) as u32,
                title: row[1].clone(),
                planned,
                actual,
                utilization: Some(utilization(actual, planned)),
            }
        })
        .collect()
}

/// Parse the flat two-column "Expenses" range into `(category, cost)` lines.
pub fn parse_expense_lines(rows: &[RawRow]) -> Vec<(String, Decimal)> {
    rows.iter()
        .skip(1)
        .filter(|row| row.len() >= 2)
        .map(|row| (row[0].trim().to_string(), parse_currency(&row[1])))
        .collect()
}

/// Group expense lines by category in first-seen order, numbering phases
/// from 1.
pub fn group_expense_lines(lines: Vec<(String, Decimal)>) -> Vec<ExpenseCategory> {
    let mut phases: Vec<ExpenseCategory> = Vec::new();
    for (category, cost) in lines {
        let item = ExpenseItem {
            task: category.clone(),
            cost,
        };
        match phases.iter_mut().find(|p| p.category == category) {
            Some(phase) => phase.items.push(item),
            None => {
                let phase = phases.len() as u32 + 1;
                phases.push(ExpenseCategory {
                    category,
                    items: vec![item],
                    total: Decimal::ZERO,
                    phase,
                });
            }
        }
    }
    for phase in &mut phases {
        phase.recompute_total();
    }
    phases
}
