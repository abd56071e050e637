//! ADU Budget Core
//!
//! Pure, request-scoped logic behind the ADU budget dashboard.
//!
//! # Architecture
//!
//! - **Sign-off reconciliation**: raw spreadsheet rows in, [`SignOffSummary`] out
//! - **Whitelist access**: an immutable [`AllowList`] decides who gets the sheet link
//! - **Dashboard dataset**: expense phases and payment milestones, with a built-in fallback
//!
//! # Invariants
//!
//! - `pending_amount == total_amount - signed_off_amount`
//! - `signed_off_count + pending_count == total_count == items.len()`
//! - Malformed cells never abort a parse; they degrade to empty strings or zero
//! - No I/O and no shared mutable state: every function is safe to call from any worker

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod access;
pub mod columns;
pub mod dashboard;
pub mod money;
pub mod signoff;

// Re-exports
pub use access::{AllowList, AuthDecision, Authorizer, Denial};
pub use columns::{resolve_columns, ColumnIndices, ColumnResolution, ColumnRole};
pub use dashboard::{AduData, ExpenseCategory, ExpenseItem, PaymentMilestone};
pub use signoff::{parse, ExpenseRow, SignOffReport, SignOffSummary};

/// One spreadsheet row as returned by the values API.
///
/// Trailing blank cells are omitted by the source, so a row may be shorter
/// than the header. Readers must treat missing cells as empty strings.
pub type RawRow = Vec<String>;
