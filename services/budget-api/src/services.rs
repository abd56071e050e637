use crate::config::SheetsConfig;
use crate::errors::Result;
use crate::metrics::{FALLBACK_SERVED, SHEETS_LINK_DECISIONS, SIGNOFF_REQUESTS};
use crate::sheets_client::SheetSource;
use crate::store::FallbackStore;
use budget_core::{AduData, AuthDecision, Authorizer, RawRow, SignOffReport};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Ranges read from the budget spreadsheet.
#[derive(Debug, Clone)]
pub struct SheetRanges {
    pub signoff: String,
    pub payments: String,
    pub expenses: String,
}

impl From<&SheetsConfig> for SheetRanges {
    fn from(config: &SheetsConfig) -> Self {
        SheetRanges {
            signoff: config.signoff_range.clone(),
            payments: config.payments_range.clone(),
            expenses: config.expenses_range.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignOffDebug {
    pub row_count: usize,
    pub header: Option<RawRow>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignOffResponse {
    pub success: bool,
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub debug: SignOffDebug,
    pub sign_off: SignOffReport,
}

pub struct DashboardService {
    sheets: Arc<dyn SheetSource>,
    store: FallbackStore,
    authorizer: Authorizer,
    ranges: SheetRanges,
    live_dashboard_data: bool,
}

impl DashboardService {
    pub fn new(
        sheets: Arc<dyn SheetSource>,
        store: FallbackStore,
        authorizer: Authorizer,
        ranges: SheetRanges,
        live_dashboard_data: bool,
    ) -> Self {
        DashboardService {
            sheets,
            store,
            authorizer,
            ranges,
            live_dashboard_data,
        }
    }

    /// Sign-off progress over the expenses tab.
    pub async fn signoff_status(&self) -> Result<SignOffResponse> {
        let rows = match self.sheets.fetch_rows(&self.ranges.signoff).await {
            Ok(rows) => rows,
            Err(e) => {
                SIGNOFF_REQUESTS.with_label_values(&["error"]).inc();
                error!("Sign-off fetch failed: {}", e);
                return Err(e);
            }
        };

        let summary = budget_core::parse(&rows);
        SIGNOFF_REQUESTS.with_label_values(&["ok"]).inc();

        info!(
            rows = rows.len(),
            total = summary.total_count,
            signed_off = summary.signed_off_count,
            "Computed sign-off summary"
        );

        Ok(SignOffResponse {
            success: true,
            status: "ok",
            timestamp: Utc::now(),
            debug: SignOffDebug {
                row_count: rows.len(),
                header: rows.first().cloned(),
            },
            sign_off: summary.to_report(),
        })
    }

    pub fn sheets_link(&self, email: Option<&str>) -> AuthDecision {
        let decision = self.authorizer.authorize(email);

        let label = if decision.authorized {
            "granted"
        } else if decision.is_missing_email() {
            "missing_email"
        } else {
            "denied"
        };
        SHEETS_LINK_DECISIONS.with_label_values(&[label]).inc();

        decision
    }

    /// Live dataset when enabled, otherwise the saved one. Never fails.
    pub async fn dashboard_data(&self) -> AduData {
        if self.live_dashboard_data {
            match self.live_data().await {
                Ok(data) => return data,
                Err(e) => warn!("Serving fallback dashboard data: {}", e),
            }
        }

        FALLBACK_SERVED.inc();
        self.store.load().await
    }

    async fn live_data(&self) -> Result<AduData> {
        let (payments, expenses) = tokio::try_join!(
            self.sheets.fetch_rows(&self.ranges.payments),
            self.sheets.fetch_rows(&self.ranges.expenses),
        )?;

        Ok(AduData::from_sheet_rows(&payments, &expenses))
    }

    pub async fn save_dashboard_data(&self, data: AduData) -> Result<AduData> {
        self.store.save(data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::BudgetApiError;
    use async_trait::async_trait;
    use budget_core::AllowList;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use tempfile::tempdir;

    struct FixedSheets(HashMap<String, Vec<RawRow>>);

    #[async_trait]
    impl SheetSource for FixedSheets {
        async fn fetch_rows(&self, range: &str) -> Result<Vec<RawRow>> {
            self.0
                .get(range)
                .cloned()
                .ok_or_else(|| BudgetApiError::Sheets(format!("unknown range {}", range)))
        }
    }

    fn row(cells: &[&str]) -> RawRow {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn ranges() -> SheetRanges {
        SheetRanges {
            signoff: "Expenses!A:G".to_string(),
            payments: "Payments".to_string(),
            expenses: "Flat".to_string(),
        }
    }

    fn service(sheets: FixedSheets, store: FallbackStore, live: bool) -> DashboardService {
        let authorizer = Authorizer::new(AllowList::from_csv("owner@example.com"), "https://sheet");
        DashboardService::new(Arc::new(sheets), store, authorizer, ranges(), live)
    }

    #[tokio::test]
    async fn test_signoff_status_reports_header_and_counts() {
        let mut tabs = HashMap::new();
        tabs.insert(
            "Expenses!A:G".to_string(),
            vec![
                row(&["Category", "Cost", "Date", "Contractor Sign-off"]),
                row(&["Framing", "$5,000", "2024-01-10", "Yes"]),
                row(&["Plumbing", "2000", "2024-01-12", ""]),
            ],
        );
        let dir = tempdir().unwrap();
        let svc = service(FixedSheets(tabs), FallbackStore::new(dir.path().join("d.json")), false);

        let response = svc.signoff_status().await.unwrap();
        assert_eq!(response.debug.row_count, 3);
        assert_eq!(response.debug.header.as_ref().unwrap()[1], "Cost");
        assert_eq!(response.sign_off.total_count, 2);
        assert_eq!(response.sign_off.signed_off_count, 1);
        assert_eq!(response.sign_off.total_amount, "$7,000.00");
    }

    #[tokio::test]
    async fn test_signoff_status_propagates_upstream_error() {
        let dir = tempdir().unwrap();
        let svc = service(
            FixedSheets(HashMap::new()),
            FallbackStore::new(dir.path().join("d.json")),
            false,
        );
        assert!(svc.signoff_status().await.is_err());
    }

    #[tokio::test]
    async fn test_live_failure_falls_back() {
        let dir = tempdir().unwrap();
        let svc = service(
            FixedSheets(HashMap::new()),
            FallbackStore::new(dir.path().join("d.json")),
            true,
        );

        let data = svc.dashboard_data().await;
        assert_eq!(data.expenses.len(), 7);
        assert!(data.payments.is_none());
    }

    #[tokio::test]
    async fn test_live_data_groups_expense_lines() {
        let mut tabs = HashMap::new();
        tabs.insert(
            "Payments".to_string(),
            vec![
                row(&["#", "Milestone", "Planned", "Due", "Actual"]),
                row(&["1", "Deposit", "$10,000", "", "$5,000"]),
            ],
        );
        tabs.insert(
            "Flat".to_string(),
            vec![
                row(&["Category", "Cost"]),
                row(&["Framing", "$1,000"]),
                row(&["Framing", "$500"]),
                row(&["Roofing", "$2,000"]),
            ],
        );
        let dir = tempdir().unwrap();
        let svc = service(FixedSheets(tabs), FallbackStore::new(dir.path().join("d.json")), true);

        let data = svc.dashboard_data().await;
        assert_eq!(data.expenses.len(), 2);
        assert_eq!(data.expenses[0].total, dec!(1500));
        assert_eq!(data.payments.as_ref().unwrap()[0].planned, dec!(10000));
    }

    #[tokio::test]
    async fn test_sheets_link_decisions() {
        let dir = tempdir().unwrap();
        let svc = service(
            FixedSheets(HashMap::new()),
            FallbackStore::new(dir.path().join("d.json")),
            false,
        );

        assert!(svc.sheets_link(Some("Owner@Example.com")).authorized);
        assert!(!svc.sheets_link(Some("stranger@example.com")).authorized);
        assert!(svc.sheets_link(None).is_missing_email());
    }
}
