use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BudgetApiError>;

#[derive(Error, Debug)]
pub enum BudgetApiError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Sheets API error: {0}")]
    Sheets(String),

    #[error("Sheets API rejected request: {0}")]
    SheetsRejected(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Token signing error: {0}")]
    Auth(#[from] jsonwebtoken::errors::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ResponseError for BudgetApiError {
    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();

        HttpResponse::build(status_code).json(json!({
            "success": false,
            "error": self.error_label(),
            "message": self.to_string()
        }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            BudgetApiError::Validation(_) => StatusCode::BAD_REQUEST,
            BudgetApiError::Config(_)
            | BudgetApiError::Sheets(_)
            | BudgetApiError::SheetsRejected(_)
            | BudgetApiError::Http(_)
            | BudgetApiError::Auth(_)
            | BudgetApiError::Storage(_)
            | BudgetApiError::Io(_)
            | BudgetApiError::Json(_)
            | BudgetApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl BudgetApiError {
    fn error_label(&self) -> &'static str {
        match self {
            BudgetApiError::Validation(_) => "Bad request",
            _ => "Internal server error",
        }
    }

    /// Short machine name used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            BudgetApiError::Config(_) => "config",
            BudgetApiError::Sheets(_) => "sheets",
            BudgetApiError::SheetsRejected(_) => "sheets_rejected",
            BudgetApiError::Http(_) => "http",
            BudgetApiError::Auth(_) => "auth",
            BudgetApiError::Storage(_) => "storage",
            BudgetApiError::Io(_) => "io",
            BudgetApiError::Json(_) => "json",
            BudgetApiError::Validation(_) => "validation",
            BudgetApiError::Internal(_) => "internal",
        }
    }

    /// Whether retrying the same upstream call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            BudgetApiError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            BudgetApiError::Sheets(_) => true,
            _ => false,
        }
    }
}
