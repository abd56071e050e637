pub mod config;
pub mod errors;
pub mod handlers;
pub mod metrics;
pub mod retry_strategy;
pub mod services;
pub mod sheets_client;
pub mod store;

pub use config::Config;
pub use errors::{BudgetApiError, Result};
