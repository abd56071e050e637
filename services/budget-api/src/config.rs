use config::{ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

const DEFAULT_SPREADSHEET_ID: &str = "1ZTX4H7qQPVZcU4TwoXcOVdbovHmRy3DZrcdfA3Qw2wk";
const DEFAULT_SHEET_URL: &str =
    "https://docs.google.com/spreadsheets/d/1ZTX4H7qQPVZcU4TwoXcOVdbovHmRy3DZrcdfA3Qw2wk/edit?gid=361465694";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub sheets: SheetsConfig,
    pub access: AccessConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    pub signoff_range: String,       // Tab read by the sign-off summary
    pub payments_range: String,
    pub expenses_range: String,      // Flat category/cost range for the dashboard
    pub api_base_url: String,
    pub token_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub live_dashboard_data: bool,   // Serve /api/data from the sheet instead of the fallback
    #[serde(default)]
    pub service_account_json: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AccessConfig {
    pub whitelisted_emails: String,  // Comma separated
    pub sheet_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    pub data_file: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let mut builder = config::Config::builder()
            // Start with default configuration
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8888)?
            .set_default("server.workers", 4)?
            .set_default("sheets.spreadsheet_id", DEFAULT_SPREADSHEET_ID)?
            .set_default("sheets.signoff_range", "Expenses!A:G")?
            .set_default("sheets.payments_range", "'Payment Schedule'!A1:E10")?
            .set_default("sheets.expenses_range", "'Expenses'!A1:C30")?
            .set_default("sheets.api_base_url", "https://sheets.googleapis.com/v4")?
            .set_default("sheets.token_url", "https://oauth2.googleapis.com/token")?
            .set_default("sheets.timeout_secs", 10)?
            .set_default("sheets.max_retries", 2)?
            .set_default("sheets.live_dashboard_data", false)?
            .set_default("access.whitelisted_emails", "")?
            .set_default("access.sheet_url", DEFAULT_SHEET_URL)?
            .set_default("storage.data_file", "data.json")?;

        // Add environment-specific config file if it exists
        if let Ok(config_file) = env::var("CONFIG_FILE") {
            builder = builder.add_source(File::with_name(&config_file).required(false));
        } else {
            builder = builder.add_source(
                File::with_name(&format!("config/{}", environment)).required(false),
            );
        }

        // Override with environment variables
        builder = builder.add_source(Environment::with_prefix("BUDGET_API").separator("__"));

        // Special handling for common env vars
        if let Ok(host) = env::var("HOST") {
            builder = builder.set_override("server.host", host)?;
        }

        if let Ok(port) = env::var("PORT") {
            builder = builder.set_override("server.port", port)?;
        }

        if let Ok(sheet_id) = env::var("SHEET_ID") {
            builder = builder.set_override("sheets.spreadsheet_id", sheet_id)?;
        }

        if let Ok(credentials) = env::var("GOOGLE_SERVICE_ACCOUNT_JSON") {
            builder = builder.set_override("sheets.service_account_json", credentials)?;
        }

        // The dashboard front end shares its whitelist variable with us.
        if let Ok(emails) = env::var("WHITELISTED_EMAILS").or_else(|_| env::var("VITE_WHITELISTED_EMAILS")) {
            builder = builder.set_override("access.whitelisted_emails", emails)?;
        }

        if let Ok(sheet_url) = env::var("SHEET_URL") {
            builder = builder.set_override("access.sheet_url", sheet_url)?;
        }

        if let Ok(data_file) = env::var("DATA_FILE") {
            builder = builder.set_override("storage.data_file", data_file)?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("Server port cannot be 0".to_string());
        }

        if self.server.workers == 0 {
            return Err("At least one worker is required".to_string());
        }

        if self.sheets.spreadsheet_id.trim().is_empty() {
            return Err("Spreadsheet ID is required".to_string());
        }

        if self.sheets.timeout_secs == 0 {
            return Err("Sheets timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}
