use crate::config::SheetsConfig;
use crate::errors::{BudgetApiError, Result};
use crate::metrics::{SHEETS_FETCH_DURATION, SHEETS_FETCH_FAILURES};
use crate::retry_strategy::RetryStrategy;
use async_trait::async_trait;
use budget_core::RawRow;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use parking_lot::Mutex;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info};

const SHEETS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Source of raw spreadsheet rows.
#[async_trait]
pub trait SheetSource: Send + Sync {
    /// Fetch an A1 range, header row included.
    async fn fetch_rows(&self, range: &str) -> Result<Vec<RawRow>>;
}

#[derive(Deserialize)]
struct ServiceAccount {
    client_email: String,
    private_key: String,
    #[serde(default)]
    token_uri: Option<String>,
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Google Sheets values API client authenticated as a service account.
pub struct GoogleSheetsClient {
    client: Client,
    spreadsheet_id: String,
    api_base_url: String,
    token_url: String,
    credentials: Option<String>,
    token: Mutex<Option<CachedToken>>,
    retry: RetryStrategy,
}

impl GoogleSheetsClient {
    pub fn new(config: &SheetsConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(GoogleSheetsClient {
            client,
            spreadsheet_id: config.spreadsheet_id.clone(),
            api_base_url: config.api_base_url.clone(),
            token_url: config.token_url.clone(),
            credentials: config.service_account_json.clone(),
            token: Mutex::new(None),
            retry: RetryStrategy::with_max_retries(config.max_retries),
        })
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.as_deref().map_or(false, |c| !c.trim().is_empty())
    }

    fn service_account(&self) -> Result<ServiceAccount> {
        let raw = self
            .credentials
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| {
                BudgetApiError::Config(
                    "Missing GOOGLE_SERVICE_ACCOUNT_JSON environment variable".to_string(),
                )
            })?;

        serde_json::from_str(raw).map_err(|e| {
            BudgetApiError::Config(format!("Invalid service account credentials: {}", e))
        })
    }

    fn values_url(&self, range: &str) -> Result<Url> {
        let mut url = Url::parse(&self.api_base_url)
            .map_err(|e| BudgetApiError::Config(format!("Invalid Sheets API URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| BudgetApiError::Config("Sheets API URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["spreadsheets", self.spreadsheet_id.as_str(), "values", range]);
        url.query_pairs_mut().append_pair("majorDimension", "ROWS");
        Ok(url)
    }

    async fn access_token(&self) -> Result<String> {
        {
            let cached = self.token.lock();
            if let Some(token) = cached.as_ref() {
                if token.expires_at > Utc::now() + ChronoDuration::seconds(60) {
                    return Ok(token.token.clone());
                }
            }
        }

        let account = self.service_account()?;
        let fresh = self.request_token(&account).await?;
        let token = fresh.token.clone();
        *self.token.lock() = Some(fresh);
        Ok(token)
    }

    async fn request_token(&self, account: &ServiceAccount) -> Result<CachedToken> {
        let token_url = account.token_uri.as_deref().unwrap_or(&self.token_url);
        let now = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &account.client_email,
            scope: SHEETS_READONLY_SCOPE,
            aud: token_url,
            iat: now,
            exp: now + 3600,
        };
        let key = EncodingKey::from_rsa_pem(account.private_key.as_bytes())?;
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &key)?;

        let response = self
            .client
            .post(token_url)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let response = check_status(response, "Token request").await?;
        let token = response.json::<TokenResponse>().await?;

        info!("Obtained Sheets access token for {}", account.client_email);

        Ok(CachedToken {
            token: token.access_token,
            expires_at: Utc::now() + ChronoDuration::seconds(token.expires_in.unwrap_or(3600)),
        })
    }

    async fn fetch_once(&self, range: &str) -> Result<Vec<RawRow>> {
        let token = self.access_token().await?;
        let url = self.values_url(range)?;

        debug!("Fetching sheet range {}", range);

        let response = self.client.get(url).bearer_auth(token).send().await?;
        let response = check_status(response, "Values request").await?;
        let body = response.json::<ValueRange>().await?;

        Ok(body
            .values
            .iter()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect())
    }
}

#[async_trait]
impl SheetSource for GoogleSheetsClient {
    async fn fetch_rows(&self, range: &str) -> Result<Vec<RawRow>> {
        let timer = SHEETS_FETCH_DURATION.with_label_values(&[range]).start_timer();
        let result = self
            .retry
            .run(range, || self.fetch_once(range))
            .await;
        timer.observe_duration();

        match &result {
            Ok(rows) => info!("Fetched {} rows from {}", rows.len(), range),
            Err(e) => {
                SHEETS_FETCH_FAILURES.with_label_values(&[range, e.kind()]).inc();
                error!("Failed to fetch {}: {}", range, e);
            }
        }

        result
    }
}

async fn check_status(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response.text().await.unwrap_or_default();
    let message = format!("{} failed with status {}: {}", what, status, error_text);
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        Err(BudgetApiError::Sheets(message))
    } else {
        Err(BudgetApiError::SheetsRejected(message))
    }
}

/// Render a values API cell as the text the sheet shows.
pub fn cell_to_string(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}
