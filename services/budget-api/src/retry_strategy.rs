// Backoff policy for Sheets API fetches

use crate::errors::Result;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay_ms: 250,
            max_delay_ms: 2000,
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,           // 10% jitter
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryStrategy {
    config: RetryConfig,
}

impl RetryStrategy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn with_max_retries(max_retries: u32) -> Self {
        Self::new(RetryConfig {
            max_retries,
            ..RetryConfig::default()
        })
    }

    /// Backoff before retry number `retry` (0-based), with jitter.
    fn calculate_delay(&self, retry: u32) -> Duration {
        let cfg = &self.config;
        let backoff = cfg.initial_delay_ms as f64 * cfg.backoff_multiplier.powi(retry as i32);
        let capped = backoff.min(cfg.max_delay_ms as f64);
        let spread = capped * cfg.jitter_factor;
        let jittered = capped + (rand::random::<f64>() * 2.0 - 1.0) * spread;

        Duration::from_millis(jittered.max(0.0) as u64)
    }

    /// Run a Sheets call for `range`, retrying while the error is transient.
    pub async fn run<F, Fut, T>(&self, range: &str, fetch: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let attempts = self.config.max_retries + 1;
        let mut attempt = 1;

        loop {
            let err = match fetch().await {
                Ok(rows) => {
                    if attempt > 1 {
                        info!(range, attempt, "Sheets fetch recovered");
                    }
                    return Ok(rows);
                }
                Err(err) => err,
            };

            if !err.is_transient() || attempt >= attempts {
                warn!(range, attempt, kind = err.kind(), "Giving up on Sheets fetch: {}", err);
                return Err(err);
            }

            let delay = self.calculate_delay(attempt - 1);
            warn!(
                range,
                attempt,
                kind = err.kind(),
                delay_ms = delay.as_millis() as u64,
                "Sheets fetch failed, backing off: {}",
                err
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
