use lazy_static::lazy_static;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

lazy_static! {
    // HTTP metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("http_requests_total", "Total HTTP requests"),
        &["path", "status"]
    ).expect("metric can be created");

    // Business metrics
    pub static ref SIGNOFF_REQUESTS: IntCounterVec = IntCounterVec::new(
        Opts::new("signoff_requests_total", "Expense sign-off summaries served"),
        &["outcome"]
    ).expect("metric can be created");

    pub static ref SHEETS_LINK_DECISIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("sheets_link_decisions_total", "Whitelist decisions for the sheet link"),
        &["decision"]
    ).expect("metric can be created");

    pub static ref FALLBACK_SERVED: IntCounter = IntCounter::new(
        "fallback_served_total",
        "Dashboard responses served from fallback data"
    ).expect("metric can be created");

    // Upstream spreadsheet metrics
    pub static ref SHEETS_FETCH_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new("sheets_fetch_duration_seconds", "Spreadsheet range fetch duration in seconds")
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["range"]
    ).expect("metric can be created");

    pub static ref SHEETS_FETCH_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("sheets_fetch_failures_total", "Failed spreadsheet range fetches"),
        &["range", "kind"]
    ).expect("metric can be created");

    pub static ref REGISTRY: Registry = {
        let registry = Registry::new();
        register_metrics(&registry).expect("metrics can be registered");
        registry
    };
}

/// Register all metrics with the given registry
pub fn register_metrics(registry: &Registry) -> Result<(), prometheus::Error> {
    registry.register(Box::new(HTTP_REQUESTS_TOTAL.clone()))?;

    registry.register(Box::new(SIGNOFF_REQUESTS.clone()))?;
    registry.register(Box::new(SHEETS_LINK_DECISIONS.clone()))?;
    registry.register(Box::new(FALLBACK_SERVED.clone()))?;

    registry.register(Box::new(SHEETS_FETCH_DURATION.clone()))?;
    registry.register(Box::new(SHEETS_FETCH_FAILURES.clone()))?;

    Ok(())
}

/// Generate metrics output in Prometheus text format
pub fn render() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = vec![];
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registration() {
        let registry = Registry::new();
        assert!(register_metrics(&registry).is_ok());
    }

    #[test]
    fn test_render_includes_counters() {
        FALLBACK_SERVED.inc();
        let output = render().unwrap();
        assert!(output.contains("fallback_served_total"));
    }
}
