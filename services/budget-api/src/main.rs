use actix_web::{middleware, web, App, HttpServer};
use anyhow::{anyhow, Context};
use budget_api::{
    config::Config,
    handlers,
    services::{DashboardService, SheetRanges},
    sheets_client::{GoogleSheetsClient, SheetSource},
    store::FallbackStore,
};
use budget_core::{AllowList, Authorizer};
use dotenv::dotenv;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("budget_api=info,budget_core=info,actix_web=info")
        }))
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .json()
        .init();

    info!("Starting Budget API...");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    config
        .validate()
        .map_err(|e| anyhow!("Invalid configuration: {}", e))?;

    info!("Configuration loaded successfully");

    let allow_list = AllowList::from_csv(&config.access.whitelisted_emails);
    if allow_list.is_empty() {
        warn!("No whitelisted emails configured; every sheet link request will be denied");
    } else {
        info!("Loaded {} whitelisted emails", allow_list.len());
    }
    let authorizer = Authorizer::new(allow_list, config.access.sheet_url.clone());

    // Initialize spreadsheet client
    let sheets_client = GoogleSheetsClient::new(&config.sheets)
        .context("Failed to build spreadsheet client")?;
    if !sheets_client.has_credentials() {
        warn!("GOOGLE_SERVICE_ACCOUNT_JSON is not set; spreadsheet requests will fail");
    }
    let sheets: Arc<dyn SheetSource> = Arc::new(sheets_client);

    let store = FallbackStore::new(config.storage.data_file.clone());
    info!("Fallback data file: {}", store.path().display());

    // Initialize service
    let service = Arc::new(DashboardService::new(
        sheets,
        store,
        authorizer,
        SheetRanges::from(&config.sheets),
        config.sheets.live_dashboard_data,
    ));

    info!("Dashboard service initialized successfully");

    // Start HTTP server
    let server_config = config.server.clone();
    let service_data = web::Data::new(service);

    info!(
        "Starting HTTP server on {}:{}",
        server_config.host, server_config.port
    );

    HttpServer::new(move || {
        App::new()
            .app_data(service_data.clone())
            .wrap(middleware::Logger::default())
            .configure(handlers::configure_routes)
    })
    .workers(server_config.workers)
    .bind((server_config.host, server_config.port))?
    .run()
    .await?;

    Ok(())
}
