use crate::errors::BudgetApiError;
use crate::metrics::{self, HTTP_REQUESTS_TOTAL};
use crate::services::DashboardService;
use actix_web::dev::Service as _;
use actix_web::http::Method;
use actix_web::middleware::DefaultHeaders;
use actix_web::{web, HttpResponse};
use budget_core::AduData;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

const READ_METHODS: &str = "GET, OPTIONS";
const READ_WRITE_METHODS: &str = "GET, POST, OPTIONS";

#[derive(Debug, Deserialize)]
pub struct SheetsLinkQuery {
    pub email: Option<String>,
}

/// Health check endpoint
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "message": "ADU Dashboard API is running",
        "service": "budget-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Contractor sign-off progress
pub async fn expenses_signoff(
    service: web::Data<Arc<DashboardService>>,
) -> Result<HttpResponse, BudgetApiError> {
    let response = service.signoff_status().await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Spreadsheet link for whitelisted emails
pub async fn sheets_link(
    service: web::Data<Arc<DashboardService>>,
    query: web::Query<SheetsLinkQuery>,
) -> HttpResponse {
    let decision = service.sheets_link(query.email.as_deref());

    if decision.is_missing_email() {
        HttpResponse::BadRequest().json(decision)
    } else {
        HttpResponse::Ok().json(decision)
    }
}

/// Dashboard dataset
pub async fn get_data(service: web::Data<Arc<DashboardService>>) -> HttpResponse {
    HttpResponse::Ok().json(service.dashboard_data().await)
}

/// Overwrite the saved dataset
pub async fn save_data(
    service: web::Data<Arc<DashboardService>>,
    data: web::Json<AduData>,
) -> Result<HttpResponse, BudgetApiError> {
    service.save_dashboard_data(data.into_inner()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Data saved"
    })))
}

/// Prometheus exposition
pub async fn metrics_endpoint() -> Result<HttpResponse, BudgetApiError> {
    let body = metrics::render().map_err(|e| BudgetApiError::Internal(e.to_string()))?;
    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(body))
}

pub async fn preflight() -> HttpResponse {
    HttpResponse::Ok().finish()
}

pub async fn method_not_allowed() -> HttpResponse {
    HttpResponse::MethodNotAllowed().json(json!({ "error": "Method not allowed" }))
}

pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(json!({ "error": "Not found" }))
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| BudgetApiError::Validation(err.to_string()).into())
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| BudgetApiError::Validation(err.to_string()).into())
}

fn allow_methods(methods: &'static str) -> DefaultHeaders {
    DefaultHeaders::new().add(("Access-Control-Allow-Methods", methods))
}

/// Configure routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config()).app_data(query_config()).service(
        web::scope("")
            .route("/", web::get().to(health_check))
            .route("/health", web::get().to(health_check))
            .route("/metrics", web::get().to(metrics_endpoint))
            .service(
                web::resource("/api/expenses-signoff")
                    .route(web::get().to(expenses_signoff))
                    .route(web::method(Method::OPTIONS).to(preflight))
                    .default_service(web::to(method_not_allowed))
                    .wrap(allow_methods(READ_METHODS)),
            )
            .service(
                web::resource("/api/sheets-link")
                    .route(web::get().to(sheets_link))
                    .route(web::method(Method::OPTIONS).to(preflight))
                    .default_service(web::to(method_not_allowed))
                    .wrap(allow_methods(READ_METHODS)),
            )
            .service(
                web::resource("/api/data")
                    .route(web::get().to(get_data))
                    .route(web::post().to(save_data))
                    .route(web::method(Method::OPTIONS).to(preflight))
                    .default_service(web::to(method_not_allowed))
                    .wrap(allow_methods(READ_WRITE_METHODS)),
            )
            .service(
                web::resource("/api/refresh")
                    .route(web::get().to(get_data))
                    .route(web::method(Method::OPTIONS).to(preflight))
                    .default_service(web::to(method_not_allowed))
                    .wrap(allow_methods(READ_METHODS)),
            )
            .default_service(web::to(not_found))
            .wrap_fn(|req, srv| {
                let path = req
                    .match_pattern()
                    .unwrap_or_else(|| "unmatched".to_string());
                let fut = srv.call(req);
                async move {
                    let res = fut.await?;
                    HTTP_REQUESTS_TOTAL
                        .with_label_values(&[&path, res.status().as_str()])
                        .inc();
                    Ok(res)
                }
            })
            .wrap(
                DefaultHeaders::new()
                    .add(("Access-Control-Allow-Origin", "*"))
                    .add(("Access-Control-Allow-Headers", "Content-Type"))
                    .add(("Cache-Control", "no-cache")),
            ),
    );
}
