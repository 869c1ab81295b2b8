// ============================================================================
// Operator API - actix-web surface for the console and checkout
// ============================================================================
//
// Routes:
// - Orders:    list, get, history, place, change status
// - Refunds:   list, get, history, open, change status, append message
// - Customers: welcome email after registration
// - Reports:   sales over a date range (JSON or CSV)
// - Ops:       /metrics (Prometheus text format) and /health
//
// Every operation returns 2xx when the state change succeeded, whatever
// happened to the notification; the report body carries that outcome.
//
// ============================================================================

mod handlers;

use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, HttpServer, ResponseError};
use std::sync::Arc;

use crate::domain::order::OrderLifecycleManager;
use crate::domain::refund::RefundLifecycleManager;
use crate::errors::ServiceError;
use crate::metrics::Metrics;
use crate::notifications::NotificationDispatcher;
use crate::reporting::SalesReporter;

/// Shared handles for every request
#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<OrderLifecycleManager>,
    pub refunds: Arc<RefundLifecycleManager>,
    pub reporter: Arc<SalesReporter>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub metrics: Arc<Metrics>,
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            ServiceError::Storage(e) => {
                tracing::error!(error = %format!("{:#}", e), "Request failed on storage");
                "Internal storage error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "success": false,
            "error": message,
        }))
    }
}

/// Register every route on an actix `App`
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health))
        .route("/metrics", web::get().to(handlers::metrics))
        .service(
            web::scope("/orders")
                .route("", web::get().to(handlers::list_orders))
                .route("", web::post().to(handlers::place_order))
                .route("/{code}", web::get().to(handlers::get_order))
                .route("/{code}/history", web::get().to(handlers::order_history))
                .route("/{code}/status", web::post().to(handlers::change_order_status)),
        )
        .service(
            web::scope("/refunds")
                .route("", web::get().to(handlers::list_refunds))
                .route("", web::post().to(handlers::open_refund))
                .route("/{code}", web::get().to(handlers::get_refund))
                .route("/{code}/history", web::get().to(handlers::refund_history))
                .route("/{code}/status", web::post().to(handlers::change_refund_status))
                .route("/{code}/messages", web::post().to(handlers::append_refund_message)),
        )
        .route("/customers/welcome", web::post().to(handlers::send_welcome))
        .route("/reports/sales", web::get().to(handlers::sales_report));
}

/// Serve the API until the process is stopped
pub async fn serve(state: AppState, port: u16) -> std::io::Result<()> {
    tracing::info!("🌐 Starting operator API on http://0.0.0.0:{}", port);

    HttpServer::new(move || {
        actix_web::App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(configure)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_of(err: ServiceError) -> (StatusCode, serde_json::Value) {
        let response = err.error_response();
        let status = response.status();
        let body = to_bytes(response.into_body()).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[actix_web::test]
    async fn test_storage_error_body_hides_backend_detail() {
        let err = ServiceError::Storage(anyhow::anyhow!("connection refused by 10.0.0.7:9042"));
        let (status, body) = body_of(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Internal storage error");
    }

    #[actix_web::test]
    async fn test_client_errors_keep_their_message() {
        let (status, body) = body_of(ServiceError::Conflict("Order DB-1001 already exists".into())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "Order DB-1001 already exists");

        let (status, body) = body_of(ServiceError::not_found("Refund RF-1")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Refund RF-1 not found");
    }
}
