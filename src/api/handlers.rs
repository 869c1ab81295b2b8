use actix_web::{web, HttpResponse};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;

use crate::domain::order::{NewOrder, OrderCode, OrderStatus, ShippingData};
use crate::domain::refund::{MessageSender, NewRefund, RefundCode, RefundStatus};
use crate::errors::ServiceError;
use crate::notifications::{NotificationEvent, WelcomeNotice};
use super::AppState;

type ApiResult = Result<HttpResponse, ServiceError>;

// ============================================================================
// Request bodies
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusRequest {
    pub status: String,
    #[serde(default)]
    pub shipping_data: Option<ShippingData>,
}

#[derive(Debug, Deserialize)]
pub struct RefundStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct RefundMessageRequest {
    pub sender: String,
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct WelcomeRequest {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct SalesQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
    #[serde(default)]
    pub format: Option<String>,
}

// ============================================================================
// Ops
// ============================================================================

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "storefront-orders"
    }))
}

pub async fn metrics(state: web::Data<AppState>) -> ApiResult {
    let buffer = state.metrics.render()?;
    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(buffer))
}

// ============================================================================
// Orders
// ============================================================================

pub async fn list_orders(state: web::Data<AppState>) -> ApiResult {
    Ok(HttpResponse::Ok().json(state.orders.list().await?))
}

pub async fn get_order(state: web::Data<AppState>, code: web::Path<String>) -> ApiResult {
    let order = state.orders.get(&OrderCode::new(code.into_inner())).await?;
    Ok(HttpResponse::Ok().json(order))
}

pub async fn order_history(state: web::Data<AppState>, code: web::Path<String>) -> ApiResult {
    let history = state.orders.history(&OrderCode::new(code.into_inner())).await?;
    Ok(HttpResponse::Ok().json(history))
}

pub async fn place_order(state: web::Data<AppState>, body: web::Json<NewOrder>) -> ApiResult {
    let report = state.orders.place_order(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(report))
}

pub async fn change_order_status(
    state: web::Data<AppState>,
    code: web::Path<String>,
    body: web::Json<OrderStatusRequest>,
) -> ApiResult {
    let request = body.into_inner();
    let status: OrderStatus = request.status.parse()?;

    let report = state
        .orders
        .transition(&OrderCode::new(code.into_inner()), status, request.shipping_data)
        .await?;
    Ok(HttpResponse::Ok().json(report))
}

// ============================================================================
// Refunds
// ============================================================================

pub async fn list_refunds(state: web::Data<AppState>) -> ApiResult {
    Ok(HttpResponse::Ok().json(state.refunds.list().await?))
}

pub async fn get_refund(state: web::Data<AppState>, code: web::Path<String>) -> ApiResult {
    let refund = state.refunds.get(&RefundCode::new(code.into_inner())).await?;
    Ok(HttpResponse::Ok().json(refund))
}

pub async fn refund_history(state: web::Data<AppState>, code: web::Path<String>) -> ApiResult {
    let history = state.refunds.history(&RefundCode::new(code.into_inner())).await?;
    Ok(HttpResponse::Ok().json(history))
}

pub async fn open_refund(state: web::Data<AppState>, body: web::Json<NewRefund>) -> ApiResult {
    let report = state.refunds.open_refund(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(report))
}

pub async fn change_refund_status(
    state: web::Data<AppState>,
    code: web::Path<String>,
    body: web::Json<RefundStatusRequest>,
) -> ApiResult {
    let status: RefundStatus = body.status.parse()?;
    let report = state
        .refunds
        .set_status(&RefundCode::new(code.into_inner()), status)
        .await?;
    Ok(HttpResponse::Ok().json(report))
}

pub async fn append_refund_message(
    state: web::Data<AppState>,
    code: web::Path<String>,
    body: web::Json<RefundMessageRequest>,
) -> ApiResult {
    let sender: MessageSender = body.sender.parse()?;
    let report = state
        .refunds
        .append_message(&RefundCode::new(code.into_inner()), sender, &body.body)
        .await?;
    Ok(HttpResponse::Ok().json(report))
}

// ============================================================================
// Customers
// ============================================================================

pub async fn send_welcome(state: web::Data<AppState>, body: web::Json<WelcomeRequest>) -> ApiResult {
    if body.email.trim().is_empty() {
        return Err(ServiceError::Validation("Customer email cannot be empty".to_string()));
    }

    let event = NotificationEvent::Welcome(WelcomeNotice {
        customer_name: body.name.trim().to_string(),
    });
    let outcome = state.dispatcher.send(&event, &body.email).await;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "emailSent": outcome.is_delivered(),
        "notification": outcome,
    })))
}

// ============================================================================
// Reports
// ============================================================================

/// Whole days: `from` at midnight through the last instant of `to`
fn day_range(from: NaiveDate, to: NaiveDate) -> Result<(DateTime<Utc>, DateTime<Utc>), ServiceError> {
    let day_after = to
        .checked_add_signed(Duration::days(1))
        .ok_or_else(|| ServiceError::Validation(format!("Report end date {} is out of range", to)))?;

    let start = from.and_time(NaiveTime::MIN).and_utc();
    let end = day_after.and_time(NaiveTime::MIN).and_utc() - Duration::nanoseconds(1);
    Ok((start, end))
}

pub async fn sales_report(state: web::Data<AppState>, query: web::Query<SalesQuery>) -> ApiResult {
    let (from, to) = day_range(query.from, query.to)?;
    let report = state.reporter.sales_report(from, to).await?;

    match query.format.as_deref() {
        None | Some("json") => Ok(HttpResponse::Ok().json(report)),
        Some("csv") => {
            let filename = format!("sales-{}-{}.csv", query.from, query.to);
            Ok(HttpResponse::Ok()
                .content_type("text/csv; charset=utf-8")
                .insert_header((
                    "Content-Disposition",
                    format!("attachment; filename=\"{}\"", filename),
                ))
                .body(report.to_csv()?))
        }
        Some(other) => Err(ServiceError::Validation(format!(
            "Unsupported report format: {}",
            other
        ))),
    }
}
