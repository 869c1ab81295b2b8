use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use crate::domain::aggregate::Aggregate;
use crate::domain::order::Order;
use crate::errors::ServiceError;
use crate::metrics::Metrics;
use crate::notifications::{
    DispatchOutcome, NotificationDispatcher, NotificationEvent, RefundMessageNotice,
    RefundStatusNotice, RefundSummary,
};
use crate::store::{DocumentStore, EventEnvelope, StoreError};
use super::aggregate::RefundRequest;
use super::commands::{NewRefund, RefundCommand};
use super::events::RefundEvent;
use super::value_objects::{MessageSender, RefundCode, RefundStatus};

// ============================================================================
// Refund Lifecycle Manager
// ============================================================================
//
// Same shape as the order manager: validate through the aggregate, persist
// with the expected version, then notify. The customer hears about every
// status change and every operator reply; customer messages are only stored.
//
// ============================================================================

/// Reloads allowed when another writer saved the same refund first
const MAX_APPEND_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundReport {
    pub success: bool,
    pub refund: RefundRequest,
    pub email_sent: bool,
    /// `None` when the change does not notify anyone
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<DispatchOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RefundReport {
    fn new(refund: RefundRequest, notification: Option<DispatchOutcome>) -> Self {
        Self {
            success: true,
            email_sent: notification.as_ref().is_some_and(DispatchOutcome::is_delivered),
            error: notification
                .as_ref()
                .and_then(DispatchOutcome::error)
                .map(str::to_string),
            refund,
            notification,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundOpenedReport {
    pub refund: RefundRequest,
    pub operator_notice: DispatchOutcome,
}

pub struct RefundLifecycleManager {
    refunds: Arc<dyn DocumentStore<RefundRequest>>,
    orders: Arc<dyn DocumentStore<Order>>,
    dispatcher: Arc<NotificationDispatcher>,
    metrics: Arc<Metrics>,
    code_prefix: String,
}

impl RefundLifecycleManager {
    pub fn new(
        refunds: Arc<dyn DocumentStore<RefundRequest>>,
        orders: Arc<dyn DocumentStore<Order>>,
        dispatcher: Arc<NotificationDispatcher>,
        metrics: Arc<Metrics>,
        code_prefix: impl Into<String>,
    ) -> Self {
        Self {
            refunds,
            orders,
            dispatcher,
            metrics,
            code_prefix: code_prefix.into(),
        }
    }

    pub async fn get(&self, code: &RefundCode) -> Result<RefundRequest, ServiceError> {
        self.refunds
            .get(code.as_str())
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Refund {}", code)))
    }

    /// All refund requests, newest first
    pub async fn list(&self) -> Result<Vec<RefundRequest>, ServiceError> {
        let mut refunds = self.refunds.list().await?;
        refunds.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.code.as_str().cmp(a.code.as_str()))
        });
        Ok(refunds)
    }

    pub async fn history(
        &self,
        code: &RefundCode,
    ) -> Result<Vec<EventEnvelope<RefundEvent>>, ServiceError> {
        self.get(code).await?;
        Ok(self.refunds.history(code.as_str()).await?)
    }

    /// Open a refund for an existing order and tell the operator about it
    pub async fn open_refund(&self, request: NewRefund) -> Result<RefundOpenedReport, ServiceError> {
        tracing::info!(order_code = %request.order_code, amount = %request.amount, "Opening refund");

        let order = self
            .orders
            .get(request.order_code.as_str())
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Order {}", request.order_code)))?;

        let code = request
            .code
            .clone()
            .unwrap_or_else(|| RefundCode::generate(&self.code_prefix));
        let (refund, event) = RefundRequest::open(code, request, &order, Utc::now())?;

        if !self.refunds.insert(&refund, &[event]).await? {
            return Err(ServiceError::Conflict(format!(
                "Refund {} already exists",
                refund.code
            )));
        }

        tracing::info!(refund_code = %refund.code, order_code = %order.code, "✅ Refund opened");

        let operator_notice = self
            .dispatcher
            .send_to_operator(&NotificationEvent::AdminNewRefund(RefundSummary::from(&refund)))
            .await;

        Ok(RefundOpenedReport {
            refund,
            operator_notice,
        })
    }

    /// Persist a status change, then send the status-specific email
    pub async fn set_status(
        &self,
        code: &RefundCode,
        status: RefundStatus,
    ) -> Result<RefundReport, ServiceError> {
        tracing::info!(refund_code = %code, status = %status, "Changing refund status");

        let refund = self.execute(code, RefundCommand::SetStatus { status }).await?;

        self.metrics
            .refund_transitions
            .with_label_values(&[status.as_str()])
            .inc();

        let event = NotificationEvent::RefundStatus(RefundStatusNotice::for_refund(&refund));
        let notification = self.dispatcher.send(&event, &refund.customer.email).await;

        Ok(RefundReport::new(refund, Some(notification)))
    }

    /// Append to the thread. Operator replies are emailed to the customer
    /// verbatim; the refund status is never touched.
    pub async fn append_message(
        &self,
        code: &RefundCode,
        from: MessageSender,
        body: &str,
    ) -> Result<RefundReport, ServiceError> {
        tracing::info!(refund_code = %code, sender = from.as_str(), "Appending refund message");

        let refund = self
            .execute(
                code,
                RefundCommand::AppendMessage {
                    from,
                    body: body.to_string(),
                },
            )
            .await?;

        self.metrics
            .refund_messages
            .with_label_values(&[from.as_str()])
            .inc();

        let notification = match from {
            MessageSender::Customer => None,
            MessageSender::Operator => {
                let message = refund
                    .messages
                    .last()
                    .map(|m| m.message.clone())
                    .unwrap_or_default();
                let event = NotificationEvent::RefundMessage(RefundMessageNotice {
                    refund: RefundSummary::from(&refund),
                    message,
                });
                Some(self.dispatcher.send(&event, &refund.customer.email).await)
            }
        };

        Ok(RefundReport::new(refund, notification))
    }

    async fn execute(
        &self,
        code: &RefundCode,
        command: RefundCommand,
    ) -> Result<RefundRequest, ServiceError> {
        // A message lands on whatever the thread holds now; a status change
        // must not be re-applied over a state it did not see.
        let attempts = match command {
            RefundCommand::AppendMessage { .. } => MAX_APPEND_ATTEMPTS,
            RefundCommand::SetStatus { .. } => 1,
        };

        let mut attempt = 1;
        loop {
            let mut refund = self.get(code).await?;
            let expected_version = refund.version;

            let events = refund.execute(&command)?;
            match self.refunds.save(&refund, expected_version, &events).await {
                Ok(()) => {
                    tracing::info!(refund_code = %code, version = refund.version, "✅ Refund persisted");
                    return Ok(refund);
                }
                Err(StoreError::Conflict { .. }) if attempt < attempts => {
                    tracing::debug!(
                        refund_code = %code,
                        attempt = attempt,
                        "Concurrent refund update, retrying message append"
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
