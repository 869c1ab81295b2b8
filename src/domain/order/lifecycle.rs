use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::aggregate::Aggregate;
use crate::domain::promo::PromoCode;
use crate::errors::ServiceError;
use crate::ledger::{CatalogLedger, StockChange};
use crate::metrics::Metrics;
use crate::notifications::{
    DispatchOutcome, NotificationDispatcher, NotificationEvent, OrderStatusNotice, OrderSummary,
};
use crate::store::{DocumentStore, EventEnvelope};
use super::aggregate::Order;
use super::commands::{NewOrder, OrderCommand};
use super::events::OrderEvent;
use super::value_objects::{OrderCode, OrderStatus, ShippingData};

// ============================================================================
// Order Lifecycle Manager
// ============================================================================
//
// Orchestrates one operator action at a time:
// 1. Load the order and run the command through the aggregate
// 2. Persist the new snapshot (optimistic, by version) and its events
// 3. Apply ledger side effects (stock, promo usage)
// 4. Attempt the customer notification and report how it went
//
// Steps 1-2 decide success. Steps 3-4 happen after the change is durable and
// can never undo it.
//
// ============================================================================

/// Result of a status change as shown to the operator
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionReport {
    pub success: bool,
    pub order: Order,
    pub email_sent: bool,
    pub notification: DispatchOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TransitionReport {
    fn new(order: Order, notification: DispatchOutcome) -> Self {
        Self {
            success: true,
            email_sent: notification.is_delivered(),
            error: notification.error().map(str::to_string),
            order,
            notification,
        }
    }
}

/// Result of accepting an order from checkout
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementReport {
    pub order: Order,
    pub confirmation: DispatchOutcome,
    pub operator_notice: DispatchOutcome,
}

/// Ledger updates taken for a placement that is not stored yet
#[derive(Debug, Default)]
struct Reservation {
    promo_code: Option<String>,
    stock: Vec<(Uuid, u32)>,
}

pub struct OrderLifecycleManager {
    store: Arc<dyn DocumentStore<Order>>,
    ledger: Arc<dyn CatalogLedger>,
    dispatcher: Arc<NotificationDispatcher>,
    metrics: Arc<Metrics>,
    code_prefix: String,
}

impl OrderLifecycleManager {
    pub fn new(
        store: Arc<dyn DocumentStore<Order>>,
        ledger: Arc<dyn CatalogLedger>,
        dispatcher: Arc<NotificationDispatcher>,
        metrics: Arc<Metrics>,
        code_prefix: impl Into<String>,
    ) -> Self {
        Self {
            store,
            ledger,
            dispatcher,
            metrics,
            code_prefix: code_prefix.into(),
        }
    }

    pub async fn get(&self, code: &OrderCode) -> Result<Order, ServiceError> {
        self.store
            .get(code.as_str())
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Order {}", code)))
    }

    /// All orders, newest first
    pub async fn list(&self) -> Result<Vec<Order>, ServiceError> {
        let mut orders = self.store.list().await?;
        orders.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.code.as_str().cmp(a.code.as_str()))
        });
        Ok(orders)
    }

    pub async fn history(&self, code: &OrderCode) -> Result<Vec<EventEnvelope<OrderEvent>>, ServiceError> {
        self.get(code).await?;
        Ok(self.store.history(code.as_str()).await?)
    }

    /// Move an order to `status`, persisting before notifying the customer.
    ///
    /// `shipping` is required when the target is `shipped` and rejected for
    /// every other target. Re-applying the current status is accepted and
    /// sends the notification again.
    pub async fn transition(
        &self,
        code: &OrderCode,
        status: OrderStatus,
        shipping: Option<ShippingData>,
    ) -> Result<TransitionReport, ServiceError> {
        tracing::info!(order_code = %code, status = %status, "Changing order status");

        let mut order = self.get(code).await?;
        let previous = order.status;
        let expected_version = order.version;

        let events = order.execute(&OrderCommand::ChangeStatus { status, shipping })?;
        self.store.save(&order, expected_version, &events).await?;

        self.metrics
            .order_transitions
            .with_label_values(&[status.as_str()])
            .inc();
        tracing::info!(
            order_code = %code,
            from = %previous,
            to = %status,
            version = order.version,
            "✅ Order status persisted"
        );

        if order.restock_due(previous) {
            for warning in self.restock(&order).await {
                tracing::warn!(order_code = %code, "{}", warning);
            }
        }

        let event = NotificationEvent::OrderStatus(OrderStatusNotice::for_order(&order));
        let notification = self.dispatcher.send(&event, &order.customer.email).await;

        Ok(TransitionReport::new(order, notification))
    }

    /// Accept a priced order from checkout.
    ///
    /// The promo use and the stock of every item are taken before the order
    /// is stored. A short item or an exhausted promo rejects the order with
    /// `Conflict`; when a later step fails, whatever was already taken is
    /// given back, so the ledger only ever counts stored orders.
    pub async fn place_order(&self, new_order: NewOrder) -> Result<PlacementReport, ServiceError> {
        let code = new_order
            .code
            .clone()
            .unwrap_or_else(|| OrderCode::generate(&self.code_prefix));

        tracing::info!(order_code = %code, items = new_order.items.len(), "Placing order");

        let (order, event) = Order::place(code, new_order, Utc::now())?;

        if self.store.get(order.code.as_str()).await?.is_some() {
            return Err(already_exists(&order.code));
        }

        if let Some(promo_code) = &order.promo_code {
            self.check_promo(promo_code).await?;
        }

        let reservation = self.reserve(&order).await?;

        match self.store.insert(&order, &[event]).await {
            Ok(true) => {}
            Ok(false) => {
                self.release(&order.code, reservation).await;
                return Err(already_exists(&order.code));
            }
            Err(e) => {
                self.release(&order.code, reservation).await;
                return Err(e.into());
            }
        }

        tracing::info!(order_code = %order.code, total = %order.total, "✅ Order stored");

        let summary = OrderSummary::from(&order);
        let confirmation = self
            .dispatcher
            .send(
                &NotificationEvent::OrderConfirmation(summary.clone()),
                &order.customer.email,
            )
            .await;
        let operator_notice = self
            .dispatcher
            .send_to_operator(&NotificationEvent::AdminNewOrder(summary))
            .await;

        Ok(PlacementReport {
            order,
            confirmation,
            operator_notice,
        })
    }

    async fn check_promo(&self, promo_code: &str) -> Result<(), ServiceError> {
        let promo = self
            .ledger
            .promo(promo_code)
            .await?
            .ok_or_else(|| ServiceError::Validation(format!("Unknown promo code: {}", promo_code)))?;

        if !promo.is_usable(Utc::now()) {
            return Err(ServiceError::Validation(format!(
                "Promo code {} is no longer valid",
                PromoCode::normalize(promo_code)
            )));
        }

        Ok(())
    }

    /// Take the promo use, then each item's stock. On the first failure
    /// everything taken so far is returned.
    async fn reserve(&self, order: &Order) -> Result<Reservation, ServiceError> {
        let mut reservation = Reservation::default();

        if let Some(promo_code) = &order.promo_code {
            let count = self.ledger.increment_promo_usage(promo_code).await?;
            self.metrics.promo_usage_increments.inc();
            tracing::debug!(promo_code = %promo_code, usage_count = count, "Promo use counted");
            reservation.promo_code = Some(promo_code.clone());
        }

        for item in &order.items {
            match self.ledger.decrement_stock(item.product_id, item.quantity).await {
                Ok(StockChange::Updated(remaining)) => {
                    self.metrics.stock_adjustments.with_label_values(&["decrement"]).inc();
                    tracing::debug!(product_id = %item.product_id, remaining, "Stock decremented");
                    reservation.stock.push((item.product_id, item.quantity));
                }
                Ok(StockChange::Untracked) => {}
                Err(e) => {
                    tracing::info!(order_code = %order.code, product = %item.name, "Order rejected: {}", e);
                    self.release(&order.code, reservation).await;
                    return Err(e.into());
                }
            }
        }

        Ok(reservation)
    }

    async fn release(&self, code: &OrderCode, reservation: Reservation) {
        for (product_id, quantity) in reservation.stock {
            match self.ledger.increment_stock(product_id, quantity).await {
                Ok(StockChange::Updated(level)) => {
                    self.metrics.stock_adjustments.with_label_values(&["increment"]).inc();
                    tracing::debug!(product_id = %product_id, level, "Reserved stock returned");
                }
                Ok(StockChange::Untracked) => {}
                Err(e) => tracing::warn!(
                    order_code = %code,
                    product_id = %product_id,
                    "Reserved stock not returned: {}",
                    e
                ),
            }
        }

        if let Some(promo_code) = reservation.promo_code {
            match self.ledger.release_promo_usage(&promo_code).await {
                Ok(count) => {
                    tracing::debug!(promo_code = %promo_code, usage_count = count, "Promo use released")
                }
                Err(e) => tracing::warn!(order_code = %code, "Promo use not released: {}", e),
            }
        }
    }

    async fn restock(&self, order: &Order) -> Vec<String> {
        let mut warnings = Vec::new();

        for item in &order.items {
            match self.ledger.increment_stock(item.product_id, item.quantity).await {
                Ok(StockChange::Updated(level)) => {
                    self.metrics.stock_adjustments.with_label_values(&["increment"]).inc();
                    tracing::debug!(product_id = %item.product_id, level, "Stock returned");
                }
                Ok(StockChange::Untracked) => {}
                Err(e) => warnings.push(format!("Stock not returned for {}: {}", item.name, e)),
            }
        }

        warnings
    }
}

fn already_exists(code: &OrderCode) -> ServiceError {
    ServiceError::Conflict(format!("Order {} already exists", code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::aggregate::tests::sample_new_order;
    use crate::domain::order::Carrier;
    use crate::domain::promo::value_objects::tests::promo;
    use crate::ledger::{LedgerError, MemoryLedger};
    use crate::notifications::dispatcher::testing::{
        dispatcher_with, working_dispatcher, RecordingTransport,
    };
    use crate::notifications::settings::tests::complete_settings;
    use crate::store::MemoryStore;
    use rust_decimal_macros::dec;

    struct Harness {
        manager: OrderLifecycleManager,
        ledger: Arc<MemoryLedger>,
        transport: Arc<RecordingTransport>,
    }

    fn harness_with(
        dispatcher: Arc<NotificationDispatcher>,
        transport: Arc<RecordingTransport>,
    ) -> Harness {
        let ledger = Arc::new(MemoryLedger::new());
        harness_on(ledger.clone(), ledger, dispatcher, transport)
    }

    /// `view` is what the manager talks to; `ledger` is the state underneath
    fn harness_on(
        ledger: Arc<MemoryLedger>,
        view: Arc<dyn CatalogLedger>,
        dispatcher: Arc<NotificationDispatcher>,
        transport: Arc<RecordingTransport>,
    ) -> Harness {
        let manager = OrderLifecycleManager::new(
            Arc::new(MemoryStore::<Order>::new()),
            view,
            dispatcher,
            Arc::new(Metrics::new().unwrap()),
            "DB",
        );
        Harness {
            manager,
            ledger,
            transport,
        }
    }

    /// Hands control back to the scheduler after every promo lookup, so two
    /// checkouts running side by side interleave between check and update.
    struct YieldingLedger(Arc<MemoryLedger>);

    #[async_trait::async_trait]
    impl CatalogLedger for YieldingLedger {
        async fn stock(&self, product_id: Uuid) -> Result<Option<u32>, LedgerError> {
            self.0.stock(product_id).await
        }

        async fn set_stock(&self, product_id: Uuid, stock: Option<u32>) -> Result<(), LedgerError> {
            self.0.set_stock(product_id, stock).await
        }

        async fn decrement_stock(&self, product_id: Uuid, quantity: u32) -> Result<StockChange, LedgerError> {
            self.0.decrement_stock(product_id, quantity).await
        }

        async fn increment_stock(&self, product_id: Uuid, quantity: u32) -> Result<StockChange, LedgerError> {
            self.0.increment_stock(product_id, quantity).await
        }

        async fn promo(&self, code: &str) -> Result<Option<PromoCode>, LedgerError> {
            let promo = self.0.promo(code).await;
            tokio::task::yield_now().await;
            promo
        }

        async fn upsert_promo(&self, promo: PromoCode) -> Result<(), LedgerError> {
            self.0.upsert_promo(promo).await
        }

        async fn increment_promo_usage(&self, code: &str) -> Result<u32, LedgerError> {
            self.0.increment_promo_usage(code).await
        }

        async fn release_promo_usage(&self, code: &str) -> Result<u32, LedgerError> {
            self.0.release_promo_usage(code).await
        }
    }

    fn yielding_harness() -> Harness {
        let (dispatcher, transport) = working_dispatcher();
        let ledger = Arc::new(MemoryLedger::new());
        harness_on(ledger.clone(), Arc::new(YieldingLedger(ledger)), dispatcher, transport)
    }

    fn with_promo(code: &str, promo_code: &str) -> NewOrder {
        let mut new_order = sample_new_order(code);
        new_order.promo_code = Some(promo_code.to_string());
        new_order.promo_discount = dec!(29.80);
        new_order.total = dec!(129.15);
        new_order
    }

    fn harness() -> Harness {
        let (dispatcher, transport) = working_dispatcher();
        harness_with(dispatcher, transport)
    }

    fn shipping(tracking_number: &str) -> ShippingData {
        ShippingData {
            tracking_number: tracking_number.to_string(),
            carrier: Carrier::AustraliaPost,
            tracking_url: None,
            delivery_days: Some("2-4".to_string()),
        }
    }

    async fn place(h: &Harness, code: &str) -> Order {
        h.manager.place_order(sample_new_order(code)).await.unwrap().order
    }

    #[tokio::test]
    async fn test_ship_pending_order_sends_tracking_email() {
        let h = harness();
        place(&h, "DB-1001").await;

        let report = h
            .manager
            .transition(&OrderCode::new("DB-1001"), OrderStatus::Shipped, Some(shipping("AP123456789")))
            .await
            .unwrap();

        assert!(report.success);
        assert!(report.email_sent);
        assert!(report.error.is_none());
        assert_eq!(report.order.status, OrderStatus::Shipped);
        assert_eq!(
            report.order.shipping.as_ref().unwrap().tracking_url,
            "https://auspost.com.au/mypost/track/#/details/AP123456789"
        );

        let sent = h.transport.sent().await;
        let shipped = sent.last().unwrap();
        assert_eq!(shipped.to, "jane@example.com");
        assert_eq!(shipped.subject, "Your order DB-1001 is on its way");
        assert!(shipped.html.contains("AP123456789"));
    }

    #[tokio::test]
    async fn test_ship_without_tracking_number_leaves_order_unchanged() {
        let h = harness();
        place(&h, "DB-1001").await;
        let sent_before = h.transport.sent().await.len();

        let result = h
            .manager
            .transition(&OrderCode::new("DB-1001"), OrderStatus::Shipped, Some(shipping("  ")))
            .await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));

        let order = h.manager.get(&OrderCode::new("DB-1001")).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.shipping.is_none());
        assert_eq!(h.transport.sent().await.len(), sent_before);
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_revert_status() {
        let transport = Arc::new(RecordingTransport::failing());
        let h = harness_with(dispatcher_with(complete_settings(), transport.clone()), transport);
        place(&h, "DB-1001").await;

        let report = h
            .manager
            .transition(&OrderCode::new("DB-1001"), OrderStatus::Processing, None)
            .await
            .unwrap();

        assert!(report.success);
        assert!(!report.email_sent);
        assert!(report.error.is_some());

        let stored = h.manager.get(&OrderCode::new("DB-1001")).await.unwrap();
        assert_eq!(stored.status, OrderStatus::Processing);
    }

    #[tokio::test]
    async fn test_unknown_order_is_not_found() {
        let h = harness();
        let result = h
            .manager
            .transition(&OrderCode::new("DB-9999"), OrderStatus::Processing, None)
            .await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_backward_move_is_rejected() {
        let h = harness();
        place(&h, "DB-1001").await;
        let code = OrderCode::new("DB-1001");
        h.manager.transition(&code, OrderStatus::Shipped, Some(shipping("AP1"))).await.unwrap();
        h.manager.transition(&code, OrderStatus::Delivered, None).await.unwrap();

        let result = h.manager.transition(&code, OrderStatus::Pending, None).await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
        assert_eq!(h.manager.get(&code).await.unwrap().status, OrderStatus::Delivered);
    }

    #[tokio::test]
    async fn test_same_status_resends_notification() {
        let h = harness();
        place(&h, "DB-1001").await;
        let code = OrderCode::new("DB-1001");
        let before = h.transport.sent().await.len();

        h.manager.transition(&code, OrderStatus::Processing, None).await.unwrap();
        let report = h.manager.transition(&code, OrderStatus::Processing, None).await.unwrap();

        assert!(report.email_sent);
        assert_eq!(h.transport.sent().await.len(), before + 2);
    }

    #[tokio::test]
    async fn test_history_is_append_only() {
        let h = harness();
        place(&h, "DB-1001").await;
        let code = OrderCode::new("DB-1001");
        h.manager.transition(&code, OrderStatus::Processing, None).await.unwrap();
        h.manager.transition(&code, OrderStatus::Shipped, Some(shipping("AP1"))).await.unwrap();

        let history = h.manager.history(&code).await.unwrap();
        let types: Vec<&str> = history.iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(
            types,
            vec!["OrderPlaced", "OrderStatusChanged", "OrderShippingRecorded", "OrderStatusChanged"]
        );
        let sequence: Vec<i64> = history.iter().map(|e| e.sequence_number).collect();
        assert_eq!(sequence, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_placement_decrements_stock_and_counts_promo_once() {
        let h = harness();
        let new_order = with_promo("DB-2001", "save20");

        h.ledger.set_stock(new_order.items[0].product_id, Some(5)).await.unwrap();
        h.ledger.upsert_promo(promo("SAVE20", 0, 3)).await.unwrap();

        let report = h.manager.place_order(new_order.clone()).await.unwrap();
        assert!(report.confirmation.is_delivered());
        assert!(report.operator_notice.is_delivered());

        assert_eq!(h.ledger.stock(new_order.items[0].product_id).await.unwrap(), Some(4));
        assert_eq!(h.ledger.stock(new_order.items[1].product_id).await.unwrap(), None);
        assert_eq!(h.ledger.promo("SAVE20").await.unwrap().unwrap().usage_count, 4);

        // Replaying the same submission touches nothing
        let replay = h.manager.place_order(new_order.clone()).await;
        assert!(matches!(replay, Err(ServiceError::Conflict(_))));
        assert_eq!(h.ledger.stock(new_order.items[0].product_id).await.unwrap(), Some(4));
        assert_eq!(h.ledger.promo("SAVE20").await.unwrap().unwrap().usage_count, 4);
    }

    #[tokio::test]
    async fn test_concurrent_orders_count_promo_twice() {
        let h = harness();
        h.ledger.upsert_promo(promo("SUMMER20", 100, 10)).await.unwrap();

        let (a, b) = tokio::join!(
            h.manager.place_order(with_promo("DB-4001", "summer20")),
            h.manager.place_order(with_promo("DB-4002", "summer20"))
        );
        a.unwrap();
        b.unwrap();
        assert_eq!(h.ledger.promo("SUMMER20").await.unwrap().unwrap().usage_count, 12);
    }

    #[tokio::test]
    async fn test_exhausted_promo_rejects_order() {
        let h = harness();
        let new_order = with_promo("DB-2002", "SAVE20");
        h.ledger.upsert_promo(promo("SAVE20", 3, 3)).await.unwrap();

        let result = h.manager.place_order(new_order).await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
        assert!(h.manager.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_last_promo_use_goes_to_one_of_two_racing_orders() {
        let h = yielding_harness();
        h.ledger.upsert_promo(promo("LAST1", 3, 2)).await.unwrap();

        let (a, b) = tokio::join!(
            h.manager.place_order(with_promo("DB-5001", "last1")),
            h.manager.place_order(with_promo("DB-5002", "LAST1"))
        );

        let accepted = [&a, &b].iter().filter(|result| result.is_ok()).count();
        assert_eq!(accepted, 1);
        assert!(
            matches!(a, Err(ServiceError::Conflict(_))) || matches!(b, Err(ServiceError::Conflict(_)))
        );
        assert_eq!(h.ledger.promo("LAST1").await.unwrap().unwrap().usage_count, 3);
        assert_eq!(h.manager.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_submission_gives_back_ledger_updates() {
        let h = yielding_harness();
        let product_id = sample_new_order("DB-5101").items[0].product_id;
        let mut first = with_promo("DB-5101", "SAVE20");
        let mut second = with_promo("DB-5101", "SAVE20");
        first.items[0].product_id = product_id;
        second.items[0].product_id = product_id;
        h.ledger.set_stock(product_id, Some(5)).await.unwrap();
        h.ledger.upsert_promo(promo("SAVE20", 0, 0)).await.unwrap();

        // Both pass the existence check before either is stored
        let (a, b) = tokio::join!(h.manager.place_order(first), h.manager.place_order(second));

        assert_eq!([&a, &b].iter().filter(|result| result.is_ok()).count(), 1);
        assert!(
            matches!(a, Err(ServiceError::Conflict(_))) || matches!(b, Err(ServiceError::Conflict(_)))
        );
        assert_eq!(h.ledger.stock(product_id).await.unwrap(), Some(4));
        assert_eq!(h.ledger.promo("SAVE20").await.unwrap().unwrap().usage_count, 1);
    }

    #[tokio::test]
    async fn test_insufficient_stock_rejects_order() {
        let h = harness();
        let new_order = sample_new_order("DB-6001");
        let candles = new_order.items[1].product_id;
        h.ledger.set_stock(candles, Some(1)).await.unwrap();

        let result = h.manager.place_order(new_order).await;

        assert!(matches!(result, Err(ServiceError::Conflict(_))));
        assert_eq!(h.ledger.stock(candles).await.unwrap(), Some(1));
        assert!(h.manager.list().await.unwrap().is_empty());
        assert!(h.transport.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_short_item_returns_stock_and_promo_already_taken() {
        let h = harness();
        let new_order = with_promo("DB-6002", "SAVE20");
        let throws = new_order.items[0].product_id;
        let candles = new_order.items[1].product_id;
        h.ledger.set_stock(throws, Some(5)).await.unwrap();
        h.ledger.set_stock(candles, Some(1)).await.unwrap();
        h.ledger.upsert_promo(promo("SAVE20", 10, 3)).await.unwrap();

        let result = h.manager.place_order(new_order).await;

        assert!(matches!(result, Err(ServiceError::Conflict(_))));
        assert_eq!(h.ledger.stock(throws).await.unwrap(), Some(5));
        assert_eq!(h.ledger.stock(candles).await.unwrap(), Some(1));
        assert_eq!(h.ledger.promo("SAVE20").await.unwrap().unwrap().usage_count, 3);
        assert!(h.manager.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_restocks_once() {
        let h = harness();
        let new_order = sample_new_order("DB-3001");
        let product_id = new_order.items[1].product_id;
        h.ledger.set_stock(product_id, Some(10)).await.unwrap();
        h.manager.place_order(new_order).await.unwrap();
        assert_eq!(h.ledger.stock(product_id).await.unwrap(), Some(8));

        let code = OrderCode::new("DB-3001");
        h.manager.transition(&code, OrderStatus::Cancelled, None).await.unwrap();
        h.manager.transition(&code, OrderStatus::Cancelled, None).await.unwrap();

        assert_eq!(h.ledger.stock(product_id).await.unwrap(), Some(10));
    }

    #[tokio::test]
    async fn test_generated_code_uses_prefix() {
        let h = harness();
        let mut new_order = sample_new_order("unused");
        new_order.code = None;

        let report = h.manager.place_order(new_order).await.unwrap();
        assert!(report.order.code.as_str().starts_with("DB-"));
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let h = harness();
        place(&h, "DB-1001").await;
        place(&h, "DB-1002").await;

        let codes: Vec<String> = h
            .manager
            .list()
            .await
            .unwrap()
            .iter()
            .map(|o| o.code.to_string())
            .collect();
        assert_eq!(codes, vec!["DB-1002", "DB-1001"]);
    }
}
