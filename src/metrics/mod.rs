use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Provides metrics for:
// - Order and refund status transitions
// - Refund thread messages
// - Notification outcomes and send latency
// - Promo usage and stock ledger updates
//
// All metrics are registered with Prometheus and can be scraped via /metrics
// ============================================================================

/// Central metrics registry for the service
pub struct Metrics {
    registry: Registry,

    // Lifecycle Metrics
    pub order_transitions: IntCounterVec,
    pub refund_transitions: IntCounterVec,
    pub refund_messages: IntCounterVec,

    // Notification Metrics
    pub notifications: IntCounterVec,
    pub notification_duration: HistogramVec,

    // Ledger Metrics
    pub promo_usage_increments: IntCounter,
    pub stock_adjustments: IntCounterVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let order_transitions = IntCounterVec::new(
            Opts::new("order_transitions_total", "Order status changes by target status"),
            &["status"],
        )?;
        registry.register(Box::new(order_transitions.clone()))?;

        let refund_transitions = IntCounterVec::new(
            Opts::new("refund_transitions_total", "Refund status changes by target status"),
            &["status"],
        )?;
        registry.register(Box::new(refund_transitions.clone()))?;

        let refund_messages = IntCounterVec::new(
            Opts::new("refund_messages_total", "Messages appended to refund threads"),
            &["sender"],
        )?;
        registry.register(Box::new(refund_messages.clone()))?;

        let notifications = IntCounterVec::new(
            Opts::new("notifications_total", "Notification attempts by event and outcome"),
            &["event", "outcome"],
        )?;
        registry.register(Box::new(notifications.clone()))?;

        let notification_duration = HistogramVec::new(
            HistogramOpts::new(
                "notification_send_duration_seconds",
                "Time spent delivering one notification",
            )
            .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 15.0]),
            &["event"],
        )?;
        registry.register(Box::new(notification_duration.clone()))?;

        let promo_usage_increments = IntCounter::new(
            "promo_usage_increments_total",
            "Promo code uses counted by the ledger",
        )?;
        registry.register(Box::new(promo_usage_increments.clone()))?;

        let stock_adjustments = IntCounterVec::new(
            Opts::new("stock_adjustments_total", "Stock ledger updates by direction"),
            &["direction"],
        )?;
        registry.register(Box::new(stock_adjustments.clone()))?;

        Ok(Self {
            registry,
            order_transitions,
            refund_transitions,
            refund_messages,
            notifications,
            notification_duration,
            promo_usage_increments,
            stock_adjustments,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Text exposition format for the /metrics endpoint
    pub fn render(&self) -> anyhow::Result<Vec<u8>> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(buffer)
    }
}
