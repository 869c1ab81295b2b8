use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::order::{Order, OrderItem, OrderStatus, ShippingInfo};
use crate::domain::refund::{RefundRequest, RefundStatus};

// ============================================================================
// Notification Events
// ============================================================================
//
// One variant per message the store can send. Template selection is an
// exhaustive match over this type, so a new status cannot silently fall back
// to a default template.
//
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum NotificationEvent {
    OrderStatus(OrderStatusNotice),
    RefundStatus(RefundStatusNotice),
    RefundMessage(RefundMessageNotice),
    OrderConfirmation(OrderSummary),
    Welcome(WelcomeNotice),
    AdminNewOrder(OrderSummary),
    AdminNewRefund(RefundSummary),
}

/// Per-type switches in the settings store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    OrderConfirmation,
    Welcome,
    Shipping,
}

impl NotificationEvent {
    /// Key used in logs and metric labels
    pub fn kind(&self) -> &'static str {
        match self {
            NotificationEvent::OrderStatus(notice) => match notice {
                OrderStatusNotice::Pending(_) => "order-pending",
                OrderStatusNotice::Processing(_) => "order-processing",
                OrderStatusNotice::Shipped { .. } => "order-shipped",
                OrderStatusNotice::Delivered(_) => "order-delivered",
                OrderStatusNotice::Cancelled(_) => "order-cancelled",
            },
            NotificationEvent::RefundStatus(notice) => match notice.status {
                RefundStatus::Pending => "refund-pending",
                RefundStatus::Reviewing => "refund-reviewing",
                RefundStatus::Approved => "refund-approved",
                RefundStatus::Denied => "refund-denied",
                RefundStatus::Processed => "refund-processed",
            },
            NotificationEvent::RefundMessage(_) => "refund-message",
            NotificationEvent::OrderConfirmation(_) => "order-confirmation",
            NotificationEvent::Welcome(_) => "welcome",
            NotificationEvent::AdminNewOrder(_) => "admin-new-order",
            NotificationEvent::AdminNewRefund(_) => "admin-new-refund",
        }
    }

    /// Settings switch gating this event, if any
    pub fn toggle(&self) -> Option<Toggle> {
        match self {
            NotificationEvent::OrderConfirmation(_) => Some(Toggle::OrderConfirmation),
            NotificationEvent::Welcome(_) => Some(Toggle::Welcome),
            NotificationEvent::OrderStatus(OrderStatusNotice::Shipped { .. }) => {
                Some(Toggle::Shipping)
            }
            _ => None,
        }
    }
}

/// Order snapshot carried by order notifications
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub code: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub items: Vec<OrderItem>,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub promo_code: Option<String>,
    pub promo_discount: Decimal,
    pub total: Decimal,
    pub shipping_address: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Order> for OrderSummary {
    fn from(order: &Order) -> Self {
        Self {
            code: order.code.to_string(),
            customer_name: order.customer.name.clone(),
            customer_email: order.customer.email.clone(),
            customer_phone: order.customer.phone.clone(),
            items: order.items.clone(),
            subtotal: order.subtotal,
            shipping_cost: order.shipping_cost,
            promo_code: order.promo_code.clone(),
            promo_discount: order.promo_discount,
            total: order.total,
            shipping_address: order.shipping_address.one_line(),
            created_at: order.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum OrderStatusNotice {
    Pending(OrderSummary),
    Processing(OrderSummary),
    Shipped {
        order: OrderSummary,
        shipping: Option<ShippingInfo>,
    },
    Delivered(OrderSummary),
    Cancelled(OrderSummary),
}

impl OrderStatusNotice {
    /// Notice matching the order's current status
    pub fn for_order(order: &Order) -> Self {
        let summary = OrderSummary::from(order);
        match order.status {
            OrderStatus::Pending => OrderStatusNotice::Pending(summary),
            OrderStatus::Processing => OrderStatusNotice::Processing(summary),
            OrderStatus::Shipped => OrderStatusNotice::Shipped {
                order: summary,
                shipping: order.shipping.clone(),
            },
            OrderStatus::Delivered => OrderStatusNotice::Delivered(summary),
            OrderStatus::Cancelled => OrderStatusNotice::Cancelled(summary),
        }
    }

    pub fn order(&self) -> &OrderSummary {
        match self {
            OrderStatusNotice::Pending(order)
            | OrderStatusNotice::Processing(order)
            | OrderStatusNotice::Delivered(order)
            | OrderStatusNotice::Cancelled(order) => order,
            OrderStatusNotice::Shipped { order, .. } => order,
        }
    }
}

/// Refund snapshot carried by refund notifications
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundSummary {
    pub code: String,
    pub order_code: String,
    pub customer_name: String,
    pub customer_email: String,
    pub amount: Decimal,
    pub reason: String,
    pub status: RefundStatus,
}

impl From<&RefundRequest> for RefundSummary {
    fn from(refund: &RefundRequest) -> Self {
        Self {
            code: refund.code.to_string(),
            order_code: refund.order_code.to_string(),
            customer_name: refund.customer.name.clone(),
            customer_email: refund.customer.email.clone(),
            amount: refund.amount,
            reason: refund.reason.clone(),
            status: refund.status,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundStatusNotice {
    pub refund: RefundSummary,
    pub status: RefundStatus,
}

impl RefundStatusNotice {
    pub fn for_refund(refund: &RefundRequest) -> Self {
        Self {
            refund: RefundSummary::from(refund),
            status: refund.status,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundMessageNotice {
    pub refund: RefundSummary,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WelcomeNotice {
    pub customer_name: String,
}
