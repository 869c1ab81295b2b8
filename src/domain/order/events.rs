use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::aggregate::DomainEvent;
use super::value_objects::{OrderStatus, ShippingInfo};

// ============================================================================
// Order Events - audit history of an order
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    Placed(OrderPlaced),
    ShippingRecorded(ShippingRecorded),
    StatusChanged(OrderStatusChanged),
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::Placed(_) => "OrderPlaced",
            OrderEvent::ShippingRecorded(_) => "OrderShippingRecorded",
            OrderEvent::StatusChanged(_) => "OrderStatusChanged",
        }
    }
}

/// Order Placed - checkout handed the order to the core
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct OrderPlaced {
    pub total: Decimal,
    pub item_count: usize,
    pub promo_code: Option<String>,
}

/// Shipping metadata captured while marking the order shipped
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ShippingRecorded {
    pub shipping: ShippingInfo,
}

/// Status set by the operator (may equal the previous status on resend)
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct OrderStatusChanged {
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub changed_at: DateTime<Utc>,
}
