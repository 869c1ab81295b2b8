use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::aggregate::DomainEvent;
use super::value_objects::{RefundMessage, RefundStatus};

// ============================================================================
// Refund Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum RefundEvent {
    Opened(RefundOpened),
    StatusChanged(RefundStatusChanged),
    MessageAppended(RefundMessageAppended),
}

impl DomainEvent for RefundEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RefundEvent::Opened(_) => "RefundOpened",
            RefundEvent::StatusChanged(_) => "RefundStatusChanged",
            RefundEvent::MessageAppended(_) => "RefundMessageAppended",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RefundOpened {
    pub order_code: String,
    pub amount: Decimal,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RefundStatusChanged {
    pub from: RefundStatus,
    pub to: RefundStatus,
    pub changed_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RefundMessageAppended {
    pub message: RefundMessage,
}
