use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::aggregate::Aggregate;
use crate::domain::order::{CustomerSnapshot, Order, OrderCode};
use super::commands::{NewRefund, RefundCommand};
use super::errors::RefundError;
use super::events::*;
use super::value_objects::*;

// ============================================================================
// Refund Request Aggregate
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundRequest {
    pub id: Uuid,
    pub code: RefundCode,
    pub order_code: OrderCode,
    pub version: i64,

    pub amount: Decimal,
    pub reason: String,
    pub status: RefundStatus,
    /// Insertion-ordered thread; entries are never edited or removed
    pub messages: Vec<RefundMessage>,
    pub customer: CustomerSnapshot,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RefundRequest {
    /// Open a pending refund against `order`.
    ///
    /// The amount must be positive and cannot exceed what the customer paid.
    pub fn open(
        code: RefundCode,
        request: NewRefund,
        order: &Order,
        now: DateTime<Utc>,
    ) -> Result<(Self, RefundEvent), RefundError> {
        if request.amount <= Decimal::ZERO {
            return Err(RefundError::NonPositiveAmount);
        }
        if request.amount > order.total {
            return Err(RefundError::AmountExceedsOrderTotal {
                amount: request.amount,
                order_total: order.total,
            });
        }

        let reason = request.reason.trim().to_string();
        if reason.is_empty() {
            return Err(RefundError::EmptyReason);
        }

        let refund = Self {
            id: Uuid::now_v7(),
            code,
            order_code: order.code.clone(),
            version: 1,
            amount: request.amount,
            reason,
            status: RefundStatus::Pending,
            messages: Vec::new(),
            customer: order.customer.clone(),
            created_at: now,
            updated_at: now,
        };

        let event = RefundEvent::Opened(RefundOpened {
            order_code: refund.order_code.to_string(),
            amount: refund.amount,
        });

        Ok((refund, event))
    }
}

impl Aggregate for RefundRequest {
    type Event = RefundEvent;
    type Command = RefundCommand;
    type Error = RefundError;

    const KIND: &'static str = "refunds";

    fn code(&self) -> &str {
        self.code.as_str()
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            RefundCommand::SetStatus { status } => {
                if !self.status.can_transition_to(*status) {
                    return Err(RefundError::InvalidStatusTransition {
                        from: self.status,
                        to: *status,
                    });
                }

                Ok(vec![RefundEvent::StatusChanged(RefundStatusChanged {
                    from: self.status,
                    to: *status,
                    changed_at: Utc::now(),
                })])
            }
            RefundCommand::AppendMessage { from, body } => {
                let body = body.trim();
                if body.is_empty() {
                    return Err(RefundError::EmptyMessage);
                }

                Ok(vec![RefundEvent::MessageAppended(RefundMessageAppended {
                    message: RefundMessage {
                        from: *from,
                        message: body.to_string(),
                        date: Utc::now(),
                    },
                })])
            }
        }
    }

    fn apply_event(&mut self, event: &Self::Event) {
        match event {
            RefundEvent::Opened(_) => {}
            RefundEvent::StatusChanged(e) => {
                self.status = e.to;
                self.updated_at = e.changed_at;
            }
            RefundEvent::MessageAppended(e) => {
                self.messages.push(e.message.clone());
                self.updated_at = e.message.date;
            }
        }

        self.version += 1;
    }
}
