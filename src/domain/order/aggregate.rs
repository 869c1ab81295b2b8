use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::aggregate::Aggregate;
use super::commands::{NewOrder, OrderCommand};
use super::errors::OrderError;
use super::events::*;
use super::value_objects::*;

// ============================================================================
// Order Aggregate - Domain Logic
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    // Identity
    pub id: Uuid,
    pub code: OrderCode,
    pub version: i64,

    // Snapshot taken at checkout; never recomputed
    pub items: Vec<OrderItem>,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub promo_code: Option<String>,
    pub promo_discount: Decimal,
    pub total: Decimal,
    pub customer: CustomerSnapshot,
    pub shipping_address: ShippingAddress,

    // Lifecycle
    pub status: OrderStatus,
    pub shipping: Option<ShippingInfo>,

    // Audit Trail
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Build a pending order from a checkout submission.
    ///
    /// Returns the order at version 1 together with its `Placed` event.
    pub fn place(
        code: OrderCode,
        new_order: NewOrder,
        now: DateTime<Utc>,
    ) -> Result<(Self, OrderEvent), OrderError> {
        Self::validate(&new_order)?;

        let promo_code = new_order
            .promo_code
            .map(|code| code.trim().to_uppercase())
            .filter(|code| !code.is_empty());

        let order = Self {
            id: Uuid::now_v7(),
            code,
            version: 1,
            items: new_order.items,
            subtotal: new_order.subtotal,
            shipping_cost: new_order.shipping_cost,
            promo_code,
            promo_discount: new_order.promo_discount,
            total: new_order.total,
            customer: new_order.customer,
            shipping_address: new_order.shipping_address,
            status: OrderStatus::Pending,
            shipping: None,
            created_at: now,
            updated_at: now,
        };

        let event = OrderEvent::Placed(OrderPlaced {
            total: order.total,
            item_count: order.items.len(),
            promo_code: order.promo_code.clone(),
        });

        Ok((order, event))
    }

    /// Validate the checkout figures before persisting
    fn validate(new_order: &NewOrder) -> Result<(), OrderError> {
        if new_order.items.is_empty() {
            return Err(OrderError::EmptyItems);
        }

        for item in &new_order.items {
            if item.quantity == 0 {
                return Err(OrderError::InvalidQuantity(item.name.clone()));
            }
            if item.unit_price.is_sign_negative() {
                return Err(OrderError::NegativeAmount);
            }
        }

        if new_order.shipping_cost.is_sign_negative() || new_order.promo_discount.is_sign_negative()
        {
            return Err(OrderError::NegativeAmount);
        }

        if new_order.customer.email.trim().is_empty() {
            return Err(OrderError::MissingCustomerEmail);
        }

        let expected_subtotal: Decimal = new_order.items.iter().map(OrderItem::line_total).sum();
        if expected_subtotal != new_order.subtotal {
            return Err(OrderError::SubtotalMismatch {
                expected: expected_subtotal,
                actual: new_order.subtotal,
            });
        }

        let expected_total =
            new_order.subtotal - new_order.promo_discount + new_order.shipping_cost;
        if expected_total != new_order.total {
            return Err(OrderError::TotalMismatch {
                expected: expected_total,
                actual: new_order.total,
            });
        }

        Ok(())
    }

    /// Whether moving from `previous` to the current status returns stock
    pub fn restock_due(&self, previous: OrderStatus) -> bool {
        self.status == OrderStatus::Cancelled && previous != OrderStatus::Cancelled
    }
}

// ============================================================================
// Aggregate Trait Implementation
// ============================================================================

impl Aggregate for Order {
    type Event = OrderEvent;
    type Command = OrderCommand;
    type Error = OrderError;

    const KIND: &'static str = "orders";

    fn code(&self) -> &str {
        self.code.as_str()
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            OrderCommand::ChangeStatus { status, shipping } => {
                if !self.status.can_transition_to(*status) {
                    return Err(OrderError::InvalidStatusTransition {
                        from: self.status,
                        to: *status,
                    });
                }

                let mut events = Vec::with_capacity(2);

                match (status, shipping) {
                    (OrderStatus::Shipped, Some(data)) => {
                        events.push(OrderEvent::ShippingRecorded(ShippingRecorded {
                            shipping: ShippingInfo::resolve(data)?,
                        }));
                    }
                    (OrderStatus::Shipped, None) => return Err(OrderError::MissingTrackingNumber),
                    (_, Some(_)) => return Err(OrderError::UnexpectedShippingData),
                    (_, None) => {}
                }

                events.push(OrderEvent::StatusChanged(OrderStatusChanged {
                    from: self.status,
                    to: *status,
                    changed_at: Utc::now(),
                }));

                Ok(events)
            }
        }
    }

    fn apply_event(&mut self, event: &Self::Event) {
        match event {
            OrderEvent::Placed(_) => {
                // Placement builds the snapshot directly
            }
            OrderEvent::ShippingRecorded(e) => {
                self.shipping = Some(e.shipping.clone());
            }
            OrderEvent::StatusChanged(e) => {
                self.status = e.to;
                self.updated_at = e.changed_at;
            }
        }

        self.version += 1;
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
