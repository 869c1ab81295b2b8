use rust_decimal::Decimal;

use super::value_objects::OrderStatus;

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Unknown order status: {0}")]
    UnknownStatus(String),

    #[error("Unknown carrier: {0}")]
    UnknownCarrier(String),

    #[error("Cannot move order from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    #[error("A tracking number is required to mark an order as shipped")]
    MissingTrackingNumber,

    #[error("Shipping details are only accepted when marking an order as shipped")]
    UnexpectedShippingData,

    #[error("Order items cannot be empty")]
    EmptyItems,

    #[error("Invalid quantity for {0}: quantity must be at least 1")]
    InvalidQuantity(String),

    #[error("Amounts cannot be negative")]
    NegativeAmount,

    #[error("Subtotal {actual} does not match line items ({expected})")]
    SubtotalMismatch { expected: Decimal, actual: Decimal },

    #[error("Total {actual} does not match subtotal - discount + shipping ({expected})")]
    TotalMismatch { expected: Decimal, actual: Decimal },

    #[error("Customer email cannot be empty")]
    MissingCustomerEmail,
}
