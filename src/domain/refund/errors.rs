use rust_decimal::Decimal;

use super::value_objects::RefundStatus;

// ============================================================================
// Refund Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RefundError {
    #[error("Unknown refund status: {0}")]
    UnknownStatus(String),

    #[error("Unknown message sender: {0}")]
    UnknownSender(String),

    #[error("Cannot move refund from {from} to {to}")]
    InvalidStatusTransition { from: RefundStatus, to: RefundStatus },

    #[error("Message cannot be empty")]
    EmptyMessage,

    #[error("Refund reason cannot be empty")]
    EmptyReason,

    #[error("Refund amount must be greater than zero")]
    NonPositiveAmount,

    #[error("Refund amount {amount} exceeds order total {order_total}")]
    AmountExceedsOrderTotal { amount: Decimal, order_total: Decimal },
}
