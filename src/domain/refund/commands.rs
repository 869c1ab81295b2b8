use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::order::OrderCode;
use super::value_objects::{MessageSender, RefundCode, RefundStatus};

// ============================================================================
// Refund Commands
// ============================================================================

#[derive(Debug, Clone)]
pub enum RefundCommand {
    SetStatus { status: RefundStatus },
    AppendMessage { from: MessageSender, body: String },
}

/// Refund request submitted by a customer against one of their orders
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRefund {
    #[serde(default)]
    pub code: Option<RefundCode>,
    pub order_code: OrderCode,
    pub amount: Decimal,
    pub reason: String,
}
