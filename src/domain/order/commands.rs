use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::value_objects::{
    CustomerSnapshot, OrderCode, OrderItem, OrderStatus, ShippingAddress, ShippingData,
};

// ============================================================================
// Order Commands - Represent operator intent
// ============================================================================

#[derive(Debug, Clone)]
pub enum OrderCommand {
    ChangeStatus {
        status: OrderStatus,
        shipping: Option<ShippingData>,
    },
}

/// Fully-formed order handed over by the checkout flow.
///
/// Pricing has already been computed upstream; placement only checks that
/// the figures are consistent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    #[serde(default)]
    pub code: Option<OrderCode>,
    pub items: Vec<OrderItem>,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    #[serde(default)]
    pub promo_code: Option<String>,
    #[serde(default)]
    pub promo_discount: Decimal,
    pub total: Decimal,
    pub customer: CustomerSnapshot,
    pub shipping_address: ShippingAddress,
}
