// ============================================================================
// Order Domain - order entity and its status state machine
// ============================================================================
//
// - Value objects (OrderCode, OrderItem, OrderStatus, Carrier, ShippingInfo)
// - Commands (ChangeStatus) and the checkout hand-off (NewOrder)
// - Events (Placed, ShippingRecorded, StatusChanged)
// - Errors (OrderError)
// - Aggregate (Order)
// - Lifecycle manager (persistence, ledger effects, notifications)
//
// ============================================================================

pub mod value_objects;
pub mod events;
pub mod commands;
pub mod errors;
pub mod aggregate;
pub mod lifecycle;

// Re-export for convenience
pub use value_objects::*;
pub use events::*;
pub use commands::*;
pub use errors::*;
pub use aggregate::*;
pub use lifecycle::*;
