// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Each aggregate has its own subdirectory with:
// - Value objects
// - Events
// - Commands
// - Errors
// - Aggregate implementation
// - Lifecycle manager (load, execute, persist, notify)
//
// Persistence and delivery are reached only through the store, ledger and
// notification traits.
//
// ============================================================================

pub mod aggregate;
pub mod order;
pub mod refund;
pub mod promo;
