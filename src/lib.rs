// ============================================================================
// Storefront Orders - order and refund lifecycle orchestration
// ============================================================================
//
// Layers:
// - domain         - aggregates, state machines and lifecycle managers
// - store / ledger - persistence (memory or ScyllaDB) and atomic counters
// - notifications  - transactional email
// - reporting, api - read models and the HTTP surface
//
// ============================================================================

pub mod api;
pub mod config;
pub mod cql;
pub mod domain;
pub mod errors;
pub mod ledger;
pub mod metrics;
pub mod notifications;
pub mod reporting;
pub mod store;

pub use errors::ServiceError;
