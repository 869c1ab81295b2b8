// ============================================================================
// Catalog & Promo Ledger
// ============================================================================
//
// Read/write access to product stock counts and promo-code usage counters.
// Every mutation is an atomic update at the storage layer (a serialized
// critical section in memory, a compare-and-swap in ScyllaDB), never a
// read-then-write from the caller.
//
// ============================================================================

mod memory;
mod scylladb;
mod seed;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::promo::PromoCode;

pub use memory::MemoryLedger;
pub use scylladb::ScyllaLedger;
pub use seed::{CatalogSeed, StockLevel};

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Unknown promo code: {0}")]
    UnknownPromo(String),

    #[error("Promo code {code} has reached its usage limit of {limit}")]
    PromoUsageLimitReached { code: String, limit: u32 },

    #[error("Insufficient stock for product {product_id}: {available} available, {requested} requested")]
    InsufficientStock {
        product_id: Uuid,
        available: u32,
        requested: u32,
    },

    #[error("Gave up updating {0} after repeated concurrent modifications")]
    Contention(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Result of a stock adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockChange {
    /// Stock is not tracked for this product
    Untracked,
    /// New stock level after the adjustment
    Updated(u32),
}

#[async_trait]
pub trait CatalogLedger: Send + Sync {
    /// Current stock, `None` when the product is untracked
    async fn stock(&self, product_id: Uuid) -> Result<Option<u32>, LedgerError>;

    /// Start (or stop, with `None`) tracking stock for a product
    async fn set_stock(&self, product_id: Uuid, stock: Option<u32>) -> Result<(), LedgerError>;

    /// Subtract `quantity`; refuses to go below zero
    async fn decrement_stock(&self, product_id: Uuid, quantity: u32)
        -> Result<StockChange, LedgerError>;

    /// Return `quantity` to stock (cancellations)
    async fn increment_stock(&self, product_id: Uuid, quantity: u32)
        -> Result<StockChange, LedgerError>;

    /// Case-insensitive lookup
    async fn promo(&self, code: &str) -> Result<Option<PromoCode>, LedgerError>;

    /// Create or replace a promo definition (usage count included)
    async fn upsert_promo(&self, promo: PromoCode) -> Result<(), LedgerError>;

    /// Count one more use; returns the new usage count
    async fn increment_promo_usage(&self, code: &str) -> Result<u32, LedgerError>;

    /// Give back one use taken by a placement that did not go through;
    /// never goes below zero. Returns the new usage count
    async fn release_promo_usage(&self, code: &str) -> Result<u32, LedgerError>;
}
