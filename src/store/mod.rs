// ============================================================================
// Document Store - snapshot + append-only history per aggregate
// ============================================================================
//
// This is a GENERIC store that works with ANY aggregate type.
//
// Responsibilities:
// 1. Insert new aggregates (insert-if-absent on the human-readable code)
// 2. Replace the current snapshot under optimistic concurrency control
// 3. Append every emitted event to the aggregate's history (never deleted)
// 4. Load snapshots and history for the console and reporting
//
// ============================================================================

mod memory;
mod scylladb;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::aggregate::{Aggregate, DomainEvent};

pub use memory::MemoryStore;
pub use scylladb::ScyllaStore;

/// History entry wrapping a domain event with its metadata
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope<E> {
    pub event_id: Uuid,
    pub aggregate_code: String,
    pub sequence_number: i64,
    pub event_type: String,
    pub event_data: E,
    pub timestamp: DateTime<Utc>,
}

impl<E: DomainEvent> EventEnvelope<E> {
    pub fn new(aggregate_code: &str, sequence_number: i64, event_data: E) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            aggregate_code: aggregate_code.to_string(),
            sequence_number,
            event_type: event_data.event_type().to_string(),
            event_data,
            timestamp: Utc::now(),
        }
    }

    /// Wrap events emitted by one command, numbering them after `base_version`
    pub fn wrap_all(aggregate_code: &str, base_version: i64, events: &[E]) -> Vec<Self> {
        events
            .iter()
            .enumerate()
            .map(|(offset, event)| {
                Self::new(aggregate_code, base_version + offset as i64 + 1, event.clone())
            })
            .collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Concurrency conflict on {code}: expected version {expected}, but current is {actual}")]
    Conflict {
        code: String,
        expected: i64,
        actual: i64,
    },

    #[error("{0} does not exist")]
    Missing(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

#[async_trait]
pub trait DocumentStore<A: Aggregate>: Send + Sync {
    /// Insert a new aggregate; `false` if the code is already taken
    async fn insert(&self, aggregate: &A, events: &[A::Event]) -> Result<bool, StoreError>;

    async fn get(&self, code: &str) -> Result<Option<A>, StoreError>;

    /// Replace the snapshot if the stored version still equals
    /// `expected_version`, then append `events` to the history
    async fn save(
        &self,
        aggregate: &A,
        expected_version: i64,
        events: &[A::Event],
    ) -> Result<(), StoreError>;

    async fn list(&self) -> Result<Vec<A>, StoreError>;

    async fn history(&self, code: &str) -> Result<Vec<EventEnvelope<A::Event>>, StoreError>;
}
