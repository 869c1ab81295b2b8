use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::aggregate::Aggregate;
use super::{DocumentStore, EventEnvelope, StoreError};

struct Entry<A: Aggregate> {
    snapshot: A,
    history: Vec<EventEnvelope<A::Event>>,
}

/// In-process store used for local runs and tests
pub struct MemoryStore<A: Aggregate> {
    entries: RwLock<HashMap<String, Entry<A>>>,
}

impl<A: Aggregate> MemoryStore<A> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<A: Aggregate> Default for MemoryStore<A> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<A: Aggregate + 'static> DocumentStore<A> for MemoryStore<A> {
    async fn insert(&self, aggregate: &A, events: &[A::Event]) -> Result<bool, StoreError> {
        let mut entries = self.entries.write().await;
        if entries.contains_key(aggregate.code()) {
            return Ok(false);
        }

        let base_version = aggregate.version() - events.len() as i64;
        entries.insert(
            aggregate.code().to_string(),
            Entry {
                snapshot: aggregate.clone(),
                history: EventEnvelope::wrap_all(aggregate.code(), base_version, events),
            },
        );

        tracing::debug!(kind = A::KIND, code = %aggregate.code(), "Inserted document");
        Ok(true)
    }

    async fn get(&self, code: &str) -> Result<Option<A>, StoreError> {
        Ok(self
            .entries
            .read()
            .await
            .get(code)
            .map(|entry| entry.snapshot.clone()))
    }

    async fn save(
        &self,
        aggregate: &A,
        expected_version: i64,
        events: &[A::Event],
    ) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .get_mut(aggregate.code())
            .ok_or_else(|| StoreError::Missing(aggregate.code().to_string()))?;

        let actual = entry.snapshot.version();
        if actual != expected_version {
            return Err(StoreError::Conflict {
                code: aggregate.code().to_string(),
                expected: expected_version,
                actual,
            });
        }

        entry.snapshot = aggregate.clone();
        entry
            .history
            .extend(EventEnvelope::wrap_all(aggregate.code(), expected_version, events));

        Ok(())
    }

    async fn list(&self) -> Result<Vec<A>, StoreError> {
        Ok(self
            .entries
            .read()
            .await
            .values()
            .map(|entry| entry.snapshot.clone())
            .collect())
    }

    async fn history(&self, code: &str) -> Result<Vec<EventEnvelope<A::Event>>, StoreError> {
        Ok(self
            .entries
            .read()
            .await
            .get(code)
            .map(|entry| entry.history.clone())
            .unwrap_or_default())
    }
}
