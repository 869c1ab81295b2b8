use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scylla::client::session::Session;
use std::marker::PhantomData;
use std::sync::Arc;
use uuid::Uuid;

use crate::cql::was_applied;
use crate::domain::aggregate::Aggregate;
use super::{DocumentStore, EventEnvelope, StoreError};

/// ScyllaDB-backed store.
///
/// Table layout per aggregate kind (`A::KIND`):
/// - `<kind>`: one row per code holding the JSON snapshot and its version
/// - `<kind>_history`: append-only events clustered by sequence number
///
/// Snapshot writes are lightweight transactions (`IF NOT EXISTS` on insert,
/// `IF version = ?` on save). History rows are written after the snapshot
/// swap succeeds.
pub struct ScyllaStore<A: Aggregate> {
    session: Arc<Session>,
    _phantom: PhantomData<A>,
}

impl<A: Aggregate> ScyllaStore<A> {
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            _phantom: PhantomData,
        }
    }

    async fn append_history(
        &self,
        code: &str,
        envelopes: Vec<EventEnvelope<A::Event>>,
    ) -> anyhow::Result<()> {
        let statement = format!(
            "INSERT INTO {}_history (code, sequence_number, event_id, event_type, event_data, recorded_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            A::KIND
        );

        for envelope in envelopes {
            let event_json = serde_json::to_string(&envelope.event_data)?;
            self.session
                .query_unpaged(
                    statement.clone(),
                    (
                        code,
                        envelope.sequence_number,
                        envelope.event_id,
                        envelope.event_type,
                        event_json,
                        envelope.timestamp,
                    ),
                )
                .await
                .with_context(|| format!("failed to append history for {}", code))?;
        }

        Ok(())
    }

    async fn current_version(&self, code: &str) -> anyhow::Result<i64> {
        let result = self
            .session
            .query_unpaged(format!("SELECT version FROM {} WHERE code = ?", A::KIND), (code,))
            .await?;

        let rows_result = match result.into_rows_result() {
            Ok(rows) => rows,
            Err(_) => return Ok(0),
        };

        match rows_result.maybe_first_row::<(Option<i64>,)>() {
            Ok(Some((version,))) => Ok(version.unwrap_or(0)),
            _ => Ok(0),
        }
    }
}

#[async_trait]
impl<A: Aggregate + 'static> DocumentStore<A> for ScyllaStore<A> {
    async fn insert(&self, aggregate: &A, events: &[A::Event]) -> Result<bool, StoreError> {
        let document = serde_json::to_string(aggregate).context("failed to encode document")?;

        let result = self
            .session
            .query_unpaged(
                format!(
                    "INSERT INTO {} (code, version, document, updated_at) VALUES (?, ?, ?, ?) IF NOT EXISTS",
                    A::KIND
                ),
                (aggregate.code(), aggregate.version(), document, Utc::now()),
            )
            .await
            .context("failed to insert document")?;

        if !was_applied(result)? {
            return Ok(false);
        }

        let base_version = aggregate.version() - events.len() as i64;
        self.append_history(
            aggregate.code(),
            EventEnvelope::wrap_all(aggregate.code(), base_version, events),
        )
        .await?;

        tracing::info!(
            kind = A::KIND,
            code = %aggregate.code(),
            version = aggregate.version(),
            "✅ Inserted document"
        );

        Ok(true)
    }

    async fn get(&self, code: &str) -> Result<Option<A>, StoreError> {
        let result = self
            .session
            .query_unpaged(format!("SELECT document FROM {} WHERE code = ?", A::KIND), (code,))
            .await
            .context("failed to load document")?;

        let rows = match result.into_rows_result() {
            Ok(rows) => rows,
            Err(_) => return Ok(None),
        };

        let Some((document,)) = rows
            .maybe_first_row::<(String,)>()
            .context("failed to decode document row")?
        else {
            return Ok(None);
        };

        let aggregate = serde_json::from_str(&document)
            .with_context(|| format!("corrupt {} document {}", A::KIND, code))?;
        Ok(Some(aggregate))
    }

    async fn save(
        &self,
        aggregate: &A,
        expected_version: i64,
        events: &[A::Event],
    ) -> Result<(), StoreError> {
        let document = serde_json::to_string(aggregate).context("failed to encode document")?;

        let result = self
            .session
            .query_unpaged(
                format!(
                    "UPDATE {} SET version = ?, document = ?, updated_at = ? WHERE code = ? IF version = ?",
                    A::KIND
                ),
                (
                    aggregate.version(),
                    document,
                    Utc::now(),
                    aggregate.code(),
                    expected_version,
                ),
            )
            .await
            .context("failed to update document")?;

        if !was_applied(result)? {
            let actual = self.current_version(aggregate.code()).await?;
            if actual == 0 {
                return Err(StoreError::Missing(aggregate.code().to_string()));
            }
            return Err(StoreError::Conflict {
                code: aggregate.code().to_string(),
                expected: expected_version,
                actual,
            });
        }

        self.append_history(
            aggregate.code(),
            EventEnvelope::wrap_all(aggregate.code(), expected_version, events),
        )
        .await?;

        tracing::info!(
            kind = A::KIND,
            code = %aggregate.code(),
            new_version = aggregate.version(),
            event_count = events.len(),
            "✅ Saved document"
        );

        Ok(())
    }

    async fn list(&self) -> Result<Vec<A>, StoreError> {
        let result = self
            .session
            .query_unpaged(format!("SELECT document FROM {}", A::KIND), &[])
            .await
            .context("failed to list documents")?;

        let mut documents = Vec::new();

        let rows_result = match result.into_rows_result() {
            Ok(rows) => rows,
            Err(_) => return Ok(documents),
        };

        for row in rows_result.rows::<(String,)>().context("failed to read rows")? {
            let (document,) = row.context("failed to decode document row")?;
            documents.push(serde_json::from_str(&document).context("corrupt document")?);
        }

        tracing::debug!(kind = A::KIND, count = documents.len(), "Listed documents");
        Ok(documents)
    }

    async fn history(&self, code: &str) -> Result<Vec<EventEnvelope<A::Event>>, StoreError> {
        let result = self
            .session
            .query_unpaged(
                format!(
                    "SELECT sequence_number, event_id, event_type, event_data, recorded_at
                     FROM {}_history WHERE code = ? ORDER BY sequence_number ASC",
                    A::KIND
                ),
                (code,),
            )
            .await
            .context("failed to load history")?;

        let mut events = Vec::new();

        let rows_result = match result.into_rows_result() {
            Ok(rows) => rows,
            Err(_) => return Ok(events),
        };

        for row in rows_result
            .rows::<(i64, Uuid, String, String, DateTime<Utc>)>()
            .context("failed to read history rows")?
        {
            let (sequence_number, event_id, event_type, event_json, timestamp) =
                row.context("failed to decode history row")?;

            events.push(EventEnvelope {
                event_id,
                aggregate_code: code.to_string(),
                sequence_number,
                event_type,
                event_data: serde_json::from_str(&event_json).context("corrupt history event")?,
                timestamp,
            });
        }

        Ok(events)
    }
}
