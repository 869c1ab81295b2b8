use anyhow::{Context, Result};
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use scylla::response::query_result::QueryResult;
use scylla::value::Row;

// ============================================================================
// ScyllaDB helpers shared by the document stores and the ledger
// ============================================================================

/// Upper bound on compare-and-swap rounds before reporting contention
pub const MAX_CAS_ATTEMPTS: u32 = 16;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS orders (
        code text PRIMARY KEY,
        version bigint,
        document text,
        updated_at timestamp
    )",
    "CREATE TABLE IF NOT EXISTS orders_history (
        code text,
        sequence_number bigint,
        event_id uuid,
        event_type text,
        event_data text,
        recorded_at timestamp,
        PRIMARY KEY (code, sequence_number)
    ) WITH CLUSTERING ORDER BY (sequence_number ASC)",
    "CREATE TABLE IF NOT EXISTS refunds (
        code text PRIMARY KEY,
        version bigint,
        document text,
        updated_at timestamp
    )",
    "CREATE TABLE IF NOT EXISTS refunds_history (
        code text,
        sequence_number bigint,
        event_id uuid,
        event_type text,
        event_data text,
        recorded_at timestamp,
        PRIMARY KEY (code, sequence_number)
    ) WITH CLUSTERING ORDER BY (sequence_number ASC)",
    "CREATE TABLE IF NOT EXISTS product_stock (
        product_id uuid PRIMARY KEY,
        stock bigint
    )",
    "CREATE TABLE IF NOT EXISTS promo_codes (
        code text PRIMARY KEY,
        definition text,
        usage_count bigint
    )",
];

/// Connect, create the keyspace if needed and switch to it
pub async fn connect(node: &str, keyspace: &str) -> Result<Session> {
    tracing::info!(node = %node, keyspace = %keyspace, "Connecting to ScyllaDB");

    let session: Session = SessionBuilder::new()
        .known_node(node)
        .build()
        .await
        .with_context(|| format!("failed to connect to ScyllaDB at {}", node))?;

    session
        .query_unpaged(
            format!(
                "CREATE KEYSPACE IF NOT EXISTS {} WITH REPLICATION = \
                 {{'class': 'SimpleStrategy', 'replication_factor': 1}}",
                keyspace
            ),
            &[],
        )
        .await?;

    session.use_keyspace(keyspace, false).await?;

    for statement in SCHEMA {
        session.query_unpaged(*statement, &[]).await?;
    }

    tracing::info!(keyspace = %keyspace, "✅ Schema ready");
    Ok(session)
}

/// Read the `[applied]` column of a lightweight-transaction result
pub fn was_applied(result: QueryResult) -> Result<bool> {
    let rows = result
        .into_rows_result()
        .context("conditional statement returned no rows")?;

    // Untyped row: a failed condition also returns the current column values
    let row: Row = rows.first_row()?;

    row.columns
        .first()
        .and_then(|column| column.as_ref())
        .and_then(|value| value.as_boolean())
        .context("missing [applied] column in conditional statement result")
}
