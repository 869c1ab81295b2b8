use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

// ============================================================================
// Aggregate Root Pattern
// ============================================================================
//
// Key Principles:
// 1. Commands are validated before any event is emitted
// 2. Events represent facts that have already happened
// 3. Aggregates enforce business invariants
// 4. All state changes flow through events, and every event is kept in the
//    aggregate's audit history (orders and refunds are never deleted)
//
// Unlike a fully event-sourced aggregate, the current snapshot is persisted
// alongside the history so the console can read it without a replay.
//
// ============================================================================

/// Domain event recorded in an aggregate's audit history
pub trait DomainEvent: Serialize + DeserializeOwned + Clone + Debug + Send + Sync {
    /// Stable name used in the history table and in logs
    fn event_type(&self) -> &'static str;
}

/// Generic Aggregate trait - orders and refund requests implement this
///
/// Type Parameters:
/// - `Event`: The domain event type for this aggregate
/// - `Command`: The command type for this aggregate
/// - `Error`: The error type for business rule violations
pub trait Aggregate: Serialize + DeserializeOwned + Clone + Send + Sync {
    type Event: DomainEvent;
    type Command;
    type Error;

    /// Storage name for this kind of aggregate (e.g. "orders")
    const KIND: &'static str;

    /// Human-readable code identifying the aggregate
    fn code(&self) -> &str;

    /// Current version (number of events applied so far)
    fn version(&self) -> i64;

    /// Handle command and emit events (business logic)
    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;

    /// Apply an event to update state. Must bump the version by one.
    fn apply_event(&mut self, event: &Self::Event);

    /// Validate a command and fold the resulting events into the aggregate
    fn execute(&mut self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        let events = self.handle_command(command)?;
        for event in &events {
            self.apply_event(event);
        }
        Ok(events)
    }
}
