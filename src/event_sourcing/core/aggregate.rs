use uuid::Uuid;

use super::event::DomainEvent;

// ============================================================================
// Aggregate Root Pattern - Event Sourcing Core
// ============================================================================
//
// Key Principles:
// 1. State is derived from events (not stored directly)
// 2. Intents are validated before emitting events
// 3. Every event, fresh or historical, goes through the same apply path
// 4. Version == number of events applied to the instance
// 5. Freshly produced events wait in an uncommitted list until the store
//    confirms the append
//
// ============================================================================

/// Generic Aggregate trait - all event-sourced aggregates implement this
///
/// Type Parameters:
/// - `Event`: The domain event type for this aggregate
/// - `Error`: The error type for business rule violations
/// - `Context`: Per-instance collaborators handed over at construction
///   (never shared between instances)
pub trait Aggregate: Sized + Send {
    type Event: DomainEvent;
    type Error;
    type Context;

    /// Create new aggregate from first event
    fn apply_first_event(event: &Self::Event, context: Self::Context) -> Result<Self, Self::Error>;

    /// Apply subsequent events to update state
    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error>;

    /// Get aggregate ID
    fn aggregate_id(&self) -> Uuid;

    /// Get current version (number of events applied)
    fn version(&self) -> i64;

    /// Events produced since construction or the last confirmed append
    fn uncommitted_events(&self) -> &[Self::Event];

    /// Drop uncommitted events once the store has accepted them
    fn mark_events_committed(&mut self);

    /// Load aggregate from event history (reconstruct from events)
    ///
    /// Returns `None` for an empty history. Replay never produces
    /// uncommitted events.
    fn load_from_events<I>(events: I, context: Self::Context) -> Result<Option<Self>, Self::Error>
    where
        I: IntoIterator<Item = Self::Event>,
    {
        let mut events = events.into_iter();

        let Some(first) = events.next() else {
            return Ok(None);
        };

        let mut aggregate = Self::apply_first_event(&first, context)?;

        for event in events {
            aggregate.apply_event(&event)?;
        }

        Ok(Some(aggregate))
    }
}
