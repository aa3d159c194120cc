use async_trait::async_trait;
use uuid::Uuid;

use crate::event_sourcing::core::{DomainEvent, EventDecodeError, EventEntry};

// ============================================================================
// Generic Event Store - Repository for Events
// ============================================================================
//
// Responsibilities:
// 1. Append events to an aggregate's stream (append-only)
// 2. Load event history for aggregates, ordered by version
// 3. Ensure optimistic concurrency control: (aggregate_id, version) is unique
//
// Versions are 1-based. A stream with no events is at version 0. A batch is
// written all-or-nothing; a conflicting batch leaves no trace.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum EventStoreError {
    #[error("Expected version cannot be negative: {0}")]
    NegativeVersion(i64),

    #[error("Concurrency conflict: expected version {expected}, but current is {actual}")]
    VersionConflict { expected: i64, actual: i64 },

    #[error("Failed to serialize {event_type}: {source}")]
    Serialization {
        event_type: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Decode(#[from] EventDecodeError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl EventStoreError {
    /// Current stream version carried by a conflict
    pub fn actual_version(&self) -> Option<i64> {
        match self {
            EventStoreError::VersionConflict { actual, .. } => Some(*actual),
            _ => None,
        }
    }
}

/// Append-only event persistence keyed by aggregate id
///
/// Type Parameter:
/// - `E`: The domain event type stored in the streams
#[async_trait]
pub trait EventStore<E: DomainEvent>: Send + Sync {
    /// Append `events` after `expected_version`
    ///
    /// Returns the version of the last appended event, or `expected_version`
    /// unchanged when `events` is empty. Fails with `VersionConflict` carrying
    /// the re-queried current version when another writer got there first.
    async fn append(
        &self,
        events: &[E],
        aggregate_id: Uuid,
        expected_version: i64,
    ) -> Result<i64, EventStoreError>;

    /// All stored entries for the aggregate, version ascending
    async fn load_entries(&self, aggregate_id: Uuid) -> Result<Vec<EventEntry<E>>, EventStoreError>;

    /// Highest stored version, or 0 when the stream is empty
    async fn current_version(&self, aggregate_id: Uuid) -> Result<i64, EventStoreError>;

    /// All stored events for the aggregate, version ascending
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<E>, EventStoreError> {
        let entries = self.load_entries(aggregate_id).await?;
        Ok(entries.into_iter().map(|entry| entry.event_data).collect())
    }
}

/// A not-yet-persisted row: (event_type, payload, version)
pub(crate) type PreparedEvent = (&'static str, String, i64);

/// Validate the expected version and serialize a batch, assigning versions
/// `expected_version + 1 ..`
pub(crate) fn prepare_events<E: DomainEvent>(
    events: &[E],
    expected_version: i64,
) -> Result<Vec<PreparedEvent>, EventStoreError> {
    if expected_version < 0 {
        return Err(EventStoreError::NegativeVersion(expected_version));
    }

    let mut version = expected_version;
    let mut prepared = Vec::with_capacity(events.len());

    for event in events {
        version += 1;
        let payload = event
            .encode_payload()
            .map_err(|source| EventStoreError::Serialization {
                event_type: event.event_type(),
                source,
            })?;
        prepared.push((event.event_type(), payload, version));
    }

    Ok(prepared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::game::{GameEvent, GameFinishedWithDraw, GameStarted};

    fn started() -> GameEvent {
        GameEvent::Started(GameStarted {
            game_id: Uuid::new_v4(),
            first_player_id: Uuid::new_v4(),
            second_player_id: Uuid::new_v4(),
            board_size: 3,
            win_length: 3,
        })
    }

    #[test]
    fn test_prepare_assigns_sequential_versions() {
        let events = vec![started(), GameEvent::FinishedWithDraw(GameFinishedWithDraw {})];

        let prepared = prepare_events(&events, 4).unwrap();

        assert_eq!(prepared.len(), 2);
        assert_eq!(prepared[0].0, "GameStarted");
        assert_eq!(prepared[0].2, 5);
        assert_eq!(prepared[1].0, "GameFinishedWithDraw");
        assert_eq!(prepared[1].2, 6);
    }

    #[test]
    fn test_prepare_rejects_negative_version() {
        let result = prepare_events(&[started()], -1);
        assert!(matches!(result, Err(EventStoreError::NegativeVersion(-1))));
    }

    #[test]
    fn test_conflict_exposes_actual_version() {
        let error = EventStoreError::VersionConflict { expected: 2, actual: 5 };
        assert_eq!(error.actual_version(), Some(5));
        assert_eq!(EventStoreError::NegativeVersion(-1).actual_version(), None);
        assert_eq!(
            error.to_string(),
            "Concurrency conflict: expected version 2, but current is 5"
        );
    }
}
