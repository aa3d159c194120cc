use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::event_store::{prepare_events, EventStore, EventStoreError};
use crate::event_sourcing::core::{DomainEvent, EventEntry};

// ============================================================================
// In-Memory Event Store
// ============================================================================
//
// Keeps serialized rows per aggregate behind one async RwLock. The version
// check and the batch insert happen under the same write guard, which is the
// in-process equivalent of the (aggregate_id, version) unique index.
//
// ============================================================================

#[derive(Clone, Debug)]
struct StoredRow {
    id: i64,
    event: String,
    event_type: String,
    created_at: DateTime<Utc>,
    version: i64,
}

#[derive(Debug, Default)]
struct Inner {
    streams: HashMap<Uuid, Vec<StoredRow>>,
    next_id: i64,
}

impl Inner {
    fn stream_version(&self, aggregate_id: &Uuid) -> i64 {
        self.streams
            .get(aggregate_id)
            .and_then(|rows| rows.last())
            .map(|row| row.version)
            .unwrap_or(0)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    inner: RwLock<Inner>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl<E: DomainEvent> EventStore<E> for InMemoryEventStore {
    #[tracing::instrument(skip(self, events), fields(event_count = events.len()))]
    async fn append(
        &self,
        events: &[E],
        aggregate_id: Uuid,
        expected_version: i64,
    ) -> Result<i64, EventStoreError> {
        let prepared = prepare_events(events, expected_version)?;
        if prepared.is_empty() {
            return Ok(expected_version);
        }

        let mut inner = self.inner.write().await;

        let actual = inner.stream_version(&aggregate_id);
        if actual != expected_version {
            tracing::warn!(
                aggregate_id = %aggregate_id,
                expected_version,
                actual_version = actual,
                "Version conflict on append"
            );
            return Err(EventStoreError::VersionConflict {
                expected: expected_version,
                actual,
            });
        }

        let created_at = Utc::now();
        let mut rows = Vec::with_capacity(prepared.len());
        let mut new_version = expected_version;

        for (event_type, event, version) in prepared {
            inner.next_id += 1;
            new_version = version;
            rows.push(StoredRow {
                id: inner.next_id,
                event,
                event_type: event_type.to_string(),
                created_at,
                version,
            });
        }

        inner.streams.entry(aggregate_id).or_default().extend(rows);

        tracing::debug!(
            aggregate_id = %aggregate_id,
            new_version,
            event_count = events.len(),
            "Appended events to in-memory store"
        );

        Ok(new_version)
    }

    async fn load_entries(&self, aggregate_id: Uuid) -> Result<Vec<EventEntry<E>>, EventStoreError> {
        let inner = self.inner.read().await;

        let Some(rows) = inner.streams.get(&aggregate_id) else {
            return Ok(Vec::new());
        };

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            entries.push(EventEntry::decode(
                row.id,
                aggregate_id,
                &row.event,
                row.event_type.clone(),
                row.created_at,
                row.version,
            )?);
        }

        tracing::debug!("Loaded {} events for aggregate {}", entries.len(), aggregate_id);
        Ok(entries)
    }

    async fn current_version(&self, aggregate_id: Uuid) -> Result<i64, EventStoreError> {
        Ok(self.inner.read().await.stream_version(&aggregate_id))
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
