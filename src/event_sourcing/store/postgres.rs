use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::event_store::{prepare_events, EventStore, EventStoreError};
use crate::event_sourcing::core::{DomainEvent, EventEntry};

// ============================================================================
// PostgreSQL Event Store
// ============================================================================
//
// Table layout:
//   event_entries(id BIGSERIAL, aggregate_id UUID, event TEXT, event_type TEXT,
//                 created_at TIMESTAMPTZ, version BIGINT)
//   UNIQUE (aggregate_id, version)  <- the concurrency gate
//
// A batch is one multi-row INSERT inside one transaction. A unique violation
// means another writer advanced the stream; the current version is re-read
// and returned in the conflict right away.
//
// ============================================================================

const CREATE_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS event_entries (
        id BIGSERIAL PRIMARY KEY,
        aggregate_id UUID NOT NULL,
        event TEXT NOT NULL,
        event_type TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        version BIGINT NOT NULL,
        CONSTRAINT event_entries_aggregate_version_key UNIQUE (aggregate_id, version)
    )
";

const CURRENT_VERSION: &str =
    "SELECT COALESCE(MAX(version), 0) FROM event_entries WHERE aggregate_id = $1";

const LOAD_EVENTS: &str = r"
    SELECT id, aggregate_id, event, event_type, created_at, version
    FROM event_entries
    WHERE aggregate_id = $1
    ORDER BY version ASC
";

/// Raw `event_entries` row: (id, aggregate_id, event, event_type, created_at, version)
type EventRow = (i64, Uuid, String, String, DateTime<Utc>, i64);

#[derive(Clone, Debug)]
pub struct PostgresEventStore {
    pool: PgPool,
}

impl PostgresEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, EventStoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        tracing::info!(max_connections, "Connected to PostgreSQL event store");
        Ok(Self::new(pool))
    }

    /// Create the events table and its unique index if missing
    pub async fn ensure_schema(&self) -> Result<(), EventStoreError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    async fn stream_version(&self, aggregate_id: Uuid) -> Result<i64, EventStoreError> {
        let version = sqlx::query_scalar::<_, i64>(CURRENT_VERSION)
            .bind(aggregate_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(version)
    }

    async fn conflict(&self, aggregate_id: Uuid, expected: i64) -> EventStoreError {
        match self.stream_version(aggregate_id).await {
            Ok(actual) => {
                tracing::warn!(
                    aggregate_id = %aggregate_id,
                    expected_version = expected,
                    actual_version = actual,
                    "Version conflict on append"
                );
                EventStoreError::VersionConflict { expected, actual }
            }
            Err(error) => error,
        }
    }
}

/// True when the database rejected a row because of a unique index
pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn entry_from_row<E: DomainEvent>(row: EventRow) -> Result<EventEntry<E>, EventStoreError> {
    let (id, aggregate_id, event, event_type, created_at, version) = row;
    Ok(EventEntry::decode(id, aggregate_id, &event, event_type, created_at, version)?)
}

#[async_trait]
impl<E: DomainEvent> EventStore<E> for PostgresEventStore {
    #[tracing::instrument(skip(self, events), fields(event_count = events.len()))]
    async fn append(
        &self,
        events: &[E],
        aggregate_id: Uuid,
        expected_version: i64,
    ) -> Result<i64, EventStoreError> {
        let prepared = prepare_events(events, expected_version)?;
        let Some(&(_, _, new_version)) = prepared.last() else {
            return Ok(expected_version);
        };

        let mut tx = self.pool.begin().await?;

        // Early exit for writers that are visibly behind; the unique index
        // still decides races that slip past this read.
        let current = sqlx::query_scalar::<_, i64>(CURRENT_VERSION)
            .bind(aggregate_id)
            .fetch_one(&mut *tx)
            .await?;
        if current != expected_version {
            drop(tx);
            return Err(self.conflict(aggregate_id, expected_version).await);
        }

        let created_at = Utc::now();
        let mut insert = QueryBuilder::<Postgres>::new(
            "INSERT INTO event_entries (aggregate_id, event, event_type, created_at, version) ",
        );
        insert.push_values(prepared, |mut row, (event_type, payload, version)| {
            row.push_bind(aggregate_id)
                .push_bind(payload)
                .push_bind(event_type)
                .push_bind(created_at)
                .push_bind(version);
        });

        let executed = insert.build().execute(&mut *tx).await;
        let inserted = match executed {
            Ok(_) => tx.commit().await,
            Err(error) => {
                drop(tx);
                Err(error)
            }
        };

        match inserted {
            Ok(()) => {}
            Err(error) if is_unique_violation(&error) => {
                return Err(self.conflict(aggregate_id, expected_version).await);
            }
            Err(error) => return Err(error.into()),
        }

        tracing::info!(
            aggregate_id = %aggregate_id,
            new_version,
            event_count = events.len(),
            "Appended events to event store"
        );

        Ok(new_version)
    }

    async fn load_entries(&self, aggregate_id: Uuid) -> Result<Vec<EventEntry<E>>, EventStoreError> {
        let rows = sqlx::query_as::<_, EventRow>(LOAD_EVENTS)
            .bind(aggregate_id)
            .fetch_all(&self.pool)
            .await?;

        let entries = rows
            .into_iter()
            .map(entry_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("Loaded {} events for aggregate {}", entries.len(), aggregate_id);
        Ok(entries)
    }

    async fn current_version(&self, aggregate_id: Uuid) -> Result<i64, EventStoreError> {
        self.stream_version(aggregate_id).await
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
//
// Round trips against a live database are covered by the shared store tests
// on the in-memory implementation; these exercise the SQL-free helpers.
//
// ============================================================================
