use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

// ============================================================================
// Event Entry - Persisted Event Record
// ============================================================================
//
// One row of an aggregate's append-only stream. The payload is stored as JSON
// text next to a type tag; the tag decides which payload shape is decoded.
//
// ============================================================================

/// A stored event together with its position in the aggregate's stream
///
/// Type Parameter:
/// - `E`: The domain event type (must implement DomainEvent trait)
#[derive(Clone, Debug, PartialEq)]
pub struct EventEntry<E> {
    /// Store-assigned auto-increment id
    pub id: i64,
    pub aggregate_id: Uuid,
    /// 1-based position in the aggregate's stream
    pub version: i64,
    pub event_type: String,
    pub event_data: E,
    pub created_at: DateTime<Utc>,
}

impl<E: DomainEvent> EventEntry<E> {
    /// Rebuild an entry from its raw stored columns
    pub fn decode(
        id: i64,
        aggregate_id: Uuid,
        payload: &str,
        event_type: String,
        created_at: DateTime<Utc>,
        version: i64,
    ) -> Result<Self, EventDecodeError> {
        let event_data = E::decode_payload(&event_type, payload)?;

        Ok(Self {
            id,
            aggregate_id,
            version,
            event_type,
            event_data,
            created_at,
        })
    }
}

// ============================================================================
// Domain Event Trait
// ============================================================================

/// Generic Domain Event trait
///
/// Implemented by the closed union of an aggregate's events. Each variant
/// reports its own type tag and is encoded without the enum wrapper, so the
/// stored payload is the bare variant body.
pub trait DomainEvent: Clone + Send + Sync + 'static {
    /// Type tag recorded next to the payload
    fn event_type(&self) -> &'static str;

    /// Serialize the variant body
    fn encode_payload(&self) -> serde_json::Result<String>;

    /// Decode a variant body according to its recorded type tag
    fn decode_payload(event_type: &str, payload: &str) -> Result<Self, EventDecodeError>
    where
        Self: Sized;
}

#[derive(Debug, thiserror::Error)]
pub enum EventDecodeError {
    #[error("Unknown event type: {0}")]
    UnknownEventType(String),

    #[error("Malformed {event_type} payload: {source}")]
    Payload {
        event_type: String,
        #[source]
        source: serde_json::Error,
    },
}

// ============================================================================
// Event Serialization Helpers
// ============================================================================

pub fn serialize_event<E: Serialize>(event: &E) -> serde_json::Result<String> {
    serde_json::to_string(event)
}

pub fn deserialize_event<E: DeserializeOwned>(
    event_type: &str,
    json: &str,
) -> Result<E, EventDecodeError> {
    serde_json::from_str(json).map_err(|source| EventDecodeError::Payload {
        event_type: event_type.to_string(),
        source,
    })
}
