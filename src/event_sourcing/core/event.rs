use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

// ============================================================================
// Event Envelope - the record persisted in an aggregate's log
// ============================================================================
//
// Wraps a domain event with the identity of the aggregate it belongs to and
// its position in that aggregate's history. This is GENERIC and works with
// ANY event type.
//
// ============================================================================

/// Generic Event Envelope - one immutable fact scoped to one aggregate
///
/// Type Parameter:
/// - `E`: The domain event type (must implement DomainEvent trait)
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EventEnvelope<E> {
    // Event Identity
    pub event_id: Uuid,
    pub aggregate_id: Uuid,
    pub sequence_number: i64,

    // Stable event name from `DomainEvent::event_type`, e.g. "OrderShipped".
    // Not the serde tag inside `event_data`, which is the bare variant name.
    pub event_type: String,

    // Event Payload
    pub event_data: E,

    // Groups related events across aggregates
    pub correlation_id: Option<Uuid>,

    pub timestamp: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl<E: DomainEvent> EventEnvelope<E> {
    pub fn new(aggregate_id: Uuid, sequence_number: i64, event_data: E) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            aggregate_id,
            sequence_number,
            event_type: event_data.event_type().to_string(),
            event_data,
            correlation_id: None,
            timestamp: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_correlation(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

// ============================================================================
// Domain Event Trait
// ============================================================================

/// Generic Domain Event trait
///
/// Implemented by each aggregate's event enum. The enum is expected to be
/// serialized as a tagged variant (`#[serde(tag = "type", content = "data")]`)
/// so that a reader can dispatch on the tag.
pub trait DomainEvent: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Stable name of this event's variant, e.g. "OrderShipped".
    fn event_type(&self) -> &'static str;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
    #[serde(tag = "type", content = "data")]
    enum TestEvent {
        Opened { label: String },
        Closed,
    }

    impl DomainEvent for TestEvent {
        fn event_type(&self) -> &'static str {
            match self {
                TestEvent::Opened { .. } => "TestOpened",
                TestEvent::Closed => "TestClosed",
            }
        }
    }

    #[test]
    fn test_event_envelope_creation() {
        let aggregate_id = Uuid::new_v4();
        let correlation_id = Uuid::new_v4();

        let envelope = EventEnvelope::new(
            aggregate_id,
            1,
            TestEvent::Opened { label: "test".to_string() },
        )
        .with_correlation(correlation_id);

        assert_eq!(envelope.aggregate_id, aggregate_id);
        assert_eq!(envelope.sequence_number, 1);
        assert_eq!(envelope.event_type, "TestOpened");
        assert_eq!(envelope.correlation_id, Some(correlation_id));
    }

    #[test]
    fn test_tagged_payload_layout() {
        let envelope = EventEnvelope::new(Uuid::new_v4(), 2, TestEvent::Closed)
            .with_metadata("source", "unit-test");

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["event_data"]["type"], "Closed");
        assert_eq!(json["event_type"], "TestClosed");
        assert_eq!(json["metadata"]["source"], "unit-test");
    }

    #[test]
    fn test_empty_metadata_is_omitted() {
        let envelope = EventEnvelope::new(Uuid::new_v4(), 1, TestEvent::Closed);
        let json = serde_json::to_value(&envelope).unwrap();
        assert!(json.get("metadata").is_none());

        let back: EventEnvelope<TestEvent> = serde_json::from_value(json).unwrap();
        assert_eq!(back, envelope);
    }
}
