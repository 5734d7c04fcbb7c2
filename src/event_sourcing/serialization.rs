use serde::{de::DeserializeOwned, Serialize};

use crate::error::SerializationError;

// ============================================================================
// Event Serialization
// ============================================================================
//
// Converts one event record to text and back. The format is opaque to the
// event store; it only requires that `deserialize(serialize(e)) == e` and
// that the output never contains the store's separator token.
//
// ============================================================================

pub trait EventSerializer<E>: Send + Sync {
    fn serialize(&self, event: &E) -> Result<String, SerializationError>;

    fn deserialize(&self, text: &str) -> Result<E, SerializationError>;
}

/// Compact single-line JSON.
///
/// serde_json escapes control characters inside strings, so the output never
/// contains a raw newline and is safe with the default `"\n"` separator.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEventSerializer;

impl<E> EventSerializer<E> for JsonEventSerializer
where
    E: Serialize + DeserializeOwned,
{
    fn serialize(&self, event: &E) -> Result<String, SerializationError> {
        serde_json::to_string(event).map_err(SerializationError::Serialize)
    }

    fn deserialize(&self, text: &str) -> Result<E, SerializationError> {
        serde_json::from_str(text).map_err(SerializationError::Deserialize)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_sourcing::core::{DomainEvent, EventEnvelope};
    use serde::Deserialize;
    use uuid::Uuid;

    #[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
    #[serde(tag = "type", content = "data")]
    enum NoteEvent {
        Written { text: String },
        Erased,
    }

    impl DomainEvent for NoteEvent {
        fn event_type(&self) -> &'static str {
            match self {
                NoteEvent::Written { .. } => "NoteWritten",
                NoteEvent::Erased => "NoteErased",
            }
        }
    }

    #[test]
    fn test_event_round_trip() {
        let serializer = JsonEventSerializer;
        let event = EventEnvelope::new(
            Uuid::new_v4(),
            1,
            NoteEvent::Written { text: "first line\nsecond line".to_string() },
        )
        .with_correlation(Uuid::new_v4());

        let text = serializer.serialize(&event).unwrap();
        let back: EventEnvelope<NoteEvent> = serializer.deserialize(&text).unwrap();

        assert_eq!(back, event);
    }

    #[test]
    fn test_output_is_single_line() {
        let serializer = JsonEventSerializer;
        let event = EventEnvelope::new(
            Uuid::new_v4(),
            1,
            NoteEvent::Written { text: "a\nb\r\nc".to_string() },
        );

        let text = EventSerializer::<EventEnvelope<NoteEvent>>::serialize(&serializer, &event).unwrap();
        assert!(!text.contains('\n'));
        assert!(!text.contains('\r'));
    }

    #[test]
    fn test_deserialize_dispatches_on_tag() {
        let serializer = JsonEventSerializer;
        let event: NoteEvent = serializer.deserialize(r#"{"type":"Erased"}"#).unwrap();
        assert_eq!(event, NoteEvent::Erased);
    }

    #[test]
    fn test_unknown_tag_is_an_error() {
        let serializer = JsonEventSerializer;
        let result: Result<NoteEvent, _> = serializer.deserialize(r#"{"type":"Burned"}"#);
        assert!(matches!(result, Err(SerializationError::Deserialize(_))));
    }
}
