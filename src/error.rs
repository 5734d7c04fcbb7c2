use std::path::PathBuf;
use uuid::Uuid;

// ============================================================================
// Event Store Errors
// ============================================================================
//
// Typed failures for the generic event sourcing infrastructure.
// Domain-specific business rule errors live next to their aggregate
// (see src/domain/*/errors.rs).
//
// ============================================================================

/// Failure converting one event record to or from its textual form.
#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    #[error("Failed to serialize event: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Failed to deserialize event record: {0}")]
    Deserialize(#[source] serde_json::Error),
}

/// Errors raised by an [`EventStore`](crate::event_sourcing::EventStore) backend.
#[derive(Debug, thiserror::Error)]
pub enum EventStoreError {
    /// Disk full, permission denied, contention on the log file, ...
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Serialization(#[from] SerializationError),

    /// The serialized record embeds the configured separator token, or ends
    /// in a way that overlaps it. Writing it would split wrongly on the next read.
    #[error("Serialized event {event_id} collides with the event separator; refusing to append")]
    SeparatorInPayload { event_id: Uuid },

    #[error("Invalid store configuration: {0}")]
    InvalidConfig(String),

    /// A log file whose name is not an aggregate id.
    #[error("Log file {file_name:?} under aggregate type {aggregate_type:?} is not named by an aggregate id")]
    InvalidLogName {
        aggregate_type: String,
        file_name: String,
    },

    #[error("Blocking I/O task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl EventStoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failure rebuilding an aggregate from its event history.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("Cannot replay aggregate {0} from an empty event list")]
    NoEvents(Uuid),

    #[error("Failed to apply event #{sequence_number} ({event_type}) to aggregate {aggregate_id}: {reason}")]
    Apply {
        aggregate_id: Uuid,
        sequence_number: i64,
        event_type: String,
        reason: String,
    },
}

/// Errors surfaced by [`AggregateRepository`](crate::event_sourcing::AggregateRepository).
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Store(#[from] EventStoreError),

    /// An append failed partway through a save.
    ///
    /// The first `appended` events are durable and will not be rolled back.
    /// The changeset was left uncommitted, so saving the same aggregate again
    /// re-appends them: delivery is at-least-once.
    #[error(
        "Save of {aggregate_type} {aggregate_id} interrupted after {appended} of {total} events; \
         changeset left uncommitted, retrying will re-append the {appended} durable event(s)"
    )]
    SaveInterrupted {
        aggregate_type: &'static str,
        aggregate_id: Uuid,
        appended: usize,
        total: usize,
        #[source]
        source: EventStoreError,
    },

    #[error(transparent)]
    Replay(#[from] ReplayError),
}

impl RepositoryError {
    /// Number of events already durable when a save was interrupted.
    pub fn durably_appended(&self) -> Option<usize> {
        match self {
            Self::SaveInterrupted { appended, .. } => Some(*appended),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_interrupted_message_flags_duplicate_hazard() {
        let err = RepositoryError::SaveInterrupted {
            aggregate_type: "Order",
            aggregate_id: Uuid::nil(),
            appended: 2,
            total: 3,
            source: EventStoreError::io(
                "/tmp/x.txt",
                std::io::Error::other("disk full"),
            ),
        };

        let message = err.to_string();
        assert!(message.contains("2 of 3"));
        assert!(message.contains("uncommitted"));
        assert_eq!(err.durably_appended(), Some(2));
    }

    #[test]
    fn test_durably_appended_only_for_interrupted_saves() {
        let err = RepositoryError::Replay(ReplayError::NoEvents(Uuid::nil()));
        assert_eq!(err.durably_appended(), None);
    }
}
