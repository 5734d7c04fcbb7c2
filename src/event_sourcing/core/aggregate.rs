use uuid::Uuid;

use super::changeset::Changeset;
use super::event::{DomainEvent, EventEnvelope};
use crate::error::ReplayError;

// ============================================================================
// Aggregate Root Pattern - Event Sourcing Core
// ============================================================================
//
// Key Principles:
// 1. State is derived from events (not stored directly)
// 2. Commands are validated before emitting events
// 3. Events raised in memory wait in a changeset until a repository saves them
// 4. Replaying the stored events rebuilds exactly the saved state
//
// This is the GENERIC aggregate trait that works for ANY domain aggregate.
//
// ============================================================================

/// Replay constructor registered with a repository at wiring time.
///
/// Usually `<A as Aggregate>::load_from_events`.
pub type ReplayFn<A> =
    fn(Uuid, Vec<EventEnvelope<<A as Aggregate>::Event>>) -> Result<A, ReplayError>;

/// Generic Aggregate trait - all event-sourced aggregates implement this
///
/// Type Parameters:
/// - `Event`: The domain event type for this aggregate
/// - `Command`: The command type for this aggregate
/// - `Error`: The error type for business rule violations
///
/// Versioning contract: `apply_first_event` yields an aggregate at version 1
/// and every successful `apply_event` increments the version by one, so the
/// version always equals the number of events folded.
pub trait Aggregate: Sized + Send + Sync {
    /// Partition name used by the event store, e.g. "Order".
    const AGGREGATE_TYPE: &'static str;

    type Event: DomainEvent;
    type Command;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Create new aggregate from first event
    fn apply_first_event(aggregate_id: Uuid, event: &Self::Event) -> Result<Self, Self::Error>;

    /// Apply subsequent events to update state
    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error>;

    /// Handle command and emit events (business logic)
    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;

    fn aggregate_id(&self) -> Uuid;

    /// Number of events folded into this instance, pending ones included.
    fn version(&self) -> i64;

    fn changeset(&self) -> &Changeset<Self::Event>;

    fn changeset_mut(&mut self) -> &mut Changeset<Self::Event>;

    /// Start a brand-new aggregate. The first event waits in the changeset.
    fn create(aggregate_id: Uuid, first_event: Self::Event) -> Result<Self, Self::Error> {
        let mut aggregate = Self::apply_first_event(aggregate_id, &first_event)?;
        let envelope = EventEnvelope::new(aggregate_id, aggregate.version(), first_event);
        aggregate.changeset_mut().record(envelope);
        Ok(aggregate)
    }

    /// Run a command, fold the resulting events and queue them for saving.
    ///
    /// Returns the number of events raised; a no-op command raises none.
    fn execute(&mut self, command: &Self::Command) -> Result<usize, Self::Error> {
        let events = self.handle_command(command)?;
        let count = events.len();

        for event in events {
            self.apply_event(&event)?;
            let envelope = EventEnvelope::new(self.aggregate_id(), self.version(), event);
            self.changeset_mut().record(envelope);
        }

        Ok(count)
    }

    /// Load aggregate from event history (reconstruct from events)
    ///
    /// Deterministic: the same sequence always folds to the same state. The
    /// returned aggregate has nothing pending.
    fn load_from_events(
        aggregate_id: Uuid,
        events: Vec<EventEnvelope<Self::Event>>,
    ) -> Result<Self, ReplayError> {
        let mut history = events.iter();
        let first = history.next().ok_or(ReplayError::NoEvents(aggregate_id))?;

        // Apply first event to create aggregate
        let mut aggregate = Self::apply_first_event(aggregate_id, &first.event_data)
            .map_err(|e| replay_failure(aggregate_id, first, e))?;

        // Apply remaining events
        for envelope in history {
            aggregate
                .apply_event(&envelope.event_data)
                .map_err(|e| replay_failure(aggregate_id, envelope, e))?;
        }

        Ok(aggregate)
    }
}

fn replay_failure<E, D: std::fmt::Display>(
    aggregate_id: Uuid,
    envelope: &EventEnvelope<E>,
    error: D,
) -> ReplayError {
    ReplayError::Apply {
        aggregate_id,
        sequence_number: envelope.sequence_number,
        event_type: envelope.event_type.clone(),
        reason: error.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
    #[serde(tag = "type", content = "data")]
    enum LampEvent {
        Installed,
        Switched { on: bool },
    }

    impl DomainEvent for LampEvent {
        fn event_type(&self) -> &'static str {
            match self {
                LampEvent::Installed => "LampInstalled",
                LampEvent::Switched { .. } => "LampSwitched",
            }
        }
    }

    #[derive(Debug, thiserror::Error)]
    enum LampError {
        #[error("Lamp is already in the requested state")]
        Unchanged,
        #[error("Lamp not installed")]
        NotInstalled,
    }

    struct Lamp {
        id: Uuid,
        version: i64,
        on: bool,
        changeset: Changeset<LampEvent>,
    }

    impl Aggregate for Lamp {
        const AGGREGATE_TYPE: &'static str = "Lamp";
        type Event = LampEvent;
        type Command = bool;
        type Error = LampError;

        fn apply_first_event(aggregate_id: Uuid, event: &Self::Event) -> Result<Self, Self::Error> {
            match event {
                LampEvent::Installed => Ok(Self {
                    id: aggregate_id,
                    version: 1,
                    on: false,
                    changeset: Changeset::new(),
                }),
                _ => Err(LampError::NotInstalled),
            }
        }

        fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error> {
            if let LampEvent::Switched { on } = event {
                self.on = *on;
            }
            self.version += 1;
            Ok(())
        }

        fn handle_command(&self, on: &bool) -> Result<Vec<Self::Event>, Self::Error> {
            if *on == self.on {
                return Err(LampError::Unchanged);
            }
            Ok(vec![LampEvent::Switched { on: *on }])
        }

        fn aggregate_id(&self) -> Uuid {
            self.id
        }

        fn version(&self) -> i64 {
            self.version
        }

        fn changeset(&self) -> &Changeset<Self::Event> {
            &self.changeset
        }

        fn changeset_mut(&mut self) -> &mut Changeset<Self::Event> {
            &mut self.changeset
        }
    }

    #[test]
    fn test_create_queues_first_event() {
        let id = Uuid::new_v4();
        let lamp = Lamp::create(id, LampEvent::Installed).unwrap();

        assert_eq!(lamp.version(), 1);
        assert_eq!(lamp.changeset().len(), 1);
        assert_eq!(lamp.changeset().events()[0].sequence_number, 1);
        assert_eq!(lamp.changeset().events()[0].aggregate_id, id);
    }

    #[test]
    fn test_execute_folds_and_records_in_order() {
        let mut lamp = Lamp::create(Uuid::new_v4(), LampEvent::Installed).unwrap();
        lamp.execute(&true).unwrap();
        lamp.execute(&false).unwrap();

        assert!(!lamp.on);
        let sequence: Vec<i64> = lamp.changeset().events().iter().map(|e| e.sequence_number).collect();
        assert_eq!(sequence, vec![1, 2, 3]);
    }

    #[test]
    fn test_rejected_command_records_nothing() {
        let mut lamp = Lamp::create(Uuid::new_v4(), LampEvent::Installed).unwrap();
        let result = lamp.execute(&false);

        assert!(matches!(result, Err(LampError::Unchanged)));
        assert_eq!(lamp.changeset().len(), 1);
    }

    #[test]
    fn test_load_from_events_replays_history() {
        let id = Uuid::new_v4();
        let mut lamp = Lamp::create(id, LampEvent::Installed).unwrap();
        lamp.execute(&true).unwrap();
        let history = lamp.changeset_mut().commit();

        let replayed = Lamp::load_from_events(id, history.clone()).unwrap();
        let again = Lamp::load_from_events(id, history).unwrap();

        assert!(replayed.on);
        assert_eq!(replayed.version(), 2);
        assert!(replayed.changeset().is_empty());
        assert_eq!(replayed.on, again.on);
        assert_eq!(replayed.version(), again.version());
    }

    #[test]
    fn test_load_from_empty_history_fails() {
        let id = Uuid::new_v4();
        let result = Lamp::load_from_events(id, Vec::new());
        assert!(matches!(result, Err(ReplayError::NoEvents(got)) if got == id));
    }

    #[test]
    fn test_load_with_wrong_first_event_reports_position() {
        let id = Uuid::new_v4();
        let history = vec![EventEnvelope::new(id, 1, LampEvent::Switched { on: true })];

        match Lamp::load_from_events(id, history) {
            Err(ReplayError::Apply { sequence_number, event_type, .. }) => {
                assert_eq!(sequence_number, 1);
                assert_eq!(event_type, "LampSwitched");
            }
            other => panic!("expected apply failure, got {:?}", other.map(|l| l.version)),
        }
    }
}
