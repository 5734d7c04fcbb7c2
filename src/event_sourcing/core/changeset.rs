use super::event::EventEnvelope;

// ============================================================================
// Changeset - events raised in memory but not yet persisted
// ============================================================================

/// Buffer of uncommitted events, kept in the order they were raised.
///
/// `commit` must only be called once every event in it is durable;
/// [`AggregateRepository`](crate::event_sourcing::AggregateRepository) does
/// this after the last append succeeds.
#[derive(Debug, Clone, PartialEq)]
pub struct Changeset<E> {
    events: Vec<EventEnvelope<E>>,
}

impl<E> Default for Changeset<E> {
    fn default() -> Self {
        Self { events: Vec::new() }
    }
}

impl<E> Changeset<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[EventEnvelope<E>] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn record(&mut self, envelope: EventEnvelope<E>) {
        self.events.push(envelope);
    }

    /// Drop the pending events. Returns what was committed.
    pub fn commit(&mut self) -> Vec<EventEnvelope<E>> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_sourcing::core::DomainEvent;
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
    #[serde(tag = "type", content = "data")]
    enum Tick {
        Tick(u32),
    }

    impl DomainEvent for Tick {
        fn event_type(&self) -> &'static str {
            "Tick"
        }
    }

    #[test]
    fn test_changeset_keeps_insertion_order() {
        let id = Uuid::new_v4();
        let mut changeset = Changeset::new();
        for n in 1..=3 {
            changeset.record(EventEnvelope::new(id, n as i64, Tick::Tick(n)));
        }

        let seen: Vec<i64> = changeset.events().iter().map(|e| e.sequence_number).collect();
        assert_eq!(seen, vec![1, 2, 3]);
        assert_eq!(changeset.len(), 3);
    }

    #[test]
    fn test_commit_clears_and_returns_events() {
        let id = Uuid::new_v4();
        let mut changeset = Changeset::new();
        changeset.record(EventEnvelope::new(id, 1, Tick::Tick(1)));

        let committed = changeset.commit();
        assert_eq!(committed.len(), 1);
        assert!(changeset.is_empty());
    }
}
