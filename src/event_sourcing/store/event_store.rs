use async_trait::async_trait;
use uuid::Uuid;

use crate::error::EventStoreError;
use crate::event_sourcing::core::{DomainEvent, EventEnvelope};

// ============================================================================
// Generic Event Store - durable, append-only logs
// ============================================================================
//
// One log per (aggregate type, aggregate id). Any backend (files, database,
// object store) must satisfy the same contract:
//
// 1. `add_event` returns only once the event is durable, never reorders or
//    rewrites earlier entries, and creates the log on first use
// 2. `get_events` returns every appended event, in append order; an unknown
//    id yields an empty list, not an error
// 3. `get_aggregate_ids` lists ids with at least one event; an aggregate type
//    that was never written yields an empty list
//
// ============================================================================

#[async_trait]
pub trait EventStore<E: DomainEvent>: Send + Sync {
    async fn add_event(
        &self,
        aggregate_type: &str,
        event: &EventEnvelope<E>,
    ) -> Result<(), EventStoreError>;

    async fn get_aggregate_ids(&self, aggregate_type: &str) -> Result<Vec<Uuid>, EventStoreError>;

    async fn get_events(
        &self,
        aggregate_type: &str,
        aggregate_id: Uuid,
    ) -> Result<Vec<EventEnvelope<E>>, EventStoreError>;
}
