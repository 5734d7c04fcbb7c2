// ============================================================================
// Text File Event Store
// ============================================================================
//
// Event-sourced aggregates persisted as one append-only text log per
// aggregate instance:
//
//   <folder>/<aggregate_type>/<aggregate_id>.txt
//
// - event_sourcing/ - generic aggregate, changeset, store and repository
// - domain/         - concrete aggregates built on top of it
//
// ============================================================================

pub mod config;
pub mod domain;
pub mod error;
pub mod event_sourcing;
pub mod metrics;

pub use config::StoreConfig;
pub use error::{EventStoreError, ReplayError, RepositoryError, SerializationError};
pub use event_sourcing::{
    Aggregate, AggregateRepository, AggregateSaved, Changeset, DomainEvent, EventEnvelope,
    EventSerializer, EventStore, JsonEventSerializer, ReplayFn, SaveListener, TextFileEventStore,
};
