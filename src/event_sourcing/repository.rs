use std::sync::Arc;
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::event_sourcing::core::{Aggregate, EventEnvelope, ReplayFn};
use crate::event_sourcing::store::EventStore;
use crate::metrics::Metrics;

// ============================================================================
// Aggregate Repository
// ============================================================================
//
// Orchestrates: Aggregate changeset → Event Store (save)
//               Event Store → replay constructor → Aggregate (find)
//
// One repository serves one aggregate type over one event store.
//
// ============================================================================

/// Published after a save, carrying exactly the events just committed.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateSaved<E> {
    pub aggregate_type: &'static str,
    pub aggregate_id: Uuid,
    pub events: Vec<EventEnvelope<E>>,
}

/// Observer of successful saves. Closures `Fn(&AggregateSaved<E>)` qualify.
pub trait SaveListener<E>: Send + Sync {
    fn on_saved(&self, saved: &AggregateSaved<E>);
}

impl<E, F> SaveListener<E> for F
where
    F: Fn(&AggregateSaved<E>) + Send + Sync,
{
    fn on_saved(&self, saved: &AggregateSaved<E>) {
        self(saved)
    }
}

pub struct AggregateRepository<A: Aggregate, S> {
    event_store: Arc<S>,
    replay: ReplayFn<A>,
    listeners: Vec<Arc<dyn SaveListener<A::Event>>>,
    metrics: Option<Arc<Metrics>>,
}

impl<A, S> AggregateRepository<A, S>
where
    A: Aggregate,
    S: EventStore<A::Event>,
{
    /// `replay` rebuilds an `A` from its id and non-empty history; usually
    /// `A::load_from_events`.
    pub fn new(event_store: Arc<S>, replay: ReplayFn<A>) -> Self {
        Self {
            event_store,
            replay,
            listeners: Vec::new(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Register an observer. Listeners run synchronously, in registration
    /// order, once per successful save.
    pub fn add_listener(&mut self, listener: impl SaveListener<A::Event> + 'static) {
        self.listeners.push(Arc::new(listener));
    }

    pub fn event_store(&self) -> &Arc<S> {
        &self.event_store
    }

    /// Persist the aggregate's pending events, one at a time and in order,
    /// then commit the changeset and notify listeners.
    ///
    /// If an append fails, the events before it stay durable, the changeset
    /// is left as it was and no listener runs. Saving again re-appends the
    /// whole changeset, so the earlier events would be duplicated; see
    /// [`RepositoryError::SaveInterrupted`].
    pub async fn save_aggregate(&self, aggregate: &mut A) -> Result<AggregateSaved<A::Event>, RepositoryError> {
        let aggregate_id = aggregate.aggregate_id();
        let pending = aggregate.changeset().events();
        let total = pending.len();

        if total == 0 {
            tracing::debug!(
                aggregate_type = A::AGGREGATE_TYPE,
                aggregate_id = %aggregate_id,
                "Nothing to save"
            );
            return Ok(AggregateSaved {
                aggregate_type: A::AGGREGATE_TYPE,
                aggregate_id,
                events: Vec::new(),
            });
        }

        for (appended, event) in pending.iter().enumerate() {
            if let Err(source) = self.event_store.add_event(A::AGGREGATE_TYPE, event).await {
                tracing::warn!(
                    aggregate_type = A::AGGREGATE_TYPE,
                    aggregate_id = %aggregate_id,
                    appended,
                    total,
                    error = %source,
                    "Save interrupted; changeset left uncommitted"
                );
                if let Some(metrics) = &self.metrics {
                    metrics.record_save(A::AGGREGATE_TYPE, false);
                }
                return Err(RepositoryError::SaveInterrupted {
                    aggregate_type: A::AGGREGATE_TYPE,
                    aggregate_id,
                    appended,
                    total,
                    source,
                });
            }
        }

        let saved = AggregateSaved {
            aggregate_type: A::AGGREGATE_TYPE,
            aggregate_id,
            events: aggregate.changeset_mut().commit(),
        };

        if let Some(metrics) = &self.metrics {
            metrics.record_save(A::AGGREGATE_TYPE, true);
        }

        tracing::info!(
            aggregate_type = A::AGGREGATE_TYPE,
            aggregate_id = %aggregate_id,
            event_count = total,
            version = aggregate.version(),
            "✅ Saved aggregate"
        );

        for listener in &self.listeners {
            listener.on_saved(&saved);
        }

        Ok(saved)
    }

    pub async fn get_aggregate_ids(&self) -> Result<Vec<Uuid>, RepositoryError> {
        Ok(self.event_store.get_aggregate_ids(A::AGGREGATE_TYPE).await?)
    }

    /// Rebuild an aggregate from its full history. `None` when it has no events.
    pub async fn find_aggregate(&self, aggregate_id: Uuid) -> Result<Option<A>, RepositoryError> {
        let events = self
            .event_store
            .get_events(A::AGGREGATE_TYPE, aggregate_id)
            .await?;

        if events.is_empty() {
            tracing::debug!(
                aggregate_type = A::AGGREGATE_TYPE,
                aggregate_id = %aggregate_id,
                "Aggregate not found"
            );
            return Ok(None);
        }

        let count = events.len();
        let aggregate = (self.replay)(aggregate_id, events)?;

        tracing::debug!(
            aggregate_type = A::AGGREGATE_TYPE,
            aggregate_id = %aggregate_id,
            event_count = count,
            "Replayed aggregate"
        );

        Ok(Some(aggregate))
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
