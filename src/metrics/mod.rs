// Private module declaration
mod server;

use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};

// Re-export for public API
pub use server::start_metrics_server;

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Provides metrics for:
// - Event log appends (throughput, latency, failures)
// - Event log reads (events replayed, latency)
// - Repository saves (completed, interrupted mid-changeset)
//
// All metrics are registered with Prometheus and can be scraped via /metrics
// ============================================================================

const DURATION_BUCKETS: [f64; 8] = [0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0];

/// Central metrics registry for the event store and repositories
pub struct Metrics {
    registry: Registry,

    // Event Log Metrics
    pub events_appended_total: IntCounterVec,
    pub append_failures_total: IntCounterVec,
    pub append_duration: HistogramVec,
    pub events_read_total: IntCounterVec,
    pub read_duration: HistogramVec,

    // Repository Metrics
    pub aggregates_saved_total: IntCounterVec,
    pub save_interruptions_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        // Event Log Metrics
        let events_appended_total = IntCounterVec::new(
            Opts::new("event_store_events_appended_total", "Total events durably appended"),
            &["aggregate_type"],
        )?;
        registry.register(Box::new(events_appended_total.clone()))?;

        let append_failures_total = IntCounterVec::new(
            Opts::new("event_store_append_failures_total", "Total failed event appends"),
            &["aggregate_type"],
        )?;
        registry.register(Box::new(append_failures_total.clone()))?;

        let append_duration = HistogramVec::new(
            HistogramOpts::new("event_store_append_duration_seconds", "Event append duration")
                .buckets(DURATION_BUCKETS.to_vec()),
            &["aggregate_type"],
        )?;
        registry.register(Box::new(append_duration.clone()))?;

        let events_read_total = IntCounterVec::new(
            Opts::new("event_store_events_read_total", "Total events read back from logs"),
            &["aggregate_type"],
        )?;
        registry.register(Box::new(events_read_total.clone()))?;

        let read_duration = HistogramVec::new(
            HistogramOpts::new("event_store_read_duration_seconds", "Full log read duration")
                .buckets(DURATION_BUCKETS.to_vec()),
            &["aggregate_type"],
        )?;
        registry.register(Box::new(read_duration.clone()))?;

        // Repository Metrics
        let aggregates_saved_total = IntCounterVec::new(
            Opts::new("repository_aggregates_saved_total", "Total successful aggregate saves"),
            &["aggregate_type"],
        )?;
        registry.register(Box::new(aggregates_saved_total.clone()))?;

        let save_interruptions_total = IntCounterVec::new(
            Opts::new(
                "repository_save_interruptions_total",
                "Saves that failed after some events were already appended",
            ),
            &["aggregate_type"],
        )?;
        registry.register(Box::new(save_interruptions_total.clone()))?;

        Ok(Self {
            registry,
            events_appended_total,
            append_failures_total,
            append_duration,
            events_read_total,
            read_duration,
            aggregates_saved_total,
            save_interruptions_total,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Helper to record one append attempt
    pub fn record_append(&self, aggregate_type: &str, duration_secs: f64, success: bool) {
        if success {
            self.events_appended_total.with_label_values(&[aggregate_type]).inc();
        } else {
            self.append_failures_total.with_label_values(&[aggregate_type]).inc();
        }
        self.append_duration.with_label_values(&[aggregate_type]).observe(duration_secs);
    }

    /// Helper to record one full log read
    pub fn record_read(&self, aggregate_type: &str, events: usize, duration_secs: f64) {
        self.events_read_total
            .with_label_values(&[aggregate_type])
            .inc_by(events as u64);
        self.read_duration.with_label_values(&[aggregate_type]).observe(duration_secs);
    }

    /// Helper to record a repository save outcome
    pub fn record_save(&self, aggregate_type: &str, success: bool) {
        if success {
            self.aggregates_saved_total.with_label_values(&[aggregate_type]).inc();
        } else {
            self.save_interruptions_total.with_label_values(&[aggregate_type]).inc();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        metrics.record_append("Order", 0.001, true);
        assert!(!metrics.registry.gather().is_empty());
    }

    #[test]
    fn test_record_append() {
        let metrics = Metrics::new().unwrap();
        metrics.record_append("Order", 0.002, true);
        metrics.record_append("Order", 0.003, false);

        let gathered = metrics.registry.gather();
        assert!(gathered
            .iter()
            .any(|m| m.name() == "event_store_append_duration_seconds"));
        assert_eq!(metrics.events_appended_total.with_label_values(&["Order"]).get(), 1);
        assert_eq!(metrics.append_failures_total.with_label_values(&["Order"]).get(), 1);
    }

    #[test]
    fn test_record_read_counts_events() {
        let metrics = Metrics::new().unwrap();
        metrics.record_read("Order", 3, 0.01);
        metrics.record_read("Order", 0, 0.01);

        assert_eq!(metrics.events_read_total.with_label_values(&["Order"]).get(), 3);
    }

    #[test]
    fn test_record_save_outcomes() {
        let metrics = Metrics::new().unwrap();
        metrics.record_save("Order", true);
        metrics.record_save("Order", true);
        metrics.record_save("Order", false);

        assert_eq!(metrics.aggregates_saved_total.with_label_values(&["Order"]).get(), 2);
        assert_eq!(metrics.save_interruptions_total.with_label_values(&["Order"]).get(), 1);
    }
}
