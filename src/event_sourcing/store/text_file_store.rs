use async_trait::async_trait;
use std::ffi::OsStr;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use super::event_store::EventStore;
use super::lock::LogLocks;
use crate::config::StoreConfig;
use crate::error::EventStoreError;
use crate::event_sourcing::core::{DomainEvent, EventEnvelope};
use crate::event_sourcing::serialization::{EventSerializer, JsonEventSerializer};
use crate::metrics::Metrics;

// ============================================================================
// Text File Event Store - one file per aggregate
// ============================================================================
//
// Layout: <folder>/<aggregate_type>/<aggregate_id>.txt
//
// A log file holds its serialized events joined by the configured separator
// (none before the first record). Files only ever grow.
//
// Blocking file I/O runs on tokio's blocking pool. Appends and reads of one
// log go through that log's lock, so no reader in this process sees a
// half-written record. The blocking task owns the guard: dropping the
// calling future does not release the log while the write is still running.
// Writers in other processes are not coordinated.
//
// ============================================================================

pub const LOG_EXTENSION: &str = "txt";

pub struct TextFileEventStore<S = JsonEventSerializer> {
    config: StoreConfig,
    serializer: S,
    locks: LogLocks,
    metrics: Option<Arc<Metrics>>,
}

impl TextFileEventStore<JsonEventSerializer> {
    pub fn new(config: StoreConfig) -> Result<Self, EventStoreError> {
        Self::with_serializer(config, JsonEventSerializer)
    }
}

impl<S> TextFileEventStore<S> {
    /// Fails with [`EventStoreError::InvalidConfig`] when `config` does not
    /// pass [`StoreConfig::validate`].
    pub fn with_serializer(config: StoreConfig, serializer: S) -> Result<Self, EventStoreError> {
        config
            .validate()
            .map_err(|e| EventStoreError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            config,
            serializer,
            locks: LogLocks::new(),
            metrics: None,
        })
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn aggregate_folder(&self, aggregate_type: &str) -> PathBuf {
        self.config.folder.join(aggregate_type)
    }

    pub fn log_path(&self, aggregate_type: &str, aggregate_id: Uuid) -> PathBuf {
        self.aggregate_folder(aggregate_type)
            .join(format!("{aggregate_id}.{LOG_EXTENSION}"))
    }

    async fn append<E>(&self, aggregate_type: &str, event: &EventEnvelope<E>) -> Result<(), EventStoreError>
    where
        S: EventSerializer<EventEnvelope<E>>,
    {
        let record = self.serializer.serialize(event)?;
        if breaks_framing(&record, &self.config.event_separator) {
            return Err(EventStoreError::SeparatorInPayload {
                event_id: event.event_id,
            });
        }

        let folder = self.aggregate_folder(aggregate_type);
        let path = self.log_path(aggregate_type, event.aggregate_id);
        let separator = self.config.event_separator.clone();

        let guard = self.locks.acquire(aggregate_type, event.aggregate_id).await;
        tokio::task::spawn_blocking(move || {
            let _guard = guard;
            append_record(&folder, &path, &separator, &record)
        })
        .await?
    }
}

#[async_trait]
impl<E, S> EventStore<E> for TextFileEventStore<S>
where
    E: DomainEvent,
    S: EventSerializer<EventEnvelope<E>>,
{
    async fn add_event(
        &self,
        aggregate_type: &str,
        event: &EventEnvelope<E>,
    ) -> Result<(), EventStoreError> {
        let started = Instant::now();
        let outcome = self.append(aggregate_type, event).await;

        if let Some(metrics) = &self.metrics {
            metrics.record_append(aggregate_type, started.elapsed().as_secs_f64(), outcome.is_ok());
        }

        match &outcome {
            Ok(()) => tracing::info!(
                aggregate_type = %aggregate_type,
                aggregate_id = %event.aggregate_id,
                sequence_number = event.sequence_number,
                event_type = %event.event_type,
                "✅ Appended event to log"
            ),
            Err(error) => tracing::error!(
                aggregate_type = %aggregate_type,
                aggregate_id = %event.aggregate_id,
                event_type = %event.event_type,
                error = %error,
                "Failed to append event"
            ),
        }

        outcome
    }

    async fn get_aggregate_ids(&self, aggregate_type: &str) -> Result<Vec<Uuid>, EventStoreError> {
        let folder = self.aggregate_folder(aggregate_type);
        let type_name = aggregate_type.to_string();

        let ids = tokio::task::spawn_blocking(move || list_log_ids(&type_name, &folder)).await??;

        tracing::debug!(aggregate_type = %aggregate_type, count = ids.len(), "Listed aggregate ids");
        Ok(ids)
    }

    async fn get_events(
        &self,
        aggregate_type: &str,
        aggregate_id: Uuid,
    ) -> Result<Vec<EventEnvelope<E>>, EventStoreError> {
        let started = Instant::now();
        let path = self.log_path(aggregate_type, aggregate_id);

        let guard = self.locks.acquire(aggregate_type, aggregate_id).await;
        let contents = tokio::task::spawn_blocking(move || {
            let _guard = guard;
            read_log(&path)
        })
        .await??;

        let events = match contents {
            Some(text) if !text.is_empty() => text
                .split(self.config.event_separator.as_str())
                .map(|record| self.serializer.deserialize(record))
                .collect::<Result<Vec<_>, _>>()?,
            _ => Vec::new(),
        };

        if let Some(metrics) = &self.metrics {
            metrics.record_read(aggregate_type, events.len(), started.elapsed().as_secs_f64());
        }

        tracing::debug!(
            aggregate_type = %aggregate_type,
            aggregate_id = %aggregate_id,
            count = events.len(),
            "Loaded events from log"
        );

        Ok(events)
    }
}

/// True when `record` cannot be framed by `separator`: splitting
/// `record + separator + ...` must find its first separator right after
/// `record`. Catches a separator inside the record as well as one that
/// straddles the record's tail, e.g. `"}}"` after a JSON object.
fn breaks_framing(record: &str, separator: &str) -> bool {
    let framed = format!("{record}{separator}");
    framed.find(separator) != Some(record.len())
}

// ============================================================================
// Blocking helpers (run on the blocking pool)
// ============================================================================

fn append_record(folder: &Path, path: &Path, separator: &str, record: &str) -> Result<(), EventStoreError> {
    std::fs::create_dir_all(folder).map_err(|e| EventStoreError::io(folder, e))?;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| EventStoreError::io(path, e))?;

    let has_content = file.metadata().map_err(|e| EventStoreError::io(path, e))?.len() > 0;

    // One write per record so the separator and payload land together
    let mut chunk = String::with_capacity(separator.len() + record.len());
    if has_content {
        chunk.push_str(separator);
    }
    chunk.push_str(record);

    file.write_all(chunk.as_bytes()).map_err(|e| EventStoreError::io(path, e))?;
    file.sync_data().map_err(|e| EventStoreError::io(path, e))?;

    Ok(())
}

fn read_log(path: &Path) -> Result<Option<String>, EventStoreError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(EventStoreError::io(path, e)),
    }
}

fn list_log_ids(aggregate_type: &str, folder: &Path) -> Result<Vec<Uuid>, EventStoreError> {
    let entries = match std::fs::read_dir(folder) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(EventStoreError::io(folder, e)),
    };

    let mut ids = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| EventStoreError::io(folder, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| EventStoreError::io(&path, e))?;

        if !file_type.is_file() || path.extension().and_then(OsStr::to_str) != Some(LOG_EXTENSION) {
            continue;
        }

        let id = path
            .file_stem()
            .and_then(OsStr::to_str)
            .and_then(|stem| Uuid::parse_str(stem).ok())
            .ok_or_else(|| EventStoreError::InvalidLogName {
                aggregate_type: aggregate_type.to_string(),
                file_name: entry.file_name().to_string_lossy().into_owned(),
            })?;

        ids.push(id);
    }

    ids.sort();
    Ok(ids)
}

// ============================================================================
// Unit Tests
// ============================================================================
