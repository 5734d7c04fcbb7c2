// ============================================================================
// Event Sourcing Store - Generic Persistence Layer
// ============================================================================
//
// The EventStore contract plus the file-per-aggregate reference backend.
//
// ============================================================================

pub mod event_store;
pub mod lock;
pub mod text_file_store;

pub use event_store::EventStore;
pub use lock::{LogGuard, LogLocks};
pub use text_file_store::{TextFileEventStore, LOG_EXTENSION};
