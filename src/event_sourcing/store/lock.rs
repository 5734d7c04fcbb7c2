use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

// ============================================================================
// Per-Log Locks
// ============================================================================
//
// One async mutex per (aggregate type, aggregate id). Holding the guard is
// the exclusive hold on that aggregate's log: appends to the same log queue
// behind each other, appends to different logs never contend.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct LogKey {
    aggregate_type: String,
    aggregate_id: Uuid,
}

#[derive(Debug, Default)]
pub struct LogLocks {
    locks: Mutex<HashMap<LogKey, Arc<AsyncMutex<()>>>>,
}

/// Exclusive hold on one log, released on drop.
#[derive(Debug)]
pub struct LogGuard {
    _guard: OwnedMutexGuard<()>,
}

impl LogLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, aggregate_type: &str, aggregate_id: Uuid) -> LogGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);

            // Only the map references an idle lock; nobody holds or awaits it.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);

            locks
                .entry(LogKey {
                    aggregate_type: aggregate_type.to_string(),
                    aggregate_id,
                })
                .or_default()
                .clone()
        };

        LogGuard {
            _guard: lock.lock_owned().await,
        }
    }

    /// Number of logs currently held or awaited.
    pub fn active(&self) -> usize {
        let locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.values().filter(|lock| Arc::strong_count(lock) > 1).count()
    }
}
