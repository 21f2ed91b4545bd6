//! Keyed lock manager.
//!
//! Mutual exclusion per string key: two `acquire("term:7")` calls serialize,
//! while `acquire("term:7")` and `acquire("pi")` proceed independently.
//! Waiting suspends the task instead of blocking a worker thread.
//!
//! ```text
//!   locks: { "term:7" -> Arc<Mutex<()>>, "pi" -> Arc<Mutex<()>> }
//!               |                             |
//!          KeyGuard (owned)              KeyGuard (owned)
//! ```
//!
//! Entries are created lazily and removed once no guard or waiter refers to
//! them. Locks are not re-entrant: acquiring a key you already hold from the
//! same task deadlocks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as SyncMutex, MutexGuard as SyncMutexGuard};
use leibniz_core::TermIndex;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Key guarding the pi accumulator.
pub const PI_KEY: &str = "pi";

/// Key guarding the computation of one term.
pub fn term_key(index: TermIndex) -> String {
    format!("term:{index}")
}

type LockMap = HashMap<String, Arc<Mutex<()>>>;

#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: Arc<SyncMutex<LockMap>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until `key` is free and take it. The key is released when the
    /// returned guard is dropped, on every exit path.
    pub async fn acquire(&self, key: &str) -> KeyGuard {
        let slot = self.slot(key);
        let guard = slot.lock_owned().await;
        tracing::trace!(key, "lock acquired");
        KeyGuard {
            key: key.to_string(),
            guard: Some(guard),
            locks: Arc::clone(&self.locks),
        }
    }

    /// Number of keys currently held or waited on.
    pub fn len(&self) -> usize {
        lock_map(&self.locks).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = lock_map(&self.locks);
        Arc::clone(locks.entry(key.to_string()).or_default())
    }
}

/// Held lock on one key.
pub struct KeyGuard {
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<SyncMutex<LockMap>>,
}

impl KeyGuard {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl std::fmt::Debug for KeyGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyGuard").field("key", &self.key).finish()
    }
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        // Release the mutex first so our own reference does not keep the
        // entry alive, then prune under the map lock.
        let mut locks = lock_map(&self.locks);
        self.guard.take();
        prune(&mut locks, &self.key);
        tracing::trace!(key = %self.key, "lock released");
    }
}

/// Remove `key` if the map holds the only reference to its mutex.
///
/// Runs under the map lock, and new references are only handed out under
/// that same lock, so a count of 1 cannot race with a new acquirer.
fn prune(locks: &mut LockMap, key: &str) {
    if locks
        .get(key)
        .is_some_and(|slot| Arc::strong_count(slot) == 1)
    {
        locks.remove(key);
    }
}

/// The map lock is never held across an await, and nothing in its critical
/// sections can panic, so a poisoned lock still holds a consistent map.
fn lock_map(locks: &SyncMutex<LockMap>) -> SyncMutexGuard<'_, LockMap> {
    locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
