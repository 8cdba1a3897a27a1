//! Per-URI exclusive scopes for mutating transitions.
//!
//! Every create, replace and delete holds the scope of each URI it touches
//! (the target plus any parent container) from its existence check until
//! its commit. Two writers on the same URI therefore never interleave, while
//! writers on unrelated URIs run in parallel.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Slot = Arc<AsyncMutex<()>>;

/// Registry of per-URI async mutexes.
///
/// # Thread Safety
///
/// The registry map sits behind a `parking_lot` mutex that is only held
/// while looking up slots, never across an `.await`. Each slot is a tokio
/// mutex so a waiting writer yields instead of blocking its worker thread.
///
/// # Lifecycle
///
/// Slots are created on first use and removed again when the last guard
/// referencing them is released.
#[derive(Debug, Default)]
pub struct UriLockManager {
    slots: Arc<Mutex<HashMap<String, Slot>>>,
}

impl UriLockManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, uri: &str) -> Slot {
        let mut slots = self.slots.lock();
        slots
            .entry(uri.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Acquire exclusive scopes on every URI in `uris`.
    ///
    /// Keys are sorted and deduplicated before locking, so two callers
    /// asking for overlapping sets cannot deadlock.
    pub async fn acquire<I, S>(&self, uris: I) -> UriLockGuard
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut keys: Vec<String> = uris.into_iter().map(|u| u.as_ref().to_string()).collect();
        keys.sort();
        keys.dedup();

        let mut guards = Vec::with_capacity(keys.len());
        for key in &keys {
            let slot = self.slot(key);
            guards.push(slot.lock_owned().await);
        }
        tracing::trace!("acquired uri scopes {:?}", keys);

        UriLockGuard {
            slots: Arc::clone(&self.slots),
            keys,
            guards,
        }
    }

    /// Number of URIs with a live slot.
    #[must_use]
    pub fn held_count(&self) -> usize {
        self.slots.lock().len()
    }
}

/// Releases its scopes on drop.
pub struct UriLockGuard {
    slots: Arc<Mutex<HashMap<String, Slot>>>,
    keys: Vec<String>,
    guards: Vec<OwnedMutexGuard<()>>,
}

impl UriLockGuard {
    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}

impl Drop for UriLockGuard {
    fn drop(&mut self) {
        self.guards.clear();
        let mut slots = self.slots.lock();
        for key in &self.keys {
            if slots.get(key).is_some_and(|slot| Arc::strong_count(slot) == 1) {
                slots.remove(key);
            }
        }
    }
}
