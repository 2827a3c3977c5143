//! Per-key exclusive locks with a bounded wait.
//!
//! Each key gets its own `Mutex<bool>` + `Condvar` slot, created lazily on
//! first use and evicted once no holder or waiter references it. Holders of
//! different keys never contend; the table mutex is only held long enough to
//! look up, insert or evict a slot.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::trace;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LockError {
    #[error("timed out after {waited_ms}ms waiting for lock on {key}")]
    Timeout { key: String, waited_ms: u64 },

    #[error("lock poisoned: {0}")]
    Poisoned(String),
}

#[derive(Debug, Default)]
struct Slot {
    held: Mutex<bool>,
    released: Condvar,
}

type SlotTable<K> = Arc<Mutex<HashMap<K, Arc<Slot>>>>;

/// Keyed mutual exclusion.
#[derive(Debug)]
pub struct KeyedLocks<K> {
    slots: SlotTable<K>,
    timeout: Duration,
}

/// Exclusive hold on one key. Dropping it releases the key, wakes one waiter
/// and evicts the slot when nobody else is waiting on it.
#[derive(Debug)]
pub struct KeyGuard<K: Eq + Hash + core::fmt::Display> {
    key: K,
    slot: Option<Arc<Slot>>,
    table: SlotTable<K>,
}

impl<K> KeyedLocks<K>
where
    K: Eq + Hash + Clone + core::fmt::Display,
{
    pub fn new(timeout: Duration) -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Number of keys currently held or waited on.
    pub fn tracked_keys(&self) -> usize {
        self.slots.lock().map(|slots| slots.len()).unwrap_or(0)
    }

    /// Block until `key` is free or the configured timeout elapses.
    pub fn acquire(&self, key: &K) -> Result<KeyGuard<K>, LockError> {
        let slot = self.slot(key)?;
        match wait_for(&slot, self.timeout) {
            Ok(true) => {}
            Ok(false) => {
                drop(slot);
                evict_if_unused(&self.slots, key);
                return Err(LockError::Timeout {
                    key: key.to_string(),
                    waited_ms: self.timeout.as_millis() as u64,
                });
            }
            Err(err) => {
                drop(slot);
                evict_if_unused(&self.slots, key);
                return Err(err);
            }
        }

        trace!(key = %key, "aggregate lock acquired");
        Ok(self.guard(key, slot))
    }

    /// Take the lock only if it is free right now.
    pub fn try_acquire(&self, key: &K) -> Result<Option<KeyGuard<K>>, LockError> {
        let slot = self.slot(key)?;
        let taken = {
            let mut held = slot
                .held
                .lock()
                .map_err(|e| LockError::Poisoned(e.to_string()))?;
            !std::mem::replace(&mut *held, true)
        };
        if !taken {
            drop(slot);
            evict_if_unused(&self.slots, key);
            return Ok(None);
        }
        Ok(Some(self.guard(key, slot)))
    }

    fn guard(&self, key: &K, slot: Arc<Slot>) -> KeyGuard<K> {
        KeyGuard {
            key: key.clone(),
            slot: Some(slot),
            table: Arc::clone(&self.slots),
        }
    }

    fn slot(&self, key: &K) -> Result<Arc<Slot>, LockError> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| LockError::Poisoned("lock table poisoned".into()))?;
        Ok(slots.entry(key.clone()).or_default().clone())
    }
}

/// Wait until the slot is free and mark it held. `Ok(false)` on timeout.
fn wait_for(slot: &Slot, timeout: Duration) -> Result<bool, LockError> {
    let deadline = Instant::now() + timeout;
    let mut held = slot
        .held
        .lock()
        .map_err(|e| LockError::Poisoned(e.to_string()))?;
    while *held {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Ok(false);
        }
        let (guard, _) = slot
            .released
            .wait_timeout(held, remaining)
            .map_err(|e| LockError::Poisoned(e.to_string()))?;
        held = guard;
    }
    *held = true;
    Ok(true)
}

/// Drop the table entry for `key` once the table holds its only reference.
///
/// Callers release their own reference first. Slot references are only
/// cloned under the table mutex, so whichever caller checks last sees a
/// count of one.
fn evict_if_unused<K: Eq + Hash>(table: &Mutex<HashMap<K, Arc<Slot>>>, key: &K) {
    let mut slots = table.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if slots.get(key).is_some_and(|slot| Arc::strong_count(slot) == 1) {
        slots.remove(key);
    }
}

impl<K: Eq + Hash + core::fmt::Display> KeyGuard<K> {
    pub fn key(&self) -> &K {
        &self.key
    }
}

impl<K: Eq + Hash + core::fmt::Display> Drop for KeyGuard<K> {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            let mut held = slot.held.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            *held = false;
            drop(held);
            slot.released.notify_one();
        }
        evict_if_unused(&self.table, &self.key);
        trace!(key = %self.key, "aggregate lock released");
    }
}
