//! Per-key async locks.
//!
//! Serializes read-modify-write cycles on one key while leaving other keys
//! independent. Slots are created on demand and removed once nobody holds or
//! waits on them, including waiters whose `lock` future was dropped.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Debug)]
struct Slot {
    mutex: Arc<AsyncMutex<()>>,
    /// Holders plus waiters.
    users: usize,
}

#[derive(Debug)]
pub struct KeyedLocks<K> {
    slots: Mutex<HashMap<K, Slot>>,
}

impl<K: Eq + Hash + Clone> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`.
    pub async fn lock(&self, key: K) -> KeyGuard<'_, K> {
        let lease = Lease::register(self, key);
        let guard = lease.mutex.clone().lock_owned().await;
        KeyGuard {
            _guard: guard,
            _lease: lease,
        }
    }

    /// Number of keys currently held or waited on.
    pub fn active(&self) -> usize {
        self.slots.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Counts one user of a slot from registration until drop.
#[derive(Debug)]
struct Lease<'a, K: Eq + Hash + Clone> {
    locks: &'a KeyedLocks<K>,
    key: K,
    mutex: Arc<AsyncMutex<()>>,
}

impl<'a, K: Eq + Hash + Clone> Lease<'a, K> {
    fn register(locks: &'a KeyedLocks<K>, key: K) -> Self {
        let mut slots = locks.slots.lock().unwrap_or_else(|e| e.into_inner());
        let slot = slots.entry(key.clone()).or_insert_with(|| Slot {
            mutex: Arc::new(AsyncMutex::new(())),
            users: 0,
        });
        slot.users += 1;
        let mutex = slot.mutex.clone();
        Self { locks, key, mutex }
    }
}

impl<K: Eq + Hash + Clone> Drop for Lease<'_, K> {
    fn drop(&mut self) {
        let mut slots = self.locks.slots.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(slot) = slots.get_mut(&self.key) {
            slot.users -= 1;
            if slot.users == 0 {
                slots.remove(&self.key);
            }
        }
    }
}

/// Releases the key on drop.
#[derive(Debug)]
pub struct KeyGuard<'a, K: Eq + Hash + Clone> {
    // Declared first so the mutex is released before the lease is returned.
    _guard: OwnedMutexGuard<()>,
    _lease: Lease<'a, K>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio_test::assert_pending;

    #[tokio::test]
    async fn test_slot_removed_after_release() {
        let locks = KeyedLocks::new();
        {
            let _guard = locks.lock("a").await;
            assert_eq!(locks.active(), 1);
        }
        assert_eq!(locks.active(), 0);
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let locks = KeyedLocks::new();
        let _a = locks.lock("a").await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.lock("b")).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_same_key_waits_for_release() {
        let locks = Arc::new(KeyedLocks::new());
        let guard = locks.lock("a").await;

        let blocked = tokio::time::timeout(Duration::from_millis(50), locks.lock("a")).await;
        assert!(blocked.is_err());

        drop(guard);
        let acquired = tokio::time::timeout(Duration::from_millis(100), locks.lock("a")).await;
        assert!(acquired.is_ok());
    }

    #[tokio::test]
    async fn test_abandoned_waiter_releases_slot() {
        let locks = KeyedLocks::new();
        let guard = locks.lock("a").await;

        let mut waiter = tokio_test::task::spawn(locks.lock("a"));
        assert_pending!(waiter.poll());

        // The holder leaves while the waiter is queued, then the waiter gives up.
        drop(guard);
        assert_eq!(locks.active(), 1);
        drop(waiter);
        assert_eq!(locks.active(), 0);
    }

    #[tokio::test]
    async fn test_counter_has_no_lost_updates() {
        let locks = Arc::new(KeyedLocks::new());
        let counter = Arc::new(Mutex::new(0u32));

        let tasks: Vec<_> = (0..32)
            .map(|_| {
                let locks = locks.clone();
                let counter = counter.clone();
                tokio::spawn(async move {
                    let _guard = locks.lock("shared").await;
                    let current = *counter.lock().unwrap();
                    tokio::task::yield_now().await;
                    *counter.lock().unwrap() = current + 1;
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(*counter.lock().unwrap(), 32);
        assert_eq!(locks.active(), 0);
    }
}
