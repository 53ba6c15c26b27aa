// src/cache/locks.rs

//! Per-item-key advisory locking.
//!
//! The existence-check / compute / persist sequence in the cache is not
//! atomic. Serializing it per item key means only one in-process caller
//! computes a missing slot at a time; the others block and then observe the
//! persisted result. Callers in other processes still race benignly
//! (atomic slot writes, last writer wins).

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex};

/// Guard holding one item key's lock until dropped.
pub type KeyGuard = ArcMutexGuard<RawMutex, ()>;

/// A set of named mutexes, created lazily per key.
///
/// Entries are never removed; the map grows to one entry per distinct item
/// key seen by this cache instance, which is bounded by the corpus size.
#[derive(Default)]
pub struct KeyLocks {
    inner: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for `key`, blocking until it is free.
    pub fn lock(&self, key: &str) -> KeyGuard {
        let lock = {
            let mut map = self.inner.lock();
            map.entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_arc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_same_key_excludes() {
        let locks = Arc::new(KeyLocks::new());
        let in_section = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = locks.clone();
                let in_section = in_section.clone();
                let max_seen = max_seen.clone();
                thread::spawn(move || {
                    let _guard = locks.lock("chair_0001");
                    let now = in_section.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(2));
                    in_section.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_different_keys_do_not_exclude() {
        let locks = KeyLocks::new();
        let _a = locks.lock("chair_0001");
        // Acquiring a different key while holding the first must not block.
        let _b = locks.lock("bed_0002");
    }

    #[test]
    fn test_lock_reusable_after_drop() {
        let locks = KeyLocks::new();
        drop(locks.lock("key"));
        drop(locks.lock("key"));
    }
}
