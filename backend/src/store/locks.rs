//! Per-key mutual exclusion.
//!
//! A `KeyLocks` registry hands out one guard per key at a time. Callers for
//! different keys only share the registry's own short critical section; a
//! caller for a key that is already held waits until its guard is dropped.

use parking_lot::{Condvar, Mutex};
use std::collections::HashSet;
use std::hash::Hash;

pub struct KeyLocks<K> {
    held: Mutex<HashSet<K>>,
    released: Condvar,
}

impl<K: Eq + Hash + Clone> KeyLocks<K> {
    pub fn new() -> Self {
        Self {
            held: Mutex::new(HashSet::new()),
            released: Condvar::new(),
        }
    }

    /// Blocks until `key` is free, then holds it until the guard is dropped.
    pub fn lock(&self, key: K) -> KeyGuard<'_, K> {
        let mut held = self.held.lock();
        while held.contains(&key) {
            self.released.wait(&mut held);
        }
        held.insert(key.clone());
        KeyGuard { locks: self, key }
    }

    #[cfg(test)]
    pub fn is_held(&self, key: &K) -> bool {
        self.held.lock().contains(key)
    }
}

pub struct KeyGuard<'a, K: Eq + Hash> {
    locks: &'a KeyLocks<K>,
    key: K,
}

impl<K: Eq + Hash> Drop for KeyGuard<'_, K> {
    fn drop(&mut self) {
        let mut held = self.locks.held.lock();
        held.remove(&self.key);
        // Waiters for other keys wake up too and go back to sleep.
        self.locks.released.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn guard_releases_on_drop() {
        let locks = KeyLocks::new();
        {
            let _guard = locks.lock("a");
            assert!(locks.is_held(&"a"));
        }
        assert!(!locks.is_held(&"a"));
    }

    #[test]
    fn different_keys_do_not_wait_on_each_other() {
        let locks = KeyLocks::new();
        let _a = locks.lock("a");
        // Would deadlock if keys shared one lock.
        let _b = locks.lock("b");
        assert!(locks.is_held(&"a") && locks.is_held(&"b"));
    }

    #[test]
    fn same_key_is_exclusive() {
        let locks = Arc::new(KeyLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let max_inside = Arc::clone(&max_inside);
                thread::spawn(move || {
                    let _guard = locks.lock("pair");
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_inside.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(5));
                    inside.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    }
}
