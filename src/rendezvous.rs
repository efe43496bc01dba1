//! Rendezvous registry for the wait/release demonstration pattern.
//!
//! # Responsibilities
//! - Map a positive integer id to the transaction parked by `/wait`
//! - Complete that transaction when a matching `/release` arrives
//! - Remove entries on release and on handler teardown, under one lock
//!
//! A `/wait` and its `/release` may arrive on different connections and
//! therefore run on different tasks; this map is the only resource in the
//! core that is routinely shared across them. Critical sections are O(1)
//! and never block on I/O: completing a waiter is an unbounded-channel
//! enqueue, its driver does the actual write.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};

use crate::session::Transaction;

/// Generation stamp so teardown cleanup can never erase a successor entry
/// registered under the same id after this waiter was released.
static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

struct Waiter {
    token: u64,
    txn: Transaction,
}

impl Waiter {
    /// Emit the parked transaction's completion: final body plus
    /// end-of-message. Its "waiting" head went out at registration time.
    fn release(self) {
        self.txn.send_body("released\n");
        self.txn.send_eom();
    }
}

/// Process-wide table coordinating `/wait` and `/release` requests.
pub struct RendezvousRegistry {
    waiters: Mutex<HashMap<u64, Waiter>>,
}

impl RendezvousRegistry {
    pub fn new() -> Self {
        Self {
            waiters: Mutex::new(HashMap::new()),
        }
    }

    /// The shared instance used by all connections.
    pub fn global() -> &'static RendezvousRegistry {
        static GLOBAL: OnceLock<RendezvousRegistry> = OnceLock::new();
        GLOBAL.get_or_init(RendezvousRegistry::new)
    }

    /// Park `txn` under `id`. Fails when the id is already taken; the
    /// original waiter is never replaced.
    pub fn register(&self, id: u64, txn: Transaction) -> Result<u64, IdInUse> {
        let mut waiters = self.lock();
        if waiters.contains_key(&id) {
            return Err(IdInUse);
        }
        let token = NEXT_TOKEN.fetch_add(1, Ordering::Relaxed);
        waiters.insert(id, Waiter { token, txn });
        tracing::debug!(id, token, "rendezvous waiter registered");
        Ok(token)
    }

    /// Complete and remove the waiter for `id`. Returns false when no such
    /// entry exists; no other entry is touched.
    pub fn release(&self, id: u64) -> bool {
        let waiter = self.lock().remove(&id);
        match waiter {
            Some(waiter) => {
                tracing::debug!(id, "rendezvous waiter released");
                waiter.release();
                true
            }
            None => false,
        }
    }

    /// Teardown path: remove the entry for `id` only if it still belongs to
    /// the handler identified by `token`. Called when a waiting handler is
    /// destroyed without having been released (peer gone, idle timeout).
    pub fn cleanup(&self, id: u64, token: u64) {
        let mut waiters = self.lock();
        if waiters.get(&id).is_some_and(|w| w.token == token) {
            waiters.remove(&id);
            tracing::debug!(id, token, "rendezvous waiter cleaned up on teardown");
        }
    }

    /// Whether an entry exists for `id`.
    pub fn contains(&self, id: u64) -> bool {
        self.lock().contains_key(&id)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u64, Waiter>> {
        self.waiters.lock().expect("rendezvous registry mutex poisoned")
    }
}

impl Default for RendezvousRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Registration conflict: an entry for the id already exists.
#[derive(Debug, PartialEq, Eq)]
pub struct IdInUse;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Frame;

    #[test]
    fn duplicate_registration_keeps_original_waiter() {
        let registry = RendezvousRegistry::new();
        let (first, mut first_rx) = Transaction::channel();
        let (second, _second_rx) = Transaction::channel();

        registry.register(9, first).unwrap();
        assert_eq!(registry.register(9, second), Err(IdInUse));

        assert!(registry.release(9));
        assert!(matches!(first_rx.try_recv().unwrap(), Frame::Body(_)));
        assert!(matches!(first_rx.try_recv().unwrap(), Frame::Eom));
        assert!(!registry.contains(9));
    }

    #[test]
    fn release_of_unknown_id_is_a_no_op() {
        let registry = RendezvousRegistry::new();
        let (txn, _rx) = Transaction::channel();
        registry.register(3, txn).unwrap();

        assert!(!registry.release(4));
        assert!(registry.contains(3));
    }

    #[test]
    fn stale_cleanup_does_not_erase_a_successor() {
        let registry = RendezvousRegistry::new();
        let (first, _first_rx) = Transaction::channel();
        let stale_token = registry.register(5, first).unwrap();
        assert!(registry.release(5));

        // Same id reused by a new waiter before the old handler is dropped.
        let (second, _second_rx) = Transaction::channel();
        registry.register(5, second).unwrap();

        registry.cleanup(5, stale_token);
        assert!(registry.contains(5));
    }

    #[test]
    fn cleanup_with_matching_token_removes_entry() {
        let registry = RendezvousRegistry::new();
        let (txn, _rx) = Transaction::channel();
        let token = registry.register(6, txn).unwrap();

        registry.cleanup(6, token);
        assert!(!registry.contains(6));
        assert!(!registry.release(6));
    }
}
