//! In-memory set of UIDs allowed through the gateway.
//!
//! Readers clone the current `Arc` snapshot under a read lock that is held
//! only for the pointer copy. Writers build the next snapshot on the side and
//! swap it in, so a reader sees either the old set or the new one, never a
//! partial update. Writers are serialized by `generation` so concurrent
//! add/remove calls do not lose each other's changes.
//!
//! Every write is applied before the call returns: the next `contains`
//! issued afterwards (from any task) observes it.
//!
//! The generation counter is bumped by every write that changes the set.
//! A caller that computes a replacement set slowly (an identity service
//! pull) reads the generation first and applies its result with
//! [`AuthzStore::sync_if_unchanged`], so it cannot undo a write that
//! landed in the meantime.
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

type Snapshot = Arc<HashSet<String>>;

#[derive(Debug, Default)]
pub struct AuthzStore {
    current: RwLock<Snapshot>,
    // Write gate; the value counts applied writes.
    generation: Mutex<u64>,
}

impl AuthzStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users<I, S>(users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            current: RwLock::new(Arc::new(users.into_iter().map(Into::into).collect())),
            generation: Mutex::new(0),
        }
    }

    /// Current immutable view of the set.
    pub fn snapshot(&self) -> Snapshot {
        // A poisoned lock still guards a valid Arc; the swap is a single store.
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn contains(&self, uid: &str) -> bool {
        self.snapshot().contains(uid)
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    pub fn generation(&self) -> u64 {
        *self.gate()
    }

    /// Returns `true` if the UID was not present before.
    pub fn add(&self, uid: impl Into<String>) -> bool {
        let uid = uid.into();
        self.update(|set| set.insert(uid))
    }

    /// Returns `true` if the UID was present.
    pub fn remove(&self, uid: &str) -> bool {
        self.update(|set| set.remove(uid))
    }

    /// Replaces the whole set in one step.
    pub fn sync<I, S>(&self, users: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let next: HashSet<String> = users.into_iter().map(Into::into).collect();
        let mut generation = self.gate();
        self.swap(Arc::new(next));
        *generation += 1;
    }

    /// Replaces the whole set only if no write happened since `expected`
    /// was read from [`AuthzStore::generation`]. Returns `false` and leaves
    /// the set untouched otherwise.
    pub fn sync_if_unchanged<I, S>(&self, expected: u64, users: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let next: HashSet<String> = users.into_iter().map(Into::into).collect();
        let mut generation = self.gate();
        if *generation != expected {
            return false;
        }
        self.swap(Arc::new(next));
        *generation += 1;
        true
    }

    fn update<F>(&self, apply: F) -> bool
    where
        F: FnOnce(&mut HashSet<String>) -> bool,
    {
        let mut generation = self.gate();

        let mut next = HashSet::clone(&self.snapshot());
        let changed = apply(&mut next);
        if changed {
            self.swap(Arc::new(next));
            *generation += 1;
        }
        changed
    }

    fn gate(&self) -> MutexGuard<'_, u64> {
        self.generation.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn swap(&self, next: Snapshot) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = next;
    }
}
