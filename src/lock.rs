//! Mutual exclusion shared by every queue bound to the same store.

use crate::store::StoreId;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};

/// A lock handle. Clones refer to the same lock.
///
/// The queues never take this lock on their own; callers opt in with
/// [`Registry::with_lock`](crate::Registry::with_lock) or
/// [`wrap::with_lock`](crate::wrap::with_lock). Bounded size is only
/// guaranteed when every writer of a store goes through it.
#[derive(Clone, Default)]
pub struct QueueLock {
    inner: Arc<Mutex<()>>,
}

/// Held lock. Released on drop, whichever way the scope is left.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct QueueGuard<'a> {
    _guard: MutexGuard<'a, ()>,
}

impl QueueLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until the lock is free, then take it. There is no timeout.
    pub fn acquire(&self) -> QueueGuard<'_> {
        QueueGuard {
            _guard: self.inner.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }

    /// Take the lock if nobody holds it.
    pub fn try_acquire(&self) -> Option<QueueGuard<'_>> {
        match self.inner.try_lock() {
            Ok(guard) => Some(QueueGuard { _guard: guard }),
            Err(TryLockError::Poisoned(e)) => Some(QueueGuard {
                _guard: e.into_inner(),
            }),
            Err(TryLockError::WouldBlock) => None,
        }
    }

    /// Whether both handles refer to the same lock.
    pub fn same_lock(&self, other: &QueueLock) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for QueueLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueLock")
            .field("id", &Arc::as_ptr(&self.inner))
            .finish()
    }
}

/// Hands out one lock per store identity.
///
/// Each live binding to a store holds one reference in the director. The
/// lock is forgotten once the last binding is moved to another store, so a
/// later binding to that store starts with a fresh lock.
#[derive(Debug, Default)]
pub struct LockDirector {
    by_store: HashMap<StoreId, Shared>,
}

#[derive(Debug)]
struct Shared {
    lock: QueueLock,
    bindings: usize,
}

impl LockDirector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one more binding to `store` and return the lock it must use.
    ///
    /// Bindings without a store never share: each gets its own lock.
    pub fn lock_for(&mut self, store: Option<StoreId>) -> QueueLock {
        let Some(id) = store else {
            return QueueLock::new();
        };
        let shared = self.by_store.entry(id).or_insert_with(|| Shared {
            lock: QueueLock::new(),
            bindings: 0,
        });
        shared.bindings += 1;
        shared.lock.clone()
    }

    /// Drop one binding's reference to `store`'s lock.
    pub fn release(&mut self, store: Option<StoreId>) {
        let Some(id) = store else { return };
        if let Some(shared) = self.by_store.get_mut(&id) {
            shared.bindings -= 1;
            if shared.bindings == 0 {
                self.by_store.remove(&id);
            }
        }
    }

    /// Number of bindings currently sharing `store`'s lock.
    pub fn bindings_for(&self, store: StoreId) -> usize {
        self.by_store.get(&store).map_or(0, |s| s.bindings)
    }
}
