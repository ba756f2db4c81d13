use crate::lock::QueueLock;
use crate::store::{Store, StoreHandle};
use crate::trail::Trail;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A named queue: one store, its size bound, its trail and its lock.
///
/// Bindings live as long as the registry that named them. Rebinding swaps
/// the state in place, so every holder of the binding sees the new store.
pub(crate) struct Binding<S: Store> {
    name: String,
    state: Mutex<BindingState<S>>,
}

pub(crate) struct BindingState<S: Store> {
    /// `None` leaves the queue inert: appends and evictions refuse to run.
    pub store: Option<StoreHandle<S>>,
    /// Bound on the store's row count, not on the trail's length.
    pub max_size: usize,
    pub trail: Trail<S::Key>,
    pub lock: QueueLock,
}

impl<S: Store> Binding<S> {
    pub fn new(name: &str, state: BindingState<S>) -> Self {
        Binding {
            name: name.to_string(),
            state: Mutex::new(state),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> MutexGuard<'_, BindingState<S>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
