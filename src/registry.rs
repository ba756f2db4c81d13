use crate::binding::{Binding, BindingState};
use crate::entry::Entry;
use crate::error::{QueueError, Result};
use crate::lock::{LockDirector, QueueLock};
use crate::report::{self, Sizes};
use crate::store::{Fields, Store, StoreHandle};
use crate::trail::Trail;
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Max size given to the default queue before anything is assigned to it.
pub const DEFAULT_MAX_SIZE: usize = 1_000_000;

/// Registry settings.
///
/// # Examples
///
/// ```
/// use framequeue::RegistryConfig;
///
/// let config = RegistryConfig::from_json(r#"{"default_max_size": 500}"#).unwrap();
/// assert_eq!(config.default_max_size, 500);
/// assert_eq!(config.default_name, None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[non_exhaustive]
pub struct RegistryConfig {
    /// Max size of the default queue.
    pub default_max_size: usize,

    /// Name of the default queue. A random UUID when `None`.
    pub default_name: Option<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig {
            default_max_size: DEFAULT_MAX_SIZE,
            default_name: None,
        }
    }
}

impl RegistryConfig {
    /// Parse settings from JSON. Missing keys keep their defaults.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

/// Builder for a [`Registry`].
///
/// # Examples
///
/// ```
/// use framequeue::{Frame, Registry};
///
/// let registry = Registry::<Frame<String>>::builder()
///     .default_name("main")
///     .default_max_size(10)
///     .build();
/// assert_eq!(registry.default_name(), "main");
/// ```
pub struct RegistryBuilder<S> {
    config: RegistryConfig,
    _store: PhantomData<fn() -> S>,
}

impl<S: Store> RegistryBuilder<S> {
    pub fn default_max_size(mut self, max_size: usize) -> Self {
        self.config.default_max_size = max_size;
        self
    }

    pub fn default_name(mut self, name: impl Into<String>) -> Self {
        self.config.default_name = Some(name.into());
        self
    }

    /// Replace all settings at once.
    pub fn config(mut self, config: RegistryConfig) -> Self {
        self.config = config;
        self
    }

    /// Create the registry with its default queue, unbound and empty.
    pub fn build(self) -> Registry<S> {
        let default_name = self
            .config
            .default_name
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let mut director = LockDirector::new();
        let state = BindingState {
            store: None,
            max_size: self.config.default_max_size,
            trail: Trail::new(),
            lock: director.lock_for(None),
        };
        let mut bindings = HashMap::new();
        bindings.insert(
            default_name.clone(),
            Arc::new(Binding::new(&default_name, state)),
        );

        Registry {
            default_name,
            inner: RwLock::new(Inner { bindings, director }),
        }
    }
}

/// What one eviction pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eviction<K> {
    /// Entries taken off the trail, deleted or not.
    pub consumed: usize,
    /// Rows deleted from the store, in deletion order.
    pub removed: Vec<K>,
}

impl<K> Default for Eviction<K> {
    fn default() -> Self {
        Eviction {
            consumed: 0,
            removed: Vec::new(),
        }
    }
}

/// Named queues over stores of type `S`.
///
/// One registry is normally built at startup and shared behind an [`Arc`]
/// with every wrapped mutation. It always holds a default queue whose name
/// is fixed for the registry's lifetime. Queues are added by
/// [`assign`](Self::assign) and never removed.
///
/// Lock order inside the registry is: name map, then a queue's state, then
/// the store. Callers must not hold a store guard from
/// [`StoreHandle::write`] while calling into the registry for a queue bound
/// to that store.
pub struct Registry<S: Store> {
    default_name: String,
    inner: RwLock<Inner<S>>,
}

struct Inner<S: Store> {
    bindings: HashMap<String, Arc<Binding<S>>>,
    director: LockDirector,
}

impl<S: Store> Default for Registry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Store> fmt::Debug for Registry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("default_name", &self.default_name)
            .field("names", &self.names())
            .finish()
    }
}

impl<S: Store> Registry<S> {
    /// A registry with default settings.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> RegistryBuilder<S> {
        RegistryBuilder {
            config: RegistryConfig::default(),
            _store: PhantomData,
        }
    }

    /// Name of the default queue.
    pub fn default_name(&self) -> &str {
        &self.default_name
    }

    /// `name`, or the default queue's name when `None`.
    pub fn resolve<'a>(&'a self, name: Option<&'a str>) -> &'a str {
        name.unwrap_or(&self.default_name)
    }

    /// All queue names, the default one included.
    pub fn names(&self) -> BTreeSet<String> {
        self.read_inner().bindings.keys().cloned().collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read_inner().bindings.contains_key(name)
    }

    /// Bind a store to a queue and reset the queue's trail.
    ///
    /// `name` defaults to the default queue. The queue is created if it
    /// doesn't exist yet. See [`rebind`](Self::rebind).
    pub fn assign<F: AsRef<str>>(
        &self,
        store: Option<StoreHandle<S>>,
        max_size: usize,
        selected_fields: &[F],
        name: Option<&str>,
    ) -> Result<()> {
        self.rebind(self.resolve(name), store, max_size, selected_fields)
    }

    /// Replace a queue's store and max size, then rebuild its trail with one
    /// entry per current row of the new store, holding only `selected_fields`.
    ///
    /// Any previous trail is discarded. The queue's lock is recomputed: it
    /// is shared with every other queue bound to the same store, and fresh
    /// otherwise. A queue rebound to the store it already had keeps its lock.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::UnknownField`] if a selected field is not part of
    /// the store's schema. Nothing changes in that case.
    pub fn rebind<F: AsRef<str>>(
        &self,
        name: &str,
        store: Option<StoreHandle<S>>,
        max_size: usize,
        selected_fields: &[F],
    ) -> Result<()> {
        let (trail, store_rows) = match &store {
            Some(handle) => {
                let store = handle.read();
                if let Some(field) = selected_fields
                    .iter()
                    .map(AsRef::as_ref)
                    .find(|f| !store.has_field(f))
                {
                    return Err(QueueError::UnknownField {
                        field: field.to_string(),
                        item: None,
                    });
                }
                let trail: Trail<S::Key> = store
                    .keys()
                    .map(|key| Entry {
                        key: key.clone(),
                        fields: store.sample(key, selected_fields),
                    })
                    .collect();
                (trail, Some(store.row_count()))
            }
            None => (Trail::new(), None),
        };
        let store_id = store.as_ref().map(StoreHandle::id);
        let trail_len = trail.len();

        let mut guard = self.write_inner();
        let inner = &mut *guard;
        // Taken before the old reference is released so a queue rebound to
        // its own store keeps its lock.
        let lock = inner.director.lock_for(store_id);
        let state = BindingState {
            store,
            max_size,
            trail,
            lock,
        };
        match inner.bindings.get(name) {
            Some(binding) => {
                let old = std::mem::replace(&mut *binding.state(), state);
                inner.director.release(old.store.as_ref().map(StoreHandle::id));
            }
            None => {
                inner
                    .bindings
                    .insert(name.to_string(), Arc::new(Binding::new(name, state)));
            }
        }
        drop(guard);

        let sizes = Sizes {
            trail: trail_len,
            store: store_rows,
            max_size,
        };
        debug!("{}", report::assigned(name, &sizes));
        Ok(())
    }

    /// The lock guarding `name`'s store.
    pub fn lock(&self, name: &str) -> Result<QueueLock> {
        Ok(self.lookup(name)?.state().lock.clone())
    }

    /// Run `body` while holding `name`'s lock.
    ///
    /// Blocks until the lock is free. The lock is released however `body`
    /// exits, including by panic, and `body`'s result is returned unchanged.
    pub fn with_lock<T, E, F>(&self, name: &str, body: F) -> std::result::Result<T, E>
    where
        F: FnOnce() -> std::result::Result<T, E>,
        E: From<QueueError>,
    {
        let lock = self.lock(name)?;
        let _guard = lock.acquire();
        body()
    }

    /// Record produced items at the tail of `name`'s trail, in order.
    ///
    /// # Errors
    ///
    /// - [`QueueError::NotFound`] if the queue doesn't exist.
    /// - [`QueueError::UnboundStore`] if no store is assigned.
    /// - [`QueueError::UnknownField`] if any item names a field the store
    ///   doesn't have. The whole batch is rejected: nothing is recorded.
    pub fn append(&self, name: &str, items: Vec<Entry<S::Key>>) -> Result<()> {
        let binding = self.lookup(name)?;
        let mut state = binding.state();
        let handle = bound_store(name, &state)?;
        let store = handle.read();

        let schema: HashSet<String> = store.fields().into_iter().collect();
        for (index, item) in items.iter().enumerate() {
            if let Some(field) = item.fields.keys().find(|f| !schema.contains(*f)) {
                return Err(QueueError::UnknownField {
                    field: field.clone(),
                    item: Some(index),
                });
            }
        }

        for item in items {
            state.trail.push(item);
            if let Some(entry) = state.trail.get(-1) {
                let sizes = Sizes {
                    trail: state.trail.len(),
                    store: Some(store.row_count()),
                    max_size: state.max_size,
                };
                debug!("{}", report::added(name, entry, &sizes));
            }
        }
        Ok(())
    }

    /// Delete the oldest unchanged rows until the store fits `name`'s max
    /// size or the trail runs out.
    ///
    /// Each round takes `min(excess, trail length)` entries off the head of
    /// the trail as one batch; within a batch the latest entry for a key
    /// wins. A row is deleted only if it still exists and every snapshotted
    /// field still holds the snapshotted value. Entries for missing or
    /// modified rows are consumed without deleting anything.
    ///
    /// # Errors
    ///
    /// [`QueueError::NotFound`] or [`QueueError::UnboundStore`].
    pub fn evict(&self, name: &str) -> Result<Eviction<S::Key>> {
        let binding = self.lookup(name)?;
        let mut state = binding.state();
        let handle = bound_store(name, &state)?;
        let mut store = handle.write();
        let mut eviction = Eviction::default();

        loop {
            let excess = store.row_count().saturating_sub(state.max_size);
            let batch_size = excess.min(state.trail.len());
            if batch_size == 0 {
                break;
            }

            let mut batch: IndexMap<S::Key, Fields> = IndexMap::with_capacity(batch_size);
            for entry in state.trail.pop_front_n(batch_size) {
                batch.insert(entry.key, entry.fields);
            }
            eviction.consumed += batch_size;

            for (key, fields) in batch {
                if !store.matches(&key, &fields) {
                    continue;
                }
                store.remove(&key);
                let sizes = Sizes {
                    trail: state.trail.len(),
                    store: Some(store.row_count()),
                    max_size: state.max_size,
                };
                let entry = Entry {
                    key: key.clone(),
                    fields,
                };
                debug!("{}", report::removed(name, &entry, &sizes));
                eviction.removed.push(key);
            }
        }
        Ok(eviction)
    }

    /// Fail early if `name` is missing or has no store.
    pub(crate) fn ensure_bound(&self, name: &str) -> Result<()> {
        let binding = self.lookup(name)?;
        bound_store(name, &binding.state()).map(drop)
    }

    pub(crate) fn lookup(&self, name: &str) -> Result<Arc<Binding<S>>> {
        self.read_inner()
            .bindings
            .get(name)
            .cloned()
            .ok_or_else(|| QueueError::NotFound {
                name: name.to_string(),
            })
    }

    fn read_inner(&self) -> RwLockReadGuard<'_, Inner<S>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_inner(&self) -> RwLockWriteGuard<'_, Inner<S>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn bound_store<S: Store>(name: &str, state: &BindingState<S>) -> Result<StoreHandle<S>> {
    state.store.clone().ok_or_else(|| QueueError::UnboundStore {
        name: name.to_string(),
    })
}
