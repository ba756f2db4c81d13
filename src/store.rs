//! The table contract the queues evict from, and the shared handle used to
//! bind a table to a queue.

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A partial copy of a row: field name to cell value.
pub type Fields = BTreeMap<String, Value>;

/// A mutable, key-addressable table.
///
/// The queues never interpret cell values beyond equality, so any table
/// that can answer these questions can be bounded. [`Frame`](crate::Frame)
/// is a ready-made in-memory implementation.
pub trait Store {
    /// Row label type.
    type Key: Clone + Eq + Hash + fmt::Debug;

    /// The table's schema, in column order.
    fn fields(&self) -> Vec<String>;

    /// Number of rows currently held.
    fn row_count(&self) -> usize;

    /// Whether a row with this key exists.
    fn contains(&self, key: &Self::Key) -> bool;

    /// The value of one cell, or `None` if the row or the cell is missing.
    fn cell(&self, key: &Self::Key, field: &str) -> Option<&Value>;

    /// Delete a row. Returns `false` if it wasn't there.
    fn remove(&mut self, key: &Self::Key) -> bool;

    /// Row keys in row order.
    fn keys(&self) -> impl Iterator<Item = &Self::Key> + '_;

    /// Whether `field` is part of the schema.
    fn has_field(&self, field: &str) -> bool {
        self.fields().iter().any(|f| f == field)
    }

    /// Copy the selected cells of one row. Cells the row doesn't have are
    /// left out.
    fn sample<F: AsRef<str>>(&self, key: &Self::Key, fields: &[F]) -> Fields {
        fields
            .iter()
            .filter_map(|f| {
                let f = f.as_ref();
                self.cell(key, f).map(|v| (f.to_string(), v.clone()))
            })
            .collect()
    }

    /// Whether the row exists and every snapshotted field still holds the
    /// snapshotted value.
    fn matches(&self, key: &Self::Key, snapshot: &Fields) -> bool {
        self.contains(key)
            && snapshot
                .iter()
                .all(|(field, value)| self.cell(key, field) == Some(value))
    }
}

/// Identity of a store allocation.
///
/// Two handles have the same id exactly when they share the same table.
/// Contents play no part: two tables with equal rows have different ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreId(usize);

/// Shared ownership of a [`Store`].
///
/// Cloning a handle does not copy the table. Queues bound to clones of the
/// same handle evict from the same table and share one [`QueueLock`](crate::QueueLock).
pub struct StoreHandle<S> {
    inner: Arc<RwLock<S>>,
}

impl<S> StoreHandle<S> {
    pub fn new(store: S) -> Self {
        StoreHandle {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    /// Stable identity of the underlying table. Valid for as long as any
    /// handle to it is alive.
    pub fn id(&self) -> StoreId {
        StoreId(Arc::as_ptr(&self.inner) as *const () as usize)
    }

    /// Identity comparison.
    pub fn same_store(&self, other: &StoreHandle<S>) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Shared read access.
    ///
    /// A poisoned table is still handed out; the panic that poisoned it has
    /// already been reported to whoever triggered it.
    pub fn read(&self) -> RwLockReadGuard<'_, S> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Exclusive write access.
    pub fn write(&self) -> RwLockWriteGuard<'_, S> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S> Clone for StoreHandle<S> {
    fn clone(&self) -> Self {
        StoreHandle {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> fmt::Debug for StoreHandle<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreHandle").field("id", &self.id()).finish()
    }
}
