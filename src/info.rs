use crate::binding::Binding;
use crate::entry::Entry;
use crate::error::{QueueError, Result};
use crate::registry::Registry;
use crate::store::{Store, StoreHandle};
use serde_json::{Value, json};
use std::fmt;
use std::ops::RangeBounds;
use std::sync::Arc;

/// Read-only view of one queue.
///
/// The view follows the queue: if the queue is assigned another store after
/// the view was created, the view reports the new store, max size and trail.
///
/// # Examples
///
/// ```
/// use framequeue::{Frame, Registry, StoreHandle};
/// use serde_json::json;
///
/// let registry = Registry::new();
/// let mut frame = Frame::new(["A", "B"]);
/// frame.insert("a1".to_string(), [("A", json!(1)), ("B", json!(2))]).unwrap();
/// frame.insert("a2".to_string(), [("A", json!(3)), ("B", json!(4))]).unwrap();
/// let store = StoreHandle::new(frame);
/// registry.assign(Some(store.clone()), 4, &["A"], Some("q")).unwrap();
///
/// let info = registry.info(Some("q")).unwrap();
/// assert_eq!(info.max_size(), 4);
/// assert!(!info.is_default());
/// assert_eq!(info.entry(-1).unwrap().key, "a2");
/// assert!(info.store().unwrap().same_store(&store));
/// ```
pub struct QueueInfo<S: Store> {
    binding: Arc<Binding<S>>,
    is_default: bool,
}

impl<S: Store> Registry<S> {
    /// Open a read-only view of `name`, or of the default queue when `None`.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::NotFound`] if the queue doesn't exist.
    pub fn info(&self, name: Option<&str>) -> Result<QueueInfo<S>> {
        let name = self.resolve(name);
        Ok(QueueInfo {
            binding: self.lookup(name)?,
            is_default: name == self.default_name(),
        })
    }
}

impl<S: Store> QueueInfo<S> {
    pub fn name(&self) -> &str {
        self.binding.name()
    }

    pub fn is_default(&self) -> bool {
        self.is_default
    }

    /// The assigned store itself, not a copy.
    pub fn store(&self) -> Option<StoreHandle<S>> {
        self.binding.state().store.clone()
    }

    pub fn max_size(&self) -> usize {
        self.binding.state().max_size
    }

    /// Number of entries waiting in the trail.
    pub fn len(&self) -> usize {
        self.binding.state().trail.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The trail entry at `index`, counting back from the tail when negative.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::IndexOutOfRange`] when there is no such entry.
    pub fn entry(&self, index: isize) -> Result<Entry<S::Key>> {
        let state = self.binding.state();
        state
            .trail
            .get(index)
            .cloned()
            .ok_or(QueueError::IndexOutOfRange {
                index,
                len: state.trail.len(),
            })
    }

    /// Trail entries in `range`. Negative bounds count back from the tail;
    /// out-of-range bounds are clamped.
    pub fn slice<R: RangeBounds<isize>>(&self, range: R) -> Vec<Entry<S::Key>> {
        self.binding
            .state()
            .trail
            .slice(range)
            .into_iter()
            .cloned()
            .collect()
    }

    /// A copy of the whole trail, oldest first.
    pub fn entries(&self) -> Vec<Entry<S::Key>> {
        self.binding.state().trail.iter().cloned().collect()
    }

    /// Look up a scalar attribute by name: `name`, `is_default`, `max_size`
    /// or `len`.
    pub fn attribute(&self, attribute: &str) -> Option<Value> {
        match attribute {
            "name" => Some(json!(self.name())),
            "is_default" => Some(json!(self.is_default)),
            "max_size" => Some(json!(self.max_size())),
            "len" => Some(json!(self.len())),
            _ => None,
        }
    }

    /// Always fails: the view cannot change the queue.
    pub fn set_attribute(&self, attribute: &str, _value: Value) -> Result<()> {
        Err(QueueError::ReadOnly {
            attribute: attribute.to_string(),
        })
    }
}

impl<S: Store> fmt::Debug for QueueInfo<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.binding.state();
        f.debug_struct("QueueInfo")
            .field("name", &self.binding.name())
            .field("is_default", &self.is_default)
            .field("store", &state.store)
            .field("max_size", &state.max_size)
            .field("len", &state.trail.len())
            .finish()
    }
}
