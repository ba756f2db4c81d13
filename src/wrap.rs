//! Combinators that bound a store by wrapping the functions that write to it.
//!
//! Each combinator takes a function `Fn(A) -> Result<R, E>` and returns a
//! function of the same shape. The queue's own failures reach the caller
//! through `E: From<QueueError>`; errors from the wrapped function are
//! returned untouched, and nothing is recorded or evicted when it fails.
//!
//! The usual composition, innermost first, is append, then eviction, then
//! the lock:
//!
//! ```
//! use std::sync::Arc;
//! use framequeue::{wrap, Entry, Frame, QueueError, Registry, StoreHandle};
//! use serde_json::{json, Value};
//!
//! let registry: Arc<Registry<Frame<String>>> = Arc::new(Registry::new());
//! let store = StoreHandle::new(Frame::new(["A", "B"]));
//! registry.assign(Some(store.clone()), 2, &["B"], Some("q")).unwrap();
//!
//! let writer = store.clone();
//! let add_row = wrap::with_lock(
//!     &registry,
//!     Some("q"),
//!     wrap::with_eviction(
//!         &registry,
//!         Some("q"),
//!         wrap::with_append(
//!             &registry,
//!             Some("q"),
//!             |row: &(String, Value, Value), _: &()| {
//!                 Ok(vec![Entry::new(row.0.clone(), [("B", row.2.clone())])])
//!             },
//!             (),
//!             move |row: (String, Value, Value)| -> Result<_, QueueError> {
//!                 writer
//!                     .write()
//!                     .insert(row.0.clone(), [("A", row.1.clone()), ("B", row.2.clone())])?;
//!                 Ok(row)
//!             },
//!         ),
//!     ),
//! );
//!
//! for i in 0..5 {
//!     add_row((i.to_string(), json!(i), json!(i * 10))).unwrap();
//! }
//! assert_eq!(store.read().len(), 2);
//! ```

use crate::entry::Entry;
use crate::error::QueueError;
use crate::registry::Registry;
use crate::store::Store;
use std::sync::Arc;

/// Record what a mutation wrote.
///
/// After `f` succeeds, `transform` turns its result (with `args`, passed on
/// every call) into entries, which are appended to the queue's trail. The
/// queue must exist and have a store before `f` is called; otherwise `f`
/// is not run at all.
pub fn with_append<S, A, R, E, X, F, T>(
    registry: &Arc<Registry<S>>,
    name: Option<&str>,
    transform: T,
    args: X,
    f: F,
) -> impl Fn(A) -> Result<R, E> + use<S, A, R, E, X, F, T>
where
    S: Store,
    F: Fn(A) -> Result<R, E>,
    T: Fn(&R, &X) -> crate::Result<Vec<Entry<S::Key>>>,
    E: From<QueueError>,
{
    let registry = Arc::clone(registry);
    let name = registry.resolve(name).to_string();
    move |input| {
        registry.ensure_bound(&name)?;
        let result = f(input)?;
        let items = transform(&result, &args)?;
        registry.append(&name, items)?;
        Ok(result)
    }
}

/// Evict once `f` succeeds, bringing the store back under the queue's max
/// size as far as the trail allows.
pub fn with_eviction<S, A, R, E, F>(
    registry: &Arc<Registry<S>>,
    name: Option<&str>,
    f: F,
) -> impl Fn(A) -> Result<R, E> + use<S, A, R, E, F>
where
    S: Store,
    F: Fn(A) -> Result<R, E>,
    E: From<QueueError>,
{
    let registry = Arc::clone(registry);
    let name = registry.resolve(name).to_string();
    move |input| {
        registry.ensure_bound(&name)?;
        let result = f(input)?;
        registry.evict(&name)?;
        Ok(result)
    }
}

/// Run `f` while holding the queue's lock. See [`Registry::with_lock`].
pub fn with_lock<S, A, R, E, F>(
    registry: &Arc<Registry<S>>,
    name: Option<&str>,
    f: F,
) -> impl Fn(A) -> Result<R, E> + use<S, A, R, E, F>
where
    S: Store,
    F: Fn(A) -> Result<R, E>,
    E: From<QueueError>,
{
    let registry = Arc::clone(registry);
    let name = registry.resolve(name).to_string();
    move |input| registry.with_lock(&name, || f(input))
}

/// Transform for functions that already return their entries.
#[allow(clippy::ptr_arg)]
pub fn identity<K: Clone, X>(result: &Vec<Entry<K>>, _args: &X) -> crate::Result<Vec<Entry<K>>> {
    Ok(result.clone())
}
