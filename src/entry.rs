use crate::error::{QueueError, Result};
use crate::store::Fields;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// One trail record: a row key and the cells it held when it was written.
///
/// Transforms produce entries from the result of a wrapped mutation; the
/// append step then records them as-is. Entries are never modified once
/// built. Several entries may share a key, one per recorded write.
///
/// # Examples
///
/// ```
/// use framequeue::Entry;
/// use serde_json::json;
///
/// let entry = Entry::new("1", [("B", json!(2.0)), ("D", json!(4.0))]);
/// assert_eq!(entry.key, "1");
/// assert_eq!(entry.fields["D"], json!(4.0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry<K> {
    /// Label of the row in the store.
    pub key: K,

    /// Snapshot of the selected cells. An empty snapshot matches any row
    /// that still exists.
    pub fields: Fields,
}

impl<K> Entry<K> {
    pub fn new<I, C>(key: K, fields: I) -> Self
    where
        I: IntoIterator<Item = (C, Value)>,
        C: Into<String>,
    {
        Entry {
            key,
            fields: fields.into_iter().map(|(c, v)| (c.into(), v)).collect(),
        }
    }
}

impl<K: DeserializeOwned> Entry<K> {
    /// Decode one produced item written as JSON `[key, {field: value, ...}]`.
    ///
    /// `index` is the item's position in its batch and only appears in the
    /// error.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::MalformedItem`] when the value isn't a two-element
    /// array, the second element isn't an object, or the key doesn't decode
    /// into `K`.
    pub fn from_value(index: usize, value: Value) -> Result<Self> {
        let malformed = |reason: String| QueueError::MalformedItem { index, reason };

        let Value::Array(pair) = value else {
            return Err(malformed("the item must be a [key, fields] array".into()));
        };
        let Ok([key, fields]) = <[Value; 2]>::try_from(pair) else {
            return Err(malformed("the item must have exactly 2 elements".into()));
        };
        let Value::Object(fields) = fields else {
            return Err(malformed("the second element must be an object".into()));
        };
        let key = serde_json::from_value(key).map_err(|e| malformed(format!("bad key: {e}")))?;

        Ok(Entry {
            key,
            fields: fields.into_iter().collect(),
        })
    }

    /// Decode a JSON array of produced items. See [`Entry::from_value`].
    pub fn decode_all(items: Value) -> Result<Vec<Self>> {
        let Value::Array(items) = items else {
            return Err(QueueError::MalformedItem {
                index: 0,
                reason: "items must be contained in an array".into(),
            });
        };
        items
            .into_iter()
            .enumerate()
            .map(|(i, item)| Entry::from_value(i, item))
            .collect()
    }
}

impl<K: fmt::Debug> fmt::Display for Entry<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = serde_json::to_string(&self.fields).map_err(|_| fmt::Error)?;
        write!(f, "({:?}, {fields})", self.key)
    }
}
