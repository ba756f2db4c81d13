use crate::error::{QueueError, Result};
use crate::store::{Fields, Store};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::hash::Hash;

/// An in-memory table with a fixed column schema.
///
/// Rows keep insertion order. Writing to an existing key replaces the row in
/// place without moving it. Cells that a write doesn't mention are `null`.
///
/// # Examples
///
/// ```
/// use framequeue::Frame;
/// use serde_json::json;
///
/// let mut frame = Frame::new(["A", "B"]);
/// frame.insert("r1", [("A", json!(1.0)), ("B", json!(2.0))]).unwrap();
/// assert_eq!(frame.len(), 1);
/// assert_eq!(frame.get(&"r1").unwrap()["B"], json!(2.0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame<K: Hash + Eq> {
    columns: Vec<String>,
    rows: IndexMap<K, Vec<Value>>,
}

impl<K> Frame<K>
where
    K: Clone + Eq + Hash + fmt::Debug,
{
    /// Create an empty frame with the given columns.
    pub fn new<I, C>(columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        Frame {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: IndexMap::new(),
        }
    }

    /// Write a whole row, replacing any row already stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::UnknownField`] if a cell names a column the frame
    /// doesn't have. The frame is left untouched in that case.
    pub fn insert<I, C>(&mut self, key: K, cells: I) -> Result<()>
    where
        I: IntoIterator<Item = (C, Value)>,
        C: AsRef<str>,
    {
        let mut row = vec![Value::Null; self.columns.len()];
        for (column, value) in cells {
            let pos = self.position(column.as_ref())?;
            row[pos] = value;
        }
        self.rows.insert(key, row);
        Ok(())
    }

    /// Overwrite some cells of an existing row.
    ///
    /// Returns `Ok(false)` if there is no row under `key`.
    pub fn update<I, C>(&mut self, key: &K, cells: I) -> Result<bool>
    where
        I: IntoIterator<Item = (C, Value)>,
        C: AsRef<str>,
    {
        let updates = cells
            .into_iter()
            .map(|(column, value)| Ok((self.position(column.as_ref())?, value)))
            .collect::<Result<Vec<_>>>()?;
        let Some(row) = self.rows.get_mut(key) else {
            return Ok(false);
        };
        for (pos, value) in updates {
            row[pos] = value;
        }
        Ok(true)
    }

    /// A copy of one row, keyed by column name.
    pub fn get(&self, key: &K) -> Option<Fields> {
        let row = self.rows.get(key)?;
        Some(self.columns.iter().cloned().zip(row.iter().cloned()).collect())
    }

    /// Column names in schema order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over `(key, cells)` in row order. Cells follow [`columns`](Self::columns).
    pub fn iter(&self) -> impl Iterator<Item = (&K, &[Value])> + '_ {
        self.rows.iter().map(|(k, row)| (k, row.as_slice()))
    }

    fn position(&self, column: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| QueueError::UnknownField {
                field: column.to_string(),
                item: None,
            })
    }
}

impl<K> Store for Frame<K>
where
    K: Clone + Eq + Hash + fmt::Debug,
{
    type Key = K;

    fn fields(&self) -> Vec<String> {
        self.columns.clone()
    }

    fn has_field(&self, field: &str) -> bool {
        self.columns.iter().any(|c| c == field)
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn contains(&self, key: &K) -> bool {
        self.rows.contains_key(key)
    }

    fn cell(&self, key: &K, field: &str) -> Option<&Value> {
        let pos = self.columns.iter().position(|c| c == field)?;
        self.rows.get(key).and_then(|row| row.get(pos))
    }

    fn remove(&mut self, key: &K) -> bool {
        self.rows.shift_remove(key).is_some()
    }

    fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.rows.keys()
    }
}
