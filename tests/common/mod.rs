#![allow(dead_code)]

use framequeue::{wrap, Entry, Fields, Frame, QueueError, Registry, StoreHandle};
use serde_json::json;
use std::sync::Arc;

pub type Table = Frame<String>;

pub const COLUMNS: [&str; 4] = ["A", "B", "C", "D"];

pub fn empty_table() -> StoreHandle<Table> {
    StoreHandle::new(Frame::new(COLUMNS))
}

pub fn registry() -> Arc<Registry<Table>> {
    Arc::new(Registry::new())
}

/// A full A..D row.
pub fn cells(values: [f64; 4]) -> Fields {
    COLUMNS
        .iter()
        .zip(values)
        .map(|(c, v)| (c.to_string(), json!(v)))
        .collect()
}

/// Write a row directly, bypassing any queue.
pub fn put(store: &StoreHandle<Table>, key: &str, values: [f64; 4]) {
    store.write().insert(key.to_string(), cells(values)).unwrap();
}

pub fn remove(store: &StoreHandle<Table>, key: &str) {
    framequeue::Store::remove(&mut *store.write(), &key.to_string());
}

pub fn entry(key: &str, fields: &[(&str, f64)]) -> Entry<String> {
    Entry::new(key.to_string(), fields.iter().map(|(f, v)| (*f, json!(v))))
}

pub fn keys(store: &StoreHandle<Table>) -> Vec<String> {
    store.read().iter().map(|(k, _)| k.clone()).collect()
}

/// Transform: keep only the selected cells of the written row.
#[allow(clippy::ptr_arg)]
pub fn select(
    result: &(String, Fields),
    selected: &Vec<String>,
) -> framequeue::Result<Vec<Entry<String>>> {
    let (key, row) = result;
    Ok(vec![Entry::new(
        key.clone(),
        selected.iter().map(|f| (f.clone(), row[f].clone())),
    )])
}

/// The raw mutation: write a row and return what was written.
pub fn writer(
    store: StoreHandle<Table>,
) -> impl Fn((String, [f64; 4])) -> Result<(String, Fields), QueueError> + Send + Sync {
    move |(key, values)| {
        let fields = cells(values);
        store.write().insert(key.clone(), fields.clone())?;
        Ok((key, fields))
    }
}

/// `writer` with its writes recorded in `name`'s trail.
pub fn recording_writer(
    registry: &Arc<Registry<Table>>,
    name: Option<&str>,
    store: StoreHandle<Table>,
    selected: &[&str],
) -> impl Fn((String, [f64; 4])) -> Result<(String, Fields), QueueError> + Send + Sync + use<> {
    let selected: Vec<String> = selected.iter().map(|s| s.to_string()).collect();
    wrap::with_append(registry, name, select, selected, writer(store))
}

/// `recording_writer` followed by an eviction pass.
pub fn bounded_writer(
    registry: &Arc<Registry<Table>>,
    name: Option<&str>,
    store: StoreHandle<Table>,
    selected: &[&str],
) -> impl Fn((String, [f64; 4])) -> Result<(String, Fields), QueueError> + Send + Sync + use<> {
    wrap::with_eviction(
        registry,
        name,
        recording_writer(registry, name, store, selected),
    )
}

/// `bounded_writer` run under the queue's lock.
pub fn locked_writer(
    registry: &Arc<Registry<Table>>,
    name: Option<&str>,
    store: StoreHandle<Table>,
    selected: &[&str],
) -> impl Fn((String, [f64; 4])) -> Result<(String, Fields), QueueError> + Send + Sync + use<> {
    wrap::with_lock(registry, name, bounded_writer(registry, name, store, selected))
}
