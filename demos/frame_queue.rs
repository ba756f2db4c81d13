//! Keep a table at three rows while writing, updating and deleting rows.

use framequeue::{wrap, Entry, Fields, Frame, QueueError, Registry, StoreHandle};
use serde_json::json;
use std::sync::Arc;

type Table = Frame<String>;

fn row(values: [f64; 4]) -> Fields {
    ["A", "B", "C", "D"]
        .into_iter()
        .zip(values)
        .map(|(c, v)| (c.to_string(), json!(v)))
        .collect()
}

fn keep_b(result: &(String, Fields), _: &()) -> framequeue::Result<Vec<Entry<String>>> {
    let (key, fields) = result;
    Ok(vec![Entry::new(key.clone(), [("B", fields["B"].clone())])])
}

fn show(label: &str, store: &StoreHandle<Table>) {
    let keys: Vec<String> = store.read().iter().map(|(k, _)| k.clone()).collect();
    println!("{label:<24} rows = {keys:?}");
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let registry: Arc<Registry<Table>> = Arc::new(Registry::new());
    let store = StoreHandle::new(Frame::new(["A", "B", "C", "D"]));
    registry.assign(Some(store.clone()), 3, &["B"], None)?;

    let writer = store.clone();
    let write_row = move |(key, values): (&'static str, [f64; 4])| -> Result<_, QueueError> {
        let fields = row(values);
        writer.write().insert(key.to_string(), fields.clone())?;
        Ok((key.to_string(), fields))
    };

    let change_row = wrap::with_append(&registry, None, keep_b, (), write_row.clone());
    let add_row = wrap::with_lock(
        &registry,
        None,
        wrap::with_eviction(
            &registry,
            None,
            wrap::with_append(&registry, None, keep_b, (), write_row),
        ),
    );

    add_row(("1", [1.0, 2.0, 3.0, 4.0]))?;
    add_row(("2", [5.0, 6.0, 7.0, 8.0]))?;
    show("added 1, 2", &store);

    change_row(("2", [5.0, 60.0, 7.0, 8.0]))?;
    show("changed 2", &store);

    add_row(("3", [9.0, 10.0, 11.0, 12.0]))?;
    add_row(("4", [13.0, 14.0, 15.0, 16.0]))?;
    show("added 3, 4", &store);

    add_row(("5", [17.0, 18.0, 19.0, 20.0]))?;
    add_row(("6", [21.0, 22.0, 23.0, 24.0]))?;
    show("added 5, 6", &store);

    for key in ["6", "5"] {
        framequeue::Store::remove(&mut *store.write(), &key.to_string());
    }
    show("removed 6, 5 directly", &store);

    add_row(("7", [25.0, 26.0, 27.0, 28.0]))?;
    show("added 7", &store);

    let info = registry.info(None)?;
    println!("queue {} holds {} entries:", info.name(), info.len());
    for entry in info.entries() {
        println!("  {entry}");
    }
    Ok(())
}
