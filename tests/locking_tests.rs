mod common;

use common::{empty_table, locked_writer, put, registry};
use framequeue::{LockDirector, QueueError, StoreHandle};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread;

#[test]
fn test_queues_on_same_store_share_lock() {
    let registry = registry();
    let store = empty_table();
    registry
        .assign(Some(store.clone()), 10, &["A"], Some("Q1"))
        .unwrap();
    registry
        .assign(Some(store.clone()), 20, &["B"], Some("Q2"))
        .unwrap();

    let q1 = registry.lock("Q1").unwrap();
    let q2 = registry.lock("Q2").unwrap();
    assert!(q1.same_lock(&q2));

    // Holding one blocks the other.
    let _held = q1.acquire();
    assert!(q2.try_acquire().is_none());
}

#[test]
fn test_equal_stores_do_not_share_lock() {
    let registry = registry();
    let a = empty_table();
    let b = empty_table();
    put(&a, "1", [1.0, 2.0, 3.0, 4.0]);
    put(&b, "1", [1.0, 2.0, 3.0, 4.0]);
    assert_eq!(*a.read(), *b.read());

    registry.assign(Some(a), 10, &["A"], Some("Q1")).unwrap();
    registry.assign(Some(b), 10, &["A"], Some("Q2")).unwrap();

    let q1 = registry.lock("Q1").unwrap();
    let q2 = registry.lock("Q2").unwrap();
    assert!(!q1.same_lock(&q2));
}

#[test]
fn test_unbound_queues_do_not_share_lock() {
    let registry = registry();
    registry
        .assign(None::<StoreHandle<common::Table>>, 1, &["A"], Some("Q1"))
        .unwrap();
    let q1 = registry.lock("Q1").unwrap();
    let default = registry.lock(registry.default_name()).unwrap();
    assert!(!q1.same_lock(&default));
}

#[test]
fn test_rebinding_moves_queue_to_new_lock() {
    let registry = registry();
    let x = empty_table();
    let y = empty_table();
    registry
        .assign(Some(x.clone()), 10, &["A"], Some("Q1"))
        .unwrap();
    registry
        .assign(Some(x.clone()), 10, &["A"], Some("Q2"))
        .unwrap();
    let shared = registry.lock("Q1").unwrap();

    registry
        .assign(Some(y.clone()), 10, &["A"], Some("Q2"))
        .unwrap();

    assert!(shared.same_lock(&registry.lock("Q1").unwrap()));
    assert!(!shared.same_lock(&registry.lock("Q2").unwrap()));

    // Back onto x: shares with Q1 again.
    registry
        .assign(Some(x.clone()), 10, &["A"], Some("Q2"))
        .unwrap();
    assert!(shared.same_lock(&registry.lock("Q2").unwrap()));
}

#[test]
fn test_rebinding_to_same_store_keeps_lock() {
    let registry = registry();
    let store = empty_table();
    registry
        .assign(Some(store.clone()), 10, &["A"], Some("Q"))
        .unwrap();
    let before = registry.lock("Q").unwrap();

    registry
        .assign(Some(store.clone()), 3, &["B"], Some("Q"))
        .unwrap();

    assert!(before.same_lock(&registry.lock("Q").unwrap()));
}

#[test]
fn test_director_forgets_store_after_last_binding() {
    let store = empty_table();
    let mut director = LockDirector::new();

    let first = director.lock_for(Some(store.id()));
    let second = director.lock_for(Some(store.id()));
    assert!(first.same_lock(&second));
    assert_eq!(director.bindings_for(store.id()), 2);

    director.release(Some(store.id()));
    director.release(Some(store.id()));
    assert_eq!(director.bindings_for(store.id()), 0);

    let third = director.lock_for(Some(store.id()));
    assert!(!first.same_lock(&third));
}

#[test]
fn test_with_lock_releases_on_error() {
    let registry = registry();
    registry
        .assign(Some(empty_table()), 1, &["A"], Some("Q"))
        .unwrap();

    let result: Result<(), QueueError> = registry.with_lock("Q", || {
        Err(QueueError::ReadOnly {
            attribute: "x".into(),
        })
    });

    assert!(matches!(result, Err(QueueError::ReadOnly { .. })));
    assert!(registry.lock("Q").unwrap().try_acquire().is_some());
}

#[test]
fn test_with_lock_releases_on_panic() {
    let registry = registry();
    registry
        .assign(Some(empty_table()), 1, &["A"], Some("Q"))
        .unwrap();

    let outcome = catch_unwind(AssertUnwindSafe(|| {
        registry.with_lock("Q", || -> Result<(), QueueError> { panic!("boom") })
    }));

    assert!(outcome.is_err());
    assert!(registry.lock("Q").unwrap().try_acquire().is_some());
}

#[test]
fn test_with_lock_on_unknown_queue() {
    let registry = registry();
    let mut ran = false;
    let result: Result<(), QueueError> = registry.with_lock("nope", || {
        ran = true;
        Ok(())
    });
    assert!(matches!(result, Err(QueueError::NotFound { .. })));
    assert!(!ran);
}

#[test]
fn test_parallel_locked_writers_stay_bounded() {
    let registry = registry();
    let store = empty_table();
    registry
        .assign(Some(store.clone()), 100, &["A", "C"], Some("P"))
        .unwrap();
    let add_row = locked_writer(&registry, Some("P"), store.clone(), &["A", "C"]);

    thread::scope(|s| {
        for t in 0..2 {
            let add_row = &add_row;
            s.spawn(move || {
                for i in 0..500 {
                    let v = (t * 1000 + i) as f64;
                    add_row((format!("{t}-{i}"), [v, v + 0.1, v + 0.2, v + 0.3])).unwrap();
                }
            });
        }
    });

    assert_eq!(store.read().len(), 100);
    assert_eq!(registry.info(Some("P")).unwrap().len(), 100);
}

#[test]
fn test_parallel_queues_sharing_a_store_stay_bounded() {
    let registry = registry();
    let store = empty_table();
    registry
        .assign(Some(store.clone()), 100, &["A"], Some("left"))
        .unwrap();
    registry
        .assign(Some(store.clone()), 100, &["B"], Some("right"))
        .unwrap();
    let left = locked_writer(&registry, Some("left"), store.clone(), &["A"]);
    let right = locked_writer(&registry, Some("right"), store.clone(), &["B"]);

    thread::scope(|s| {
        s.spawn(|| {
            for i in 0..400 {
                left((format!("l{i}"), [i as f64; 4])).unwrap();
            }
        });
        s.spawn(|| {
            for i in 0..400 {
                right((format!("r{i}"), [i as f64; 4])).unwrap();
            }
        });
    });

    assert_eq!(store.read().len(), 100);
}
