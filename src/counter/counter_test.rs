use std::sync::Arc;
use std::thread;

use super::*;

fn store() -> CounterStore {
    CounterStore::new(["A", "B", "views"])
}

#[test]
fn test_new_counters_start_at_zero() {
    let store = store();

    assert_eq!(store.names(), &["A", "B", "views"]);
    for name in store.names() {
        assert_eq!(store.load(store.id(name).unwrap()), 0);
    }
    assert!(store.is_idle());
}

#[test]
fn test_duplicate_names_share_one_counter() {
    let store = CounterStore::new(["A", "A", "B"]);

    assert_eq!(store.names().len(), 2);
}

#[test]
fn test_unknown_name_does_not_resolve() {
    assert_eq!(store().id("C"), None);
}

#[test]
fn test_increment_returns_post_increment_value() {
    let store = store();
    let a = store.id("A").unwrap();

    assert_eq!(store.increment(a), 1);
    assert_eq!(store.increment(a), 2);
    assert_eq!(store.name(a), Some("A"));
}

#[test]
fn test_load_after_sequential_increments() {
    let store = store();
    let b = store.id("B").unwrap();

    for _ in 0..37 {
        store.increment(b);
    }

    assert_eq!(store.load(b), 37);
    // Independent counters are untouched
    assert_eq!(store.load(store.id("A").unwrap()), 0);
    assert!(!store.is_idle());
}

#[test]
fn test_concurrent_increments_lose_no_updates() {
    const THREADS: u64 = 8;
    const PER_THREAD: u64 = 10_000;

    let store = Arc::new(store());
    let a = store.id("A").unwrap();

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..PER_THREAD {
                    store.increment(a);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.load(a), THREADS * PER_THREAD);
}

#[test]
fn test_concurrent_increments_return_distinct_values() {
    let store = Arc::new(store());
    let a = store.id("A").unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || (0..500).map(|_| store.increment(a)).collect::<Vec<_>>())
        })
        .collect();

    let mut seen: Vec<u64> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
    seen.sort_unstable();

    assert_eq!(seen, (1..=2000).collect::<Vec<_>>());
}

#[test]
fn test_values_reports_every_counter() {
    let store = store();
    store.increment(store.id("A").unwrap());
    store.increment(store.id("views").unwrap());
    store.increment(store.id("views").unwrap());

    let values = store.values();

    assert_eq!(values.len(), 3);
    assert_eq!(values["A"], 1);
    assert_eq!(values["B"], 0);
    assert_eq!(values["views"], 2);
}

#[test]
fn test_seed_never_lowers_a_counter() {
    let store = store();
    let a = store.id("A").unwrap();
    for _ in 0..10 {
        store.increment(a);
    }

    let mut seed = CounterValues::new();
    seed.insert("A".into(), 4);
    seed.insert("B".into(), 7);
    seed.insert("unknown".into(), 99);
    store.seed(&seed);

    assert_eq!(store.load(a), 10);
    assert_eq!(store.load(store.id("B").unwrap()), 7);
    assert_eq!(store.names().len(), 3);
}

#[test]
fn test_id_from_another_store_has_no_name() {
    let wide = CounterStore::new(["A", "B", "C"]);
    let narrow = CounterStore::new(["A"]);
    let c = wide.id("C").unwrap();

    assert_eq!(narrow.name(c), None);
    assert_eq!(wide.name(c), Some("C"));
}

#[test]
#[should_panic]
fn test_increment_with_id_from_another_store_panics() {
    let wide = CounterStore::new(["A", "B", "C"]);
    let narrow = CounterStore::new(["A"]);

    narrow.increment(wide.id("C").unwrap());
}
