//! Debounced save tests
//!
//! With a non-zero delay, writes are committed in memory immediately and
//! reach the medium once the delay passes without further writes.

use parking_lot::Mutex;
use serde_json::json;
use shapestore_engine::Store;
use shapestore_storage::{Medium, MemoryMedium};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn open_debounced(medium: Arc<MemoryMedium>, delay: Duration) -> Store {
    Store::builder("draft")
        .default_value(json!({"text": "", "rev": 0}))
        .delay(delay)
        .open(medium)
        .unwrap()
}

#[test]
fn test_initial_default_save_is_deferred() {
    let medium = Arc::new(MemoryMedium::new());
    let store = open_debounced(medium.clone(), Duration::from_secs(60));

    assert!(store.has_pending_save());
    assert!(medium.is_empty());

    assert!(store.flush().unwrap());
    assert!(!store.has_pending_save());
    assert_eq!(
        medium.read("draft").unwrap().as_deref(),
        Some(r#"{"text":"","rev":0}"#)
    );

    // Nothing left to flush
    assert!(!store.flush().unwrap());
}

#[test]
fn test_burst_of_writes_collapses() {
    let medium = Arc::new(MemoryMedium::new());
    let store = open_debounced(medium.clone(), Duration::from_millis(50));

    for rev in 1..=10 {
        assert!(store.set("rev", json!(rev)).unwrap());
    }
    assert!(store.has_pending_save());
    assert!(medium.is_empty());

    thread::sleep(Duration::from_millis(500));
    assert!(!store.has_pending_save());
    assert_eq!(
        medium.read("draft").unwrap().as_deref(),
        Some(r#"{"text":"","rev":10}"#)
    );
}

#[test]
fn test_explicit_save_supersedes_pending() {
    let medium = Arc::new(MemoryMedium::new());
    let store = open_debounced(medium.clone(), Duration::from_secs(60));

    assert!(store.set("text", json!("hello")).unwrap());
    assert!(store.save().unwrap());
    assert!(!store.has_pending_save());
    assert_eq!(
        medium.read("draft").unwrap().as_deref(),
        Some(r#"{"text":"hello","rev":0}"#)
    );
}

#[test]
fn test_drop_flushes_pending_save() {
    let medium = Arc::new(MemoryMedium::new());
    {
        let store = open_debounced(medium.clone(), Duration::from_secs(60));
        assert!(store.set("text", json!("unsaved")).unwrap());
        assert!(medium.is_empty());
    }
    assert_eq!(
        medium.read("draft").unwrap().as_deref(),
        Some(r#"{"text":"unsaved","rev":0}"#)
    );
}

#[test]
fn test_debounced_conflict_reaches_handler() {
    let medium = Arc::new(MemoryMedium::new());
    let conflicts = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&conflicts);

    let store = Store::builder("draft")
        .default_value(json!({"text": "", "rev": 0}))
        .delay(Duration::from_millis(30))
        .on_conflict(move |current, _| sink.lock().push(current.map(str::to_string)))
        .open(medium.clone())
        .unwrap();

    // Another agent claims the key before our first save fires
    medium.write("draft", r#"{"text":"theirs","rev":9}"#).unwrap();

    thread::sleep(Duration::from_millis(400));
    assert_eq!(
        *conflicts.lock(),
        vec![Some(r#"{"text":"theirs","rev":9}"#.to_string())]
    );
    assert_eq!(
        medium.read("draft").unwrap().as_deref(),
        Some(r#"{"text":"theirs","rev":9}"#)
    );
    drop(store);
}
