use std::collections::HashMap;

use slingshot_core::frecency::FrecencyStore;

#[test]
fn recording_twice_counts_two() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FrecencyStore::open(dir.path().join("frecency.json"));

    store.record_use("/apps/calc", "calc", 0).unwrap();
    store.record_use("/apps/calc", "ca", 1).unwrap();

    assert_eq!(store.get_all().get("/apps/calc"), Some(&2));
}

#[test]
fn counts_survive_reopening() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frecency.json");

    {
        let mut store = FrecencyStore::open(&path);
        store.record_use("a", "", 0).unwrap();
        store.record_use("b", "", 0).unwrap();
        store.record_use("b", "", 0).unwrap();
    }

    let persisted: HashMap<String, u32> =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(persisted.get("a"), Some(&1));
    assert_eq!(persisted.get("b"), Some(&2));

    let mut reopened = FrecencyStore::open(&path);
    assert_eq!(reopened.count("b"), 2);
    assert_eq!(reopened.record_use("b", "", 0).unwrap(), 3);
}

#[test]
fn missing_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FrecencyStore::open(dir.path().join("none.json"));
    assert!(store.get_all().is_empty());
}

#[test]
fn corrupt_file_starts_empty_and_is_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frecency.json");
    std::fs::write(&path, "{ this is not json").unwrap();

    let mut store = FrecencyStore::open(&path);
    assert!(store.get_all().is_empty());

    store.record_use("x", "", 0).unwrap();
    let mut reopened = FrecencyStore::open(&path);
    assert_eq!(reopened.count("x"), 1);
}

#[test]
fn unwritable_location_keeps_in_memory_count() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"file, not a dir").unwrap();

    let mut store = FrecencyStore::open(blocker.join("frecency.json"));
    assert!(store.record_use("x", "", 0).is_err());
    assert_eq!(store.count("x"), 1);
}
