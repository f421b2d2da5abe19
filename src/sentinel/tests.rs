//! Tests for the persisted sentinel store

use super::*;
use std::sync::Arc;
use tempfile::TempDir;

use crate::core::error::SentinelError;

#[test]
fn test_memory_store_get_set_remove() {
    let store = MemoryStore::new();
    assert!(store.is_empty());
    assert_eq!(store.get("a").unwrap(), None);

    store.set("a", "1").unwrap();
    store.set("a", "2").unwrap();
    assert_eq!(store.get("a").unwrap(), Some("2".to_string()));
    assert_eq!(store.len(), 1);

    store.remove("a").unwrap();
    store.remove("a").unwrap();
    assert!(store.is_empty());
}

#[test]
fn test_file_store_survives_reopen() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("state").join("sentinels.json");

    {
        let store = FileStore::new(&path);
        store.set("startup", "value").unwrap();
        store.set("other", "x").unwrap();
    }

    // A new instance stands in for the next process launch
    let store = FileStore::new(&path);
    assert_eq!(store.get("startup").unwrap(), Some("value".to_string()));
    assert_eq!(store.get("other").unwrap(), Some("x".to_string()));

    store.remove("startup").unwrap();
    let reopened = FileStore::new(&path);
    assert_eq!(reopened.get("startup").unwrap(), None);
    assert_eq!(reopened.get("other").unwrap(), Some("x".to_string()));
}

#[test]
fn test_file_store_missing_file_reads_empty() {
    let temp = TempDir::new().unwrap();
    let store = FileStore::new(temp.path().join("absent.json"));

    assert_eq!(store.get("startup").unwrap(), None);
    assert!(store.remove("startup").is_ok());
}

#[test]
fn test_file_store_corrupt_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("sentinels.json");
    std::fs::write(&path, "garbage").unwrap();

    let store = FileStore::new(&path);
    assert!(matches!(
        store.get("startup"),
        Err(SentinelError::Corrupted { .. })
    ));
}

#[test]
fn test_file_store_write_replaces_corrupt_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("sentinels.json");
    std::fs::write(&path, "{ not json").unwrap();

    let store = FileStore::new(&path);
    store.set("startup", "value").unwrap();
    assert_eq!(store.get("startup").unwrap(), Some("value".to_string()));

    let reopened = FileStore::new(&path);
    assert_eq!(reopened.get("startup").unwrap(), Some("value".to_string()));

    std::fs::write(&path, "{ not json").unwrap();
    store.remove("startup").unwrap();
    assert_eq!(store.get("startup").unwrap(), None);
}

#[test]
fn test_file_store_leaves_no_temp_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("sentinels.json");

    let store = FileStore::new(&path);
    store.set("startup", "v").unwrap();

    assert!(path.exists());
    assert!(!path.with_extension("tmp").exists());
}

#[test]
fn test_sentinel_record_roundtrip_through_store() {
    let backend = Arc::new(MemoryStore::new());
    let sentinels = SentinelStore::new(backend.clone());

    assert_eq!(sentinels.load("startup").unwrap(), None);

    let record = SentinelRecord::new("1.2.0", SentinelState::Started);
    sentinels.save("startup", &record).unwrap();
    assert_eq!(sentinels.load("startup").unwrap(), Some(record));

    let done = SentinelRecord::new("1.2.0", SentinelState::Succeeded);
    sentinels.save("startup", &done).unwrap();
    assert_eq!(sentinels.load("startup").unwrap(), Some(done));

    // Overwrites, never appends
    assert_eq!(backend.len(), 1);

    sentinels.clear("startup").unwrap();
    assert_eq!(sentinels.load("startup").unwrap(), None);
}

#[test]
fn test_sentinel_record_unfinished_matches_exact_key() {
    let record = SentinelRecord::new("v1", SentinelState::Started);

    assert!(record.is_unfinished("v1"));
    assert!(!record.is_unfinished("v10"));
    assert!(!record.is_unfinished("v"));

    let done = SentinelRecord::new("v1", SentinelState::Succeeded);
    assert!(!done.is_unfinished("v1"));
}

#[test]
fn test_sentinel_store_rejects_foreign_value() {
    let backend = Arc::new(MemoryStore::new());
    backend.set("startup", "v1_started").unwrap();

    let sentinels = SentinelStore::new(backend);
    assert!(matches!(
        sentinels.load("startup"),
        Err(SentinelError::Corrupted { .. })
    ));
}

#[test]
fn test_sentinel_state_serialization() {
    assert_eq!(
        serde_json::to_string(&SentinelState::Started).unwrap(),
        "\"started\""
    );
    assert_eq!(
        serde_json::to_string(&SentinelState::Succeeded).unwrap(),
        "\"succeeded\""
    );
}
