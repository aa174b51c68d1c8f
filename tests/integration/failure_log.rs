//! Bounded failure log behavior across many executions.

use std::collections::HashSet;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::fixtures::{executor, failed_log, TestStore};

#[tokio::test]
async fn test_fifteen_failures_keep_last_ten_in_order() {
    let fixture = TestStore::new();
    let exec = executor(&fixture.store);
    let cancel = CancellationToken::new();

    for i in 0..15 {
        let raw = format!("false {}", i);
        exec.execute(&raw, &cancel).await.unwrap().unwrap();
    }

    let persisted = fixture.read_file();
    let raws: Vec<&str> = persisted.iter().map(|l| l.command.raw.as_str()).collect();
    let expected: Vec<String> = (5..15).map(|i| format!("false {}", i)).collect();
    assert_eq!(raws, expected);
}

#[tokio::test]
async fn test_concurrent_appends_lose_nothing() {
    let fixture = TestStore::with_capacity(100);
    let mut handles = Vec::new();

    for i in 0..20 {
        let store = Arc::clone(&fixture.store);
        handles.push(tokio::spawn(async move {
            let log = failed_log(&format!("false {}", i));
            let id = log.id.clone();
            store.append(log).await.unwrap();
            id
        }));
    }

    let mut expected = HashSet::new();
    for handle in handles {
        expected.insert(handle.await.unwrap());
    }

    let ids: HashSet<String> = fixture.read_file().into_iter().map(|l| l.id).collect();
    assert_eq!(ids.len(), 20);
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn test_concurrent_appends_respect_capacity() {
    let fixture = TestStore::new();
    let mut handles = Vec::new();

    for i in 0..25 {
        let store = Arc::clone(&fixture.store);
        handles.push(tokio::spawn(async move {
            store.append(failed_log(&format!("false {}", i))).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let persisted = fixture.read_file();
    assert_eq!(persisted.len(), 10);
    let unique: HashSet<&str> = persisted.iter().map(|l| l.id.as_str()).collect();
    assert_eq!(unique.len(), 10);
}

#[tokio::test]
async fn test_corrupt_file_is_replaced() {
    let fixture = TestStore::new();
    std::fs::write(&fixture.path, "{ not json").unwrap();

    fixture.store.append(failed_log("false")).await.unwrap();

    let persisted = fixture.read_file();
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0].command.raw, "false");
}
