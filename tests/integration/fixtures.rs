//! Test fixtures for integration tests.
//!
//! Provides helpers for:
//! - Failure stores backed by memory or a temporary file
//! - Executors that keep stderr off the test output
//! - Synthetic failed command logs

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use termpilot::failure_store::{FailureStore, FileBackend};
use termpilot::{CommandExecutor, CommandLog, RetryingExecutor};

/// A failure store persisted under a temporary directory.
pub struct TestStore {
    /// Keeps the directory alive for the life of the store.
    pub temp_dir: TempDir,
    pub path: PathBuf,
    pub store: Arc<FailureStore>,
}

impl TestStore {
    pub fn new() -> Self {
        Self::with_capacity(termpilot::config::DEFAULT_FAILURE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("last_errors.json");
        let store = Arc::new(FailureStore::with_capacity(
            Arc::new(FileBackend::new(&path)),
            capacity,
        ));
        Self {
            temp_dir,
            path,
            store,
        }
    }

    /// Parse the persisted file directly, bypassing the store.
    pub fn read_file(&self) -> Vec<CommandLog> {
        let content = std::fs::read_to_string(&self.path).expect("Failed to read failure log");
        serde_json::from_str(&content).expect("Failure log is not valid JSON")
    }
}

pub fn memory_store() -> Arc<FailureStore> {
    Arc::new(FailureStore::in_memory())
}

pub fn executor(store: &Arc<FailureStore>) -> CommandExecutor {
    CommandExecutor::new(Arc::clone(store)).quiet()
}

pub fn retrying(store: &Arc<FailureStore>) -> RetryingExecutor {
    RetryingExecutor::new(executor(store), Duration::from_millis(10))
}

/// A log as if `raw` ran and exited with status 1.
pub fn failed_log(raw: &str) -> CommandLog {
    CommandLog::new(raw)
        .expect("raw command must have tokens")
        .finished(String::new(), 1, None)
}
