//! Bounded store of failed command attempts.
//!
//! The store is a JSON array of `CommandLog`, most recent last, feeding the
//! "fix my last error" flow. Every append is a full load-append-truncate-persist
//! cycle performed under one async mutex, so concurrent executions never lose
//! each other's entries.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::Mutex;

use crate::command_log::CommandLog;
use crate::config::DEFAULT_FAILURE_CAPACITY;
use crate::util::blocking;
use crate::{tlog_debug, tlog_warn, Error, Result};

/// Storage for the whole failure sequence.
pub trait FailureBackend: Send + Sync + 'static {
    fn load(&self) -> Result<Vec<CommandLog>>;
    fn persist(&self, logs: &[CommandLog]) -> Result<()>;
}

/// JSON file backend.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FailureBackend for FileBackend {
    fn load(&self) -> Result<Vec<CommandLog>> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        // A damaged file is replaced rather than blocking new entries.
        match serde_json::from_str(&data) {
            Ok(logs) => Ok(logs),
            Err(e) => {
                tlog_warn!(
                    "Failure log {} is unreadable, starting fresh: {}",
                    self.path.display(),
                    e
                );
                Ok(Vec::new())
            }
        }
    }

    fn persist(&self, logs: &[CommandLog]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(logs)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, data)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// In-memory backend, used by tests and when no home directory exists.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    logs: StdMutex<Vec<CommandLog>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FailureBackend for MemoryBackend {
    fn load(&self) -> Result<Vec<CommandLog>> {
        self.logs
            .lock()
            .map(|logs| logs.clone())
            .map_err(|e| Error::Persistence(e.to_string()))
    }

    fn persist(&self, logs: &[CommandLog]) -> Result<()> {
        let mut guard = self
            .logs
            .lock()
            .map_err(|e| Error::Persistence(e.to_string()))?;
        *guard = logs.to_vec();
        Ok(())
    }
}

pub struct FailureStore {
    backend: Arc<dyn FailureBackend>,
    capacity: usize,
    write_lock: Mutex<()>,
}

impl FailureStore {
    pub fn new(backend: Arc<dyn FailureBackend>) -> Self {
        Self::with_capacity(backend, DEFAULT_FAILURE_CAPACITY)
    }

    pub fn with_capacity(backend: Arc<dyn FailureBackend>, capacity: usize) -> Self {
        Self {
            backend,
            capacity: capacity.max(1),
            write_lock: Mutex::new(()),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append one entry, evicting the oldest beyond capacity.
    pub async fn append(&self, log: CommandLog) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let backend = Arc::clone(&self.backend);
        let capacity = self.capacity;
        let id = log.id.clone();

        let len = blocking(move || {
            let mut logs = backend.load()?;
            logs.push(log);
            if logs.len() > capacity {
                let excess = logs.len() - capacity;
                logs.drain(..excess);
            }
            backend.persist(&logs)?;
            Ok(logs.len())
        })
        .await
        .map_err(|e| match e {
            Error::Persistence(_) => e,
            other => Error::Persistence(other.to_string()),
        })?;

        tlog_debug!("FailureStore::append id={} len={}", id, len);
        Ok(())
    }

    /// Snapshot of all entries, oldest first.
    pub async fn entries(&self) -> Result<Vec<CommandLog>> {
        let _guard = self.write_lock.lock().await;
        let backend = Arc::clone(&self.backend);
        blocking(move || backend.load()).await
    }

    pub async fn last(&self) -> Result<Option<CommandLog>> {
        Ok(self.entries().await?.pop())
    }

    pub async fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let backend = Arc::clone(&self.backend);
        blocking(move || backend.persist(&[])).await
    }
}
