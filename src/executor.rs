//! One-shot command execution.
//!
//! The child inherits stdin and stdout so it talks to the terminal directly.
//! Stderr is piped, echoed back to the user as it arrives, and captured into
//! the `CommandLog`. The drain runs on its own task and is joined before the
//! exit status is classified, so a chatty child can never stall on a full pipe.

use std::io::ErrorKind;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{ChildStderr, Command};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::command_log::CommandLog;
use crate::failure_store::FailureStore;
use crate::{tlog, tlog_debug, tlog_trace, tlog_warn, Error, Result};

const STDERR_CHUNK: usize = 4096;
const DRAIN_GRACE: Duration = Duration::from_millis(100);

/// How a single attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptKind {
    /// The process started and exited (any status, including signals).
    Completed,
    /// The OS refused to start the process.
    LaunchFailed(ErrorKind),
    /// The attempt was aborted through the cancellation token.
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct Attempt {
    pub log: CommandLog,
    pub kind: AttemptKind,
}

pub struct CommandExecutor {
    store: Arc<FailureStore>,
    echo_stderr: bool,
}

impl CommandExecutor {
    pub fn new(store: Arc<FailureStore>) -> Self {
        Self {
            store,
            echo_stderr: true,
        }
    }

    /// Capture stderr without forwarding it to the terminal.
    pub fn quiet(mut self) -> Self {
        self.echo_stderr = false;
        self
    }

    pub fn store(&self) -> &Arc<FailureStore> {
        &self.store
    }

    /// Run `raw` once and persist the outcome if it was not a clean success.
    ///
    /// Returns `Ok(None)` for input without tokens. Only running out of
    /// process resources, or a token cancelled before launch, is reported as
    /// an error; every other failure is recorded in the returned log.
    pub async fn execute(
        &self,
        raw: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<CommandLog>> {
        let Some(attempt) = self.attempt(raw, cancel).await? else {
            return Ok(None);
        };
        self.record(&attempt.log).await;
        Ok(Some(attempt.log))
    }

    /// Run `raw` once without touching the store.
    pub async fn attempt(&self, raw: &str, cancel: &CancellationToken) -> Result<Option<Attempt>> {
        let Some(log) = CommandLog::new(raw) else {
            return Ok(None);
        };
        tlog_debug!(
            "CommandExecutor::attempt id={} exe={} args={:?}",
            log.id,
            log.command.executable,
            log.command.arguments
        );

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let spawned = Command::new(&log.command.executable)
            .args(&log.command.arguments)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) if is_exhaustion(&e) => {
                tlog_warn!("Spawn failed, out of resources: {}", e);
                return Err(Error::ResourceExhausted(e.to_string()));
            }
            Err(e) => {
                tlog!("Launch failed: {} ({})", log.command.executable, e);
                let kind = e.kind();
                return Ok(Some(Attempt {
                    log: log.launch_failed(e.to_string()),
                    kind: AttemptKind::LaunchFailed(kind),
                }));
            }
        };

        let captured = Arc::new(StdMutex::new(Vec::new()));
        let drain = child
            .stderr
            .take()
            .map(|stderr| spawn_drain(stderr, self.echo_stderr, Arc::clone(&captured)));

        let (waited, mut cancelled) = tokio::select! {
            status = child.wait() => (status, false),
            _ = cancel.cancelled() => {
                tlog!("Cancelling {}", log.command.executable);
                let _ = child.start_kill();
                (child.wait().await, true)
            }
        };

        // A grandchild can hold the pipe open after the child exits, so the
        // drain has to stay interruptible too.
        if let Some(mut handle) = drain {
            if cancelled {
                // Pick up what the killed child already wrote, but never wait on
                // a descendant that kept the pipe.
                if tokio::time::timeout(DRAIN_GRACE, &mut handle).await.is_err() {
                    handle.abort();
                }
            } else {
                tokio::select! {
                    _ = &mut handle => {}
                    _ = cancel.cancelled() => {
                        tlog!(
                            "Cancelled while stderr of {} was still open",
                            log.command.executable
                        );
                        handle.abort();
                        cancelled = true;
                    }
                }
            }
        }
        let stderr = captured
            .lock()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_default();

        if cancelled {
            return Ok(Some(Attempt {
                log: log.finished(stderr, 1, Some("cancelled".to_string())),
                kind: AttemptKind::Cancelled,
            }));
        }

        let (exit_code, error) = classify(waited);
        tlog_debug!(
            "CommandExecutor::attempt finished exit_code={} stderr_bytes={}",
            exit_code,
            stderr.len()
        );
        Ok(Some(Attempt {
            log: log.finished(stderr, exit_code, error),
            kind: AttemptKind::Completed,
        }))
    }

    /// Persist `log` when it is worth keeping. Storage problems are reported,
    /// never propagated.
    pub async fn record(&self, log: &CommandLog) {
        if !log.should_persist() {
            return;
        }
        if let Err(e) = self.store.append(log.clone()).await {
            tlog_warn!("Could not save failure log {}: {}", log.id, e);
            eprintln!("warning: could not save error log: {}", e);
        }
    }
}

/// Copy stderr into `captured` until EOF. Bytes already copied survive an abort.
fn spawn_drain(
    mut stderr: ChildStderr,
    echo: bool,
    captured: Arc<StdMutex<Vec<u8>>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut buf = vec![0u8; STDERR_CHUNK];
        let mut out = tokio::io::stderr();
        loop {
            match stderr.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    tlog_trace!("stderr chunk: {} bytes", n);
                    if let Ok(mut bytes) = captured.lock() {
                        bytes.extend_from_slice(&buf[..n]);
                    }
                    if echo {
                        let _ = out.write_all(&buf[..n]).await;
                        let _ = out.flush().await;
                    }
                }
                Err(e) => {
                    tlog_warn!("stderr read failed: {}", e);
                    break;
                }
            }
        }
    })
}

fn classify(waited: std::io::Result<ExitStatus>) -> (i32, Option<String>) {
    match waited {
        Ok(status) => match status.code() {
            Some(code) => (code, None),
            None => (1, Some(abnormal_exit(&status))),
        },
        Err(e) => (1, Some(e.to_string())),
    }
}

#[cfg(unix)]
fn abnormal_exit(status: &ExitStatus) -> String {
    use std::os::unix::process::ExitStatusExt;
    match status.signal() {
        Some(sig) => format!("terminated by signal {}", sig),
        None => format!("abnormal exit: {}", status),
    }
}

#[cfg(not(unix))]
fn abnormal_exit(status: &ExitStatus) -> String {
    format!("abnormal exit: {}", status)
}

/// Fork/exec failures that no retry or user action can fix.
fn is_exhaustion(e: &std::io::Error) -> bool {
    matches!(e.kind(), ErrorKind::OutOfMemory | ErrorKind::WouldBlock)
}
