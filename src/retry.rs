//! Bounded retry around `CommandExecutor`.
//!
//! Only launch failures of a resolvable executable are retried. An executable
//! missing from the search path is permanent and answered with suggestions;
//! a process that ran, whatever its exit status, is a final outcome.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::command_log::CommandLog;
use crate::config::{Config, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_BACKOFF_MS};
use crate::executor::{AttemptKind, CommandExecutor};
use crate::suggest::similar_commands;
use crate::util::{blocking, tokenize};
use crate::{tlog, tlog_debug, Error, Result};

/// Fixed-backoff retry policy for launch failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.max_retries, config.retry_backoff())
    }

    /// `attempt` is 0-indexed; attempt 0 is the first try.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_RETRIES,
            Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
        )
    }
}

#[derive(Debug, Clone)]
pub enum RetryOutcome {
    /// Input had no tokens.
    Empty,
    /// The executable is not on the search path.
    NotFound {
        executable: String,
        suggestions: Vec<&'static str>,
    },
    /// The process ran; the log carries its exit status.
    Completed(CommandLog),
    /// Every attempt failed to launch. `attempts` counts tries, not retries.
    LaunchFailed { log: CommandLog, attempts: u32 },
    /// Aborted between or during attempts.
    Cancelled(Option<CommandLog>),
}

impl RetryOutcome {
    /// Lines to show the user for outcomes that need explaining.
    pub fn report(&self) -> Vec<String> {
        match self {
            RetryOutcome::NotFound {
                executable,
                suggestions,
            } => {
                let mut lines = vec![format!("Command not found: {}", executable)];
                if !suggestions.is_empty() {
                    lines.push("Did you mean one of these?".to_string());
                    lines.extend(suggestions.iter().map(|s| format!("  {}", s)));
                }
                lines
            }
            RetryOutcome::LaunchFailed { log, attempts } => vec![format!(
                "Error starting command after {} attempt(s): {}",
                attempts,
                log.output.error.as_deref().unwrap_or("unknown error")
            )],
            RetryOutcome::Cancelled(_) => vec!["Command cancelled".to_string()],
            RetryOutcome::Empty | RetryOutcome::Completed(_) => Vec::new(),
        }
    }
}

pub struct RetryingExecutor {
    executor: CommandExecutor,
    backoff: Duration,
}

impl RetryingExecutor {
    pub fn new(executor: CommandExecutor, backoff: Duration) -> Self {
        Self { executor, backoff }
    }

    pub fn executor(&self) -> &CommandExecutor {
        &self.executor
    }

    /// Run `raw`, retrying launch failures up to `max_retries` times.
    pub async fn execute_with_retry(
        &self,
        raw: &str,
        max_retries: u32,
        cancel: &CancellationToken,
    ) -> Result<RetryOutcome> {
        let policy = RetryPolicy::new(max_retries, self.backoff);
        let Some(executable) = tokenize(raw).into_iter().next() else {
            return Ok(RetryOutcome::Empty);
        };

        let mut attempt = 0u32;
        loop {
            let lookup = executable.clone();
            let resolvable = blocking(move || Ok(which::which(&lookup).is_ok())).await?;
            if !resolvable {
                let suggestions = similar_commands(&executable);
                tlog!(
                    "Command not found: {} suggestions={:?}",
                    executable,
                    suggestions
                );
                return Ok(RetryOutcome::NotFound {
                    executable,
                    suggestions,
                });
            }

            let result = match self.executor.attempt(raw, cancel).await {
                Ok(Some(result)) => result,
                Ok(None) => return Ok(RetryOutcome::Empty),
                Err(Error::Cancelled) => return Ok(RetryOutcome::Cancelled(None)),
                Err(e) => return Err(e),
            };

            match result.kind {
                AttemptKind::Completed => {
                    self.executor.record(&result.log).await;
                    return Ok(RetryOutcome::Completed(result.log));
                }
                AttemptKind::Cancelled => {
                    self.executor.record(&result.log).await;
                    return Ok(RetryOutcome::Cancelled(Some(result.log)));
                }
                AttemptKind::LaunchFailed(kind) => {
                    tlog_debug!(
                        "Launch attempt {} of {} failed: {:?}",
                        attempt + 1,
                        policy.max_retries + 1,
                        kind
                    );
                    if !policy.should_retry(attempt) {
                        self.executor.record(&result.log).await;
                        return Ok(RetryOutcome::LaunchFailed {
                            log: result.log,
                            attempts: attempt + 1,
                        });
                    }
                    attempt += 1;
                    eprintln!("Retrying... ({}/{})", attempt, policy.max_retries);
                    tokio::select! {
                        _ = tokio::time::sleep(policy.backoff) => {}
                        _ = cancel.cancelled() => {
                            self.executor.record(&result.log).await;
                            return Ok(RetryOutcome::Cancelled(Some(result.log)));
                        }
                    }
                }
            }
        }
    }
}
