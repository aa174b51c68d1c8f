//! Structured record of one command attempt.

use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::util;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Untouched user input.
    pub raw: String,
    pub executable: String,
    #[serde(default)]
    pub arguments: Vec<String>,
    pub cwd: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandOutput {
    pub stderr: String,
    pub exit_code: i32,
    /// Set only when the process could not be started or did not exit normally.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub user: String,
    pub platform: String,
    pub shell: String,
}

impl Metadata {
    pub fn capture() -> Self {
        Self {
            user: util::username(),
            platform: util::platform(),
            shell: util::shell_name(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandLog {
    pub id: String,
    pub timestamp: String,
    pub command: CommandSpec,
    pub output: CommandOutput,
    pub metadata: Metadata,
}

impl CommandLog {
    /// Build a log for `raw`. Returns `None` when the input has no tokens.
    pub fn new(raw: &str) -> Option<Self> {
        let mut tokens = util::tokenize(raw).into_iter();
        let executable = tokens.next()?;
        Some(Self {
            id: generate_id(),
            timestamp: Local::now().to_rfc3339(),
            command: CommandSpec {
                raw: raw.to_string(),
                executable,
                arguments: tokens.collect(),
                cwd: util::current_dir(),
            },
            output: CommandOutput::default(),
            metadata: Metadata::capture(),
        })
    }

    /// Record a process that could not be started.
    pub fn launch_failed(mut self, error: impl Into<String>) -> Self {
        self.output.exit_code = 1;
        self.output.error = Some(error.into());
        self
    }

    /// Record a process that ran to completion.
    pub fn finished(mut self, stderr: String, exit_code: i32, error: Option<String>) -> Self {
        self.output.stderr = stderr;
        self.output.exit_code = exit_code;
        self.output.error = error;
        self
    }

    pub fn is_clean(&self) -> bool {
        self.output.exit_code == 0 && self.output.stderr.is_empty()
    }

    /// Only failing or noisy commands are worth keeping.
    pub fn should_persist(&self) -> bool {
        !self.is_clean()
    }
}

/// `cmd_<unix>_<8 chars>`
fn generate_id() -> String {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(8).collect();
    format!("cmd_{}_{}", Utc::now().timestamp(), suffix)
}
