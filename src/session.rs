//! Long-lived process handles owned by the multiplexer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use tokio::process::{Child, Command};

use crate::{tlog_debug, tlog_warn, Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u32);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SessionId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// Lifecycle of the process behind a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ProcessState {
    NotStarted,
    Running { pid: Option<u32> },
    /// `code` is `None` when the process was killed by a signal.
    Exited { code: Option<i32> },
}

impl std::fmt::Display for ProcessState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessState::NotStarted => write!(f, "not started"),
            ProcessState::Running { pid: Some(pid) } => write!(f, "running (pid {})", pid),
            ProcessState::Running { pid: None } => write!(f, "running"),
            ProcessState::Exited { code: Some(code) } => write!(f, "exited ({})", code),
            ProcessState::Exited { code: None } => write!(f, "exited (signal)"),
        }
    }
}

/// Point-in-time view of a session, safe to hand out of the lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: SessionId,
    pub name: String,
    pub program: String,
    pub args: Vec<String>,
    pub state: ProcessState,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

pub struct Session {
    pub id: SessionId,
    pub name: String,
    program: String,
    args: Vec<String>,
    state: ProcessState,
    child: Option<Child>,
    created_at: DateTime<Utc>,
}

impl Session {
    /// Prepare a session. No process is spawned until `start`.
    pub fn new(id: SessionId, name: &str, program: &str, args: &[String]) -> Self {
        Self {
            id,
            name: name.to_string(),
            program: program.to_string(),
            args: args.to_vec(),
            state: ProcessState::NotStarted,
            child: None,
            created_at: Utc::now(),
        }
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn info(&self, active: bool) -> SessionInfo {
        SessionInfo {
            id: self.id,
            name: self.name.clone(),
            program: self.program.clone(),
            args: self.args.clone(),
            state: self.state,
            active,
            created_at: self.created_at,
        }
    }

    /// NotStarted -> Running. Sessions have no terminal, so stdio is null.
    pub fn start(&mut self) -> Result<ProcessState> {
        if self.state != ProcessState::NotStarted {
            return Err(Error::InvalidSessionTransition {
                id: self.id,
                from: self.state.to_string(),
                to: "running".to_string(),
            });
        }
        let child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;
        self.state = ProcessState::Running { pid: child.id() };
        tlog_debug!(
            "Session {} started program={} state={}",
            self.id,
            self.program,
            self.state
        );
        self.child = Some(child);
        Ok(self.state)
    }

    /// Reap the child if it has exited, without blocking.
    pub fn refresh(&mut self) -> ProcessState {
        if let Some(child) = self.child.as_mut() {
            match child.try_wait() {
                Ok(Some(status)) => {
                    self.state = ProcessState::Exited {
                        code: status.code(),
                    };
                    self.child = None;
                }
                Ok(None) => {}
                Err(e) => tlog_warn!("Session {} try_wait failed: {}", self.id, e),
            }
        }
        self.state
    }

    /// Best-effort, non-blocking kill. Errors are swallowed.
    pub fn kill(&mut self) {
        if let Some(child) = self.child.as_mut() {
            if let Err(e) = child.start_kill() {
                tlog_debug!("Session {} kill ignored: {}", self.id, e);
            }
        }
    }
}

/// How sessions are arranged on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum Layout {
    #[default]
    #[value(name = "tabs")]
    Tabs,
    #[value(name = "vsplit")]
    VerticalSplit,
    #[value(name = "hsplit")]
    HorizontalSplit,
    #[value(name = "grid")]
    Grid,
}

impl Layout {
    pub fn label(&self) -> &'static str {
        match self {
            Layout::Tabs => "tabs",
            Layout::VerticalSplit => "vsplit",
            Layout::HorizontalSplit => "hsplit",
            Layout::Grid => "grid",
        }
    }
}

impl std::fmt::Display for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Layout {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "tabs" => Ok(Layout::Tabs),
            "vsplit" => Ok(Layout::VerticalSplit),
            "hsplit" => Ok(Layout::HorizontalSplit),
            "grid" => Ok(Layout::Grid),
            _ => Err(Error::UnknownLayout(s.to_string())),
        }
    }
}
