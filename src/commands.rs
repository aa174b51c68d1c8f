//! `session ...` line commands typed at the interactive prompt.
//!
//! Parsing happens here with clap, so the multiplexer only ever sees typed
//! ids and layouts.

use clap::{Parser, Subcommand};

use crate::multiplexer::Multiplexer;
use crate::session::{Layout, SessionId};
use crate::{Error, Result};

#[derive(Parser, Debug, PartialEq)]
#[command(name = "session", no_binary_name = true, disable_help_flag = true)]
pub struct SessionLine {
    #[command(subcommand)]
    pub command: SessionCommand,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum SessionCommand {
    /// Prepare a new session running `command` (defaults to the shell)
    #[command(alias = "new")]
    Create {
        name: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
    /// Spawn the process of a prepared session
    Start { id: SessionId },
    /// Make a session the active one
    #[command(alias = "sw")]
    Switch { id: SessionId },
    /// List sessions
    #[command(alias = "ls")]
    List,
    /// Terminate and remove a session
    #[command(alias = "rm")]
    Close { id: SessionId },
    /// Change how sessions are arranged
    Layout {
        #[arg(value_enum, ignore_case = true)]
        layout: Layout,
    },
}

impl SessionCommand {
    /// Parse the words after `session`/`sess`.
    pub fn parse(args: &[String]) -> Result<Self> {
        SessionLine::try_parse_from(args)
            .map(|line| line.command)
            .map_err(|e| Error::Validation(first_line(&e.to_string())))
    }
}

fn first_line(text: &str) -> String {
    text.lines()
        .next()
        .unwrap_or_default()
        .trim_start_matches("error: ")
        .to_string()
}

/// Apply a parsed command, returning the text to show the user.
pub async fn run_session_command(
    mux: &Multiplexer,
    command: SessionCommand,
    default_program: &str,
) -> Result<String> {
    match command {
        SessionCommand::Create { name, command } => {
            let (program, args) = match command.split_first() {
                Some((program, args)) => (program.clone(), args.to_vec()),
                None => (default_program.to_string(), Vec::new()),
            };
            let id = mux.create_session(&name, &program, &args).await;
            Ok(format!("Created session {} ({})", id, name))
        }
        SessionCommand::Start { id } => {
            let state = mux.start_session(id).await?;
            Ok(format!("Started session {}: {}", id, state))
        }
        SessionCommand::Switch { id } => {
            mux.switch_to_session(id).await?;
            Ok(format!("Switched to session {}", id))
        }
        SessionCommand::List => {
            let sessions = mux.list_sessions().await;
            let mut out = String::from("Available sessions:");
            for s in sessions {
                out.push_str(&format!(
                    "\n  {}: {} [{}]{}",
                    s.id,
                    s.name,
                    s.state,
                    if s.active { " (active)" } else { "" }
                ));
            }
            Ok(out)
        }
        SessionCommand::Close { id } => {
            mux.remove_session(id).await?;
            Ok(format!("Closed session {}", id))
        }
        SessionCommand::Layout { layout } => {
            mux.set_layout(layout).await;
            Ok(format!("Changed layout to {}", layout))
        }
    }
}
