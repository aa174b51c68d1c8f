//! Interface to the AI completion service behind `hm`.
//!
//! No network client lives in this crate; the shell accepts any
//! `Assistant` implementation.

use futures::future::BoxFuture;

use crate::command_log::CommandLog;
use crate::util;
use crate::Result;

/// Reply text meaning "no confident answer".
pub const NO_ANSWER_SENTINEL: &str = "3d8a19a704";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    NoAnswer,
}

impl Reply {
    /// Map a raw completion to a reply, recognizing the sentinel.
    pub fn from_raw(raw: &str) -> Self {
        let text = raw.trim();
        if text.is_empty() || text.contains(NO_ANSWER_SENTINEL) {
            Reply::NoAnswer
        } else {
            Reply::Text(text.to_string())
        }
    }
}

pub trait Assistant: Send + Sync {
    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<Reply>>;
}

/// Request for a corrected command based on a failed attempt.
pub fn fix_prompt(log: &CommandLog) -> String {
    let mut prompt = format!(
        "Platform: {}\nShell: {}\nWorking directory: {}\nCommand: {}\nExit code: {}\n",
        log.metadata.platform,
        log.metadata.shell,
        log.command.cwd,
        log.command.raw.trim(),
        log.output.exit_code
    );
    if let Some(error) = &log.output.error {
        prompt.push_str(&format!("Launch error: {}\n", error));
    }
    if !log.output.stderr.is_empty() {
        prompt.push_str(&format!("Stderr:\n{}\n", log.output.stderr.trim_end()));
    }
    prompt.push_str(&format!(
        "Reply with only the corrected command. If unsure, reply with {}.",
        NO_ANSWER_SENTINEL
    ));
    prompt
}

/// Request for a single command that does what `query` describes.
pub fn suggest_prompt(query: &str) -> String {
    format!(
        "Platform: {}\nShell: {}\nTask: {}\n\
         Reply with only the command line to run, no explanation. \
         If unsure, reply with {}.",
        util::platform(),
        util::shell_name(),
        query.trim(),
        NO_ANSWER_SENTINEL
    )
}

/// Request for a plain-text explanation of a command or shell concept.
pub fn explain_prompt(query: &str) -> String {
    format!(
        "Explain this for a terminal user, focusing on command-line concepts: {}\n\
         Keep the formatting plain; the answer is printed to a terminal. \
         If you cannot explain it, reply with {}.",
        query.trim(),
        NO_ANSWER_SENTINEL
    )
}
