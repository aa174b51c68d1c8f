//! Interactive read-dispatch loop.
//!
//! Built-ins (`exit`, `history`, `cd`, `session`, `hm`, `hp`, `he`) are
//! handled here; everything else goes through the retrying executor with the
//! spinner up.

use std::io::{BufRead, Write};
use std::sync::Arc;

use chrono::Local;
use crossterm::style::Stylize;
use crossterm::tty::IsTty;
use tokio_util::sync::CancellationToken;

use crate::assistant::{
    explain_prompt, fix_prompt, suggest_prompt, Assistant, Reply,
};
use crate::commands::{run_session_command, SessionCommand};
use crate::config::Config;
use crate::executor::CommandExecutor;
use crate::failure_store::FailureStore;
use crate::history::History;
use crate::multiplexer::Multiplexer;
use crate::retry::{RetryOutcome, RetryingExecutor};
use crate::spinner::Spinner;
use crate::util::{self, tokenize};
use crate::{tlog, tlog_warn, Error, Result};

/// Source of user input lines. `Ok(None)` means end of input.
pub trait LineSource {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

/// Reads from an interactive terminal; refuses to work on piped input.
pub struct TerminalSource;

impl LineSource for TerminalSource {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        let stdin = std::io::stdin();
        if !stdin.is_tty() {
            return Err(Error::Validation("stdin is not a terminal".to_string()));
        }
        read_prompted(&mut stdin.lock(), prompt)
    }
}

/// Plain line reader over any `BufRead`. Prompts are printed without color.
pub struct PlainSource<R> {
    reader: R,
}

impl<R: BufRead> PlainSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> LineSource for PlainSource<R> {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        read_prompted(&mut self.reader, &util::strip_ansi(prompt))
    }
}

fn read_prompted<R: BufRead>(reader: &mut R, prompt: &str) -> Result<Option<String>> {
    let mut stdout = std::io::stdout();
    write!(stdout, "{}", prompt)?;
    stdout.flush()?;
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
}

/// Uses `primary` until it fails once, then `fallback` for good.
pub struct FallbackSource<P, F> {
    primary: P,
    fallback: F,
    degraded: bool,
}

impl<P: LineSource, F: LineSource> FallbackSource<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self {
            primary,
            fallback,
            degraded: false,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }
}

impl<P: LineSource, F: LineSource> LineSource for FallbackSource<P, F> {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        if !self.degraded {
            match self.primary.read_line(prompt) {
                Ok(line) => return Ok(line),
                Err(e) => {
                    tlog_warn!("Primary input failed, switching to plain input: {}", e);
                    eprintln!("Simple mode activated due to error: {}", e);
                    self.degraded = true;
                }
            }
        }
        self.fallback.read_line(prompt)
    }
}

/// `[HH:MM:SS] ~/dir ❯ `
pub fn prompt() -> String {
    let time = format!("[{}]", Local::now().format("%H:%M:%S"));
    let dir = util::tilde_path(&util::current_dir());
    format!(
        "{} {}{}",
        time.dark_grey(),
        dir.blue().bold(),
        " ❯ ".magenta().bold()
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Continue,
    Print(String),
    Exit,
}

pub struct Shell {
    config: Config,
    runner: RetryingExecutor,
    mux: Multiplexer,
    history: History,
    assistant: Option<Box<dyn Assistant>>,
    cancel: CancellationToken,
    spinner: bool,
}

impl Shell {
    pub fn new(config: Config, store: Arc<FailureStore>, history: History) -> Self {
        let runner = RetryingExecutor::new(CommandExecutor::new(store), config.retry_backoff());
        Self {
            config,
            runner,
            mux: Multiplexer::new(),
            history,
            assistant: None,
            cancel: CancellationToken::new(),
            spinner: true,
        }
    }

    pub fn with_assistant(mut self, assistant: Box<dyn Assistant>) -> Self {
        self.assistant = Some(assistant);
        self
    }

    pub fn with_executor(mut self, executor: CommandExecutor) -> Self {
        self.runner = RetryingExecutor::new(executor, self.config.retry_backoff());
        self
    }

    pub fn without_spinner(mut self) -> Self {
        self.spinner = false;
        self
    }

    pub fn multiplexer(&self) -> &Multiplexer {
        &self.mux
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Read and dispatch lines until `exit` or end of input.
    pub async fn run<S: LineSource>(&mut self, source: &mut S) -> Result<()> {
        loop {
            let prompt = prompt();
            let line = match tokio::task::block_in_place(|| source.read_line(&prompt)) {
                Ok(Some(line)) => line,
                Ok(None) => {
                    println!();
                    break;
                }
                Err(e) => {
                    tlog_warn!("Input error: {}", e);
                    eprintln!("error: {}", e);
                    break;
                }
            };
            match self.dispatch(&line).await {
                Ok(Action::Exit) => break,
                Ok(Action::Print(text)) => println!("{}", text),
                Ok(Action::Continue) => {}
                Err(e @ Error::ResourceExhausted(_)) => return Err(e),
                Err(e) => eprintln!("error: {}", e),
            }
        }
        self.cancel.cancel();
        self.mux.shutdown().await;
        tlog!("Shell loop finished");
        Ok(())
    }

    /// Handle one line of input.
    pub async fn dispatch(&mut self, line: &str) -> Result<Action> {
        let words = tokenize(line);
        let Some(head) = words.first().map(String::as_str) else {
            return Ok(Action::Continue);
        };

        match head {
            "exit" => return Ok(Action::Exit),
            "history" => return Ok(Action::Print(self.history.listing())),
            _ => {}
        }

        self.remember(line);

        match head {
            "cd" => self.change_dir(words.get(1).map(String::as_str)),
            "session" | "sess" => {
                let command = SessionCommand::parse(&words[1..])?;
                let shell = self.config.effective_shell();
                let text = run_session_command(&self.mux, command, &shell).await?;
                Ok(Action::Print(text))
            }
            "hm" => self.fix_last_error().await,
            "hp" | "he" => self.ask_about(head, &words[1..].join(" ")).await,
            _ => self.run_external(line).await,
        }
    }

    fn remember(&mut self, line: &str) {
        if let Err(e) = self.history.add(line) {
            tlog_warn!("History write failed: {}", e);
            eprintln!("warning: could not save history: {}", e);
        }
    }

    fn change_dir(&self, target: Option<&str>) -> Result<Action> {
        let dir = match target {
            Some(dir) => std::path::PathBuf::from(dir),
            None => dirs::home_dir().ok_or(Error::NoHomeDir)?,
        };
        std::env::set_current_dir(&dir)?;
        Ok(Action::Continue)
    }

    async fn fix_last_error(&self) -> Result<Action> {
        let Some(last) = self.runner.executor().store().last().await? else {
            return Ok(Action::Print("No failed command recorded".to_string()));
        };
        let Some(assistant) = &self.assistant else {
            return Ok(Action::Print(format!(
                "No assistant configured. Last failure: {} (exit {})",
                last.command.raw.trim(),
                last.output.exit_code
            )));
        };
        let reply = self
            .ask(assistant.as_ref(), "Looking at the last error...", &fix_prompt(&last))
            .await?;
        match reply {
            Reply::Text(fix) => Ok(Action::Print(format!("Suggested fix: {}", fix))),
            Reply::NoAnswer => Ok(Action::Print("No suggestion available".to_string())),
        }
    }

    /// `hp <query>` asks for a command, `he <query>` for an explanation.
    async fn ask_about(&self, builtin: &str, query: &str) -> Result<Action> {
        if query.trim().is_empty() {
            return Ok(Action::Print(format!("Usage: {} <your query>", builtin)));
        }
        let Some(assistant) = &self.assistant else {
            return Ok(Action::Print("No assistant configured".to_string()));
        };

        let text = if builtin == "hp" {
            let prompt = suggest_prompt(query);
            match self
                .ask(assistant.as_ref(), "Processing your query...", &prompt)
                .await?
            {
                Reply::Text(command) => format!("Try: {}", command),
                Reply::NoAnswer => {
                    "Sorry, I couldn't generate a command for that query.".to_string()
                }
            }
        } else {
            let prompt = explain_prompt(query);
            match self
                .ask(assistant.as_ref(), "Getting explanation...", &prompt)
                .await?
            {
                Reply::Text(explanation) => format!("Explanation:\n{}", explanation),
                Reply::NoAnswer => "Sorry, I couldn't provide an explanation.".to_string(),
            }
        };
        Ok(Action::Print(text))
    }

    /// Run one completion with the spinner up.
    async fn ask(&self, assistant: &dyn Assistant, status: &str, prompt: &str) -> Result<Reply> {
        let spinner = self
            .spinner
            .then(|| Spinner::stderr().start(status.cyan().to_string()));
        let reply = assistant.complete(prompt).await;
        if let Some(handle) = spinner {
            handle.stop().await;
        }
        reply
    }

    async fn run_external(&self, line: &str) -> Result<Action> {
        let cancel = self.cancel.child_token();
        let on_interrupt = cancel.clone();
        let watcher = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                on_interrupt.cancel();
            }
        });

        let spinner = self.spinner.then(|| {
            Spinner::stderr().start(format!("{} {}", "Executing:".blue().bold(), line.cyan()))
        });
        let outcome = self
            .runner
            .execute_with_retry(line, self.config.max_retries, &cancel)
            .await;
        if let Some(handle) = spinner {
            handle.stop().await;
        }
        watcher.abort();

        let lines = outcome?.report();
        if lines.is_empty() {
            Ok(Action::Continue)
        } else {
            Ok(Action::Print(lines.join("\n")))
        }
    }

    /// Run a single command non-interactively.
    pub async fn run_once(&self, line: &str) -> Result<RetryOutcome> {
        self.runner
            .execute_with_retry(line, self.config.max_retries, &self.cancel)
            .await
    }
}
