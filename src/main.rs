use std::io::BufReader;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use termpilot::config::Config;
use termpilot::failure_store::{FailureBackend, FailureStore, FileBackend, MemoryBackend};
use termpilot::history::History;
use termpilot::shell::{FallbackSource, PlainSource, Shell, TerminalSource};
use termpilot::{tlog, tlog_warn, Result, RetryOutcome};

/// termpilot - a command runner that remembers what went wrong
#[derive(Parser, Debug)]
#[command(name = "termpilot")]
#[command(version, about, long_about = None)]
#[command(
    after_help = "ENVIRONMENT:\n    TERMPILOT_DEBUG=1     Enable debug logging (alternative to --debug)"
)]
pub struct Cli {
    /// Enable debug logging (writes to ~/.termpilot/termpilot.log)
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Override how many times a command that fails to launch is retried
    #[arg(short = 'r', long)]
    pub retries: Option<u32>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run one command with retry and failure logging, then exit
    Run {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Print the most recent failed command as JSON
    Last,

    /// Show command history
    History,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    termpilot::log::init_with_debug(cli.debug);
    if termpilot::log::is_debug() {
        if let Some(path) = termpilot::log::default_path() {
            eprintln!("Debug log: {}", path.display());
        }
    }

    let mut config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("warning: ignoring unreadable config: {}", e);
            Config::default()
        }
    };
    if let Some(retries) = cli.retries {
        config.max_retries = retries;
    }
    if let Err(e) = Config::ensure_dirs() {
        tlog_warn!("Could not create app directory: {}", e);
    }

    let store = Arc::new(FailureStore::with_capacity(
        failure_backend(),
        config.failure_capacity,
    ));

    match cli.command {
        Some(Command::Last) => run_last(&store).await,
        Some(Command::History) => {
            println!("{}", load_history(&config).listing());
            Ok(())
        }
        Some(Command::Run { command }) => {
            let shell = Shell::new(config.clone(), store, load_history(&config));
            run_one(&shell, &command.join(" ")).await
        }
        None => run_interactive(config, store).await,
    }
}

fn failure_backend() -> Arc<dyn FailureBackend> {
    match Config::failure_log_path() {
        Ok(path) => Arc::new(FileBackend::new(path)),
        Err(e) => {
            tlog_warn!("No failure log path ({}), keeping failures in memory", e);
            Arc::new(MemoryBackend::new())
        }
    }
}

fn load_history(config: &Config) -> History {
    let path = match Config::history_path() {
        Ok(path) => path,
        Err(_) => std::path::PathBuf::from(".termpilot_history"),
    };
    match History::load(&path, config.history_limit) {
        Ok(history) => history,
        Err(e) => {
            eprintln!("warning: could not read history: {}", e);
            History::empty(path)
        }
    }
}

async fn run_last(store: &FailureStore) -> Result<()> {
    match store.last().await? {
        Some(log) => println!("{}", serde_json::to_string_pretty(&log)?),
        None => println!("No failed command recorded"),
    }
    Ok(())
}

async fn run_one(shell: &Shell, line: &str) -> Result<()> {
    tlog!("Run command: {:?}", line);
    let outcome = shell.run_once(line).await?;
    for line in outcome.report() {
        eprintln!("{}", line);
    }
    let code = match outcome {
        RetryOutcome::Completed(log) => log.output.exit_code,
        RetryOutcome::Empty => 0,
        RetryOutcome::NotFound { .. } => 127,
        RetryOutcome::LaunchFailed { .. } | RetryOutcome::Cancelled(_) => 1,
    };
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

async fn run_interactive(config: Config, store: Arc<FailureStore>) -> Result<()> {
    tlog!("termpilot starting");
    let history = load_history(&config);
    let mut shell = Shell::new(config, store, history);
    let mut source = FallbackSource::new(
        TerminalSource,
        PlainSource::new(BufReader::new(std::io::stdin())),
    );

    // Keep Ctrl-C from killing the shell; it cancels the running command instead.
    tokio::spawn(async { while tokio::signal::ctrl_c().await.is_ok() {} });

    shell.run(&mut source).await?;
    println!("Goodbye!");
    Ok(())
}
