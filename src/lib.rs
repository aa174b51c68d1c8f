pub mod assistant;
pub mod command_log;
pub mod commands;
pub mod config;
pub mod error;
pub mod executor;
pub mod failure_store;
pub mod history;
pub mod log;
pub mod multiplexer;
pub mod retry;
pub mod session;
pub mod shell;
pub mod spinner;
pub mod suggest;
pub mod util;

pub use command_log::CommandLog;
pub use error::{Error, Result};
pub use executor::CommandExecutor;
pub use failure_store::FailureStore;
pub use multiplexer::Multiplexer;
pub use retry::{RetryOutcome, RetryingExecutor};
pub use session::{Layout, SessionId};
