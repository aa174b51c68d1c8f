use thiserror::Error;

use crate::session::SessionId;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("No active session")]
    NoActiveSession,

    #[error("Invalid transition for session {id}: {from} -> {to}")]
    InvalidSessionTransition {
        id: SessionId,
        from: String,
        to: String,
    },

    #[error("Unknown layout: {0}")]
    UnknownLayout(String),

    #[error("Out of process resources: {0}")]
    ResourceExhausted(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("No home directory")]
    NoHomeDir,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Task join error: {0}")]
    TaskJoin(String),
}

pub type Result<T> = std::result::Result<T, Error>;
