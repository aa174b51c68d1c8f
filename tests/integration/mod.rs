//! Integration test suite for termpilot.
//!
//! These tests drive real child processes through the executor, the
//! retry layer and the session multiplexer, and check what ends up in
//! the failure log.
//!
//! # Test Categories
//!
//! - `executor_e2e`: Single command execution and failure persistence
//! - `failure_log`: Bounded log eviction and concurrent appends
//! - `retry_flow`: Existence checks, suggestions and retry budget
//! - `sessions`: Multiplexer lifecycle through the `session` command surface
//!
//! # CI Compatibility
//!
//! Only standard POSIX utilities (`true`, `false`, `ls`, `sleep`) are
//! spawned. File-backed stores live in temporary directories.

mod fixtures;

mod executor_e2e;
mod failure_log;
mod retry_flow;
mod sessions;
