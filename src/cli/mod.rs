//! CLI module for the `sel` binary
//!
//! Provides command-line access to:
//! - query: one-shot query execution
//! - compile: one-shot compilation with explain output
//! - operators: operator catalogue
//! - schema: entity catalogue

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{
    compile, handle_compile, handle_query, operator_catalogue, query, run, run_command,
    schema_catalogue,
};
pub use config::EngineConfig;
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{error_envelope, ok_envelope, read_request, write_error, write_response};
