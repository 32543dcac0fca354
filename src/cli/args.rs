//! CLI argument definitions using clap
//!
//! Commands:
//! - sel query --config <path>
//! - sel compile --config <path>
//! - sel operators
//! - sel schema

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// SEL - typed JSON queries over a flashcard store
#[derive(Parser, Debug)]
#[command(name = "sel")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute one query read from stdin and print the entities
    Query {
        /// Path to configuration file
        #[arg(long, default_value = "./sel.json")]
        config: PathBuf,
    },

    /// Compile one query read from stdin and print the SQL
    Compile {
        /// Path to configuration file
        #[arg(long, default_value = "./sel.json")]
        config: PathBuf,
    },

    /// Print the operator catalogue
    Operators,

    /// Print the entity catalogue
    Schema,
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
