//! Command-line interface

pub mod commands;
pub mod output;
pub mod signup;

use clap::{Parser, Subcommand};
use commands::{CardCommand, HistoryCommand, ResolveCommand, SignupCommand};
use std::ffi::OsString;
use std::path::PathBuf;

/// Request pipelines with normalized errors, card validation and request auditing
#[derive(Debug, Parser, Clone)]
#[command(name = "volter")]
#[command(version = "0.1.0")]
#[command(about = "Request pipelines with normalized errors and request auditing", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the YAML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Validate a payment card
    Card(CardCommand),

    /// Run the signup pipeline directly
    Signup(SignupCommand),

    /// Run the signup pipeline as a resolver and audit the exchange
    Resolve(ResolveCommand),

    /// Show audited requests
    History(HistoryCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}
