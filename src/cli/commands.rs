//! CLI command definitions

use clap::Args;
use serde_json::Value;
use std::net::IpAddr;

/// Validate a payment card
#[derive(Debug, Args, Clone)]
pub struct CardCommand {
    /// Card holder name
    #[arg(long)]
    pub name: String,

    /// Card number; spaces and dashes are ignored
    #[arg(long)]
    pub number: String,

    /// Expiry as MM/YY, MM/YYYY, YYYY-MM or YYYY-MM-DD
    #[arg(long)]
    pub expiry: String,

    /// Card verification code
    #[arg(long)]
    pub cvc: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Run the signup pipeline directly
#[derive(Debug, Args, Clone)]
pub struct SignupCommand {
    /// Email address to register
    #[arg(short, long)]
    pub email: String,

    /// Display name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Bearer token identifying the caller
    #[arg(short, long)]
    pub token: Option<String>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Run the signup pipeline as a resolver
#[derive(Debug, Args, Clone)]
pub struct ResolveCommand {
    /// Resolver arguments as JSON
    #[arg(short, long, value_parser = parse_json)]
    pub args: Value,

    /// Request headers (name: value)
    #[arg(short = 'H', long, value_parser = parse_header)]
    pub header: Vec<(String, String)>,

    /// Request path recorded in the audit log
    #[arg(long, default_value = "/graphql")]
    pub path: String,

    /// Peer address recorded when no forwarding header is sent
    #[arg(long)]
    pub peer: Option<IpAddr>,

    /// Don't write the exchange to the audit log
    #[arg(long)]
    pub no_audit: bool,
}

/// Show audited requests
#[derive(Debug, Args, Clone)]
pub struct HistoryCommand {
    /// Number of recent records to show
    #[arg(short, long, default_value_t = 10)]
    pub limit: usize,

    /// Show a single record by ID
    #[arg(long)]
    pub id: Option<String>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Parse `name: value` header pairs
pub fn parse_header(s: &str) -> Result<(String, String), String> {
    match s.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("Invalid header, expected 'name: value': {}", s)),
    }
}

/// Parse a JSON document argument
pub fn parse_json(s: &str) -> Result<Value, String> {
    serde_json::from_str(s).map_err(|e| format!("Invalid JSON: {}", e))
}
