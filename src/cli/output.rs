//! CLI output formatting

use crate::card::Card;
use crate::core::Outcome;
use crate::error::{ErrorCode, ServerError};
use crate::persistence::AuditRecord;
use console::Emoji;
use std::fmt::Display;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");

/// Format an error code for display
pub fn format_code(code: ErrorCode) -> String {
    match code {
        ErrorCode::ValidationFailed => style(code).yellow().to_string(),
        ErrorCode::AlreadyExists => style(code).magenta().to_string(),
        ErrorCode::InternalServerError => style(code).red().to_string(),
    }
}

/// Format a normalized error for display
pub fn format_error(error: &ServerError) -> String {
    let mut line = format!("{} {} {}", CROSS, format_code(error.code), error.message);
    if let Some(at) = &error.at {
        line.push_str(&format!(" {}", style(format!("(at {})", at.join("."))).dim()));
    }
    line
}

/// Format a pipeline outcome for display
pub fn format_outcome<R: Display>(pipeline: &str, outcome: &Outcome<R>) -> String {
    match outcome {
        Outcome::Completed(result) => {
            format!("{} {} completed: {}", CHECK, style(pipeline).bold(), result)
        }
        Outcome::Skipped(gate) => format!(
            "{} {} stopped at the {} gate",
            WARN,
            style(pipeline).bold(),
            style(gate).yellow()
        ),
        Outcome::Guarded => format!("{} {} passed all guards", INFO, style(pipeline).bold()),
    }
}

/// Format a response status for display
pub fn format_status(status: u16) -> String {
    match status {
        200..=299 => style(status).green().to_string(),
        400..=499 => style(status).yellow().to_string(),
        500..=599 => style(status).red().to_string(),
        _ => style(status).dim().to_string(),
    }
}

/// Format an audit record for display
pub fn format_record(record: &AuditRecord) -> String {
    format!(
        "{} {} {} {} - {} - {}",
        style(&record.id.to_string()[..8]).dim(),
        style(&record.method).bold(),
        record.url,
        format_status(record.status),
        record.ip.as_deref().unwrap_or("-"),
        style(record.created.to_rfc3339()).dim()
    )
}

/// Format a validated card for display
pub fn format_card(card: &Card) -> String {
    format!(
        "{} {} {} expires {}",
        CHECK,
        style(&card.name).bold(),
        style(card.masked()).cyan(),
        card.expiry
            .map(|expiry| expiry.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| style("unknown").dim().to_string())
    )
}
