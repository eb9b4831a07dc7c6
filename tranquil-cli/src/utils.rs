//! Common output helpers shared across CLI commands.

use anyhow::{Context, Result};
use colored::Colorize;
use tranquil_core::SecurityLevel;

/// Pretty-print a JSON value to stdout.
pub fn print_json(value: &serde_json::Value) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{rendered}");
    Ok(())
}

/// Print an error line to stderr.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "error:".red().bold(), message);
}

/// Security level colored by strength.
pub fn colored_level(level: SecurityLevel) -> String {
    let name = level.as_str().to_uppercase();
    match level {
        SecurityLevel::Premium => name.green().bold().to_string(),
        SecurityLevel::Protected => name.green().to_string(),
        SecurityLevel::Basic => name.yellow().to_string(),
        SecurityLevel::Insecure => name.red().bold().to_string(),
    }
}

/// Colored yes/no.
pub fn yes_no(value: bool) -> String {
    if value {
        "yes".green().to_string()
    } else {
        "no".red().to_string()
    }
}
