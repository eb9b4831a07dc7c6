//! Backup-codes command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use serde_json::json;
use tracing::info;
use tranquil_core::{generate_backup_codes, BACKUP_CODE_LIFETIME_DAYS};

use crate::utils::print_json;

/// Execute the backup-codes command.
pub fn execute(count: u64, json: bool) -> Result<()> {
    let count = usize::try_from(count).context("Invalid code count")?;
    let codes = generate_backup_codes(count).context("Failed to generate backup codes")?;

    info!(count = codes.len(), "Generated backup codes");

    if json {
        let entries: Vec<_> = codes
            .iter()
            .map(|code| {
                json!({
                    "code": code.display(),
                    "code_hash": code.hash(),
                    "code_partial": code.partial(),
                })
            })
            .collect();
        return print_json(&json!({
            "codes": entries,
            "lifetime_days": BACKUP_CODE_LIFETIME_DAYS,
        }));
    }

    for code in &codes {
        println!("   {}", code.display().bold());
    }
    println!();
    println!(
        "   {}",
        format!(
            "Each code works once and expires after {BACKUP_CODE_LIFETIME_DAYS} days."
        )
        .dimmed()
    );
    Ok(())
}
