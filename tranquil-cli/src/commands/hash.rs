//! Hash command implementation.
//!
//! Prints the value the server stores for a token or backup code.

use anyhow::{Context, Result};
use tranquil_core::{code_partial, hash_backup_code, hash_token, normalize_backup_code};

/// Execute the hash command.
pub fn execute(value: &str, backup_code: bool) -> Result<()> {
    if !backup_code {
        println!("{}", hash_token(value));
        return Ok(());
    }

    let normalized = normalize_backup_code(value).context("Invalid backup code")?;
    println!("{}", hash_backup_code(&normalized));
    eprintln!("partial: {}", code_partial(&normalized));
    Ok(())
}
