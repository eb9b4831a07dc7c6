//! Secret command implementation.

use anyhow::{Context, Result};
use tranquil_core::generate_secret;

/// Execute the secret command.
pub fn execute(bytes: u64) -> Result<()> {
    let bytes = usize::try_from(bytes).context("Invalid byte count")?;
    let secret = generate_secret(bytes).context("Failed to generate secret")?;
    println!("{secret}");
    Ok(())
}
