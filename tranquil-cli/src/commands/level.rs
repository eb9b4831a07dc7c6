//! Level command implementation.

use anyhow::Result;
use colored::Colorize;
use serde_json::json;
use tracing::debug;
use tranquil_core::{can_use_biometrics, DeviceCapabilities};

use crate::utils::{colored_level, print_json, yes_no};

/// Execute the level command.
pub fn execute(
    biometrics: bool,
    passcode: bool,
    screen_lock: bool,
    biometric_enabled: bool,
    json: bool,
) -> Result<()> {
    let capabilities = DeviceCapabilities::new(biometrics, passcode, screen_lock);
    let level = capabilities.security_level();
    let usable = can_use_biometrics(&capabilities, biometric_enabled, level);

    debug!(?capabilities, %level, usable, "Evaluated capabilities");

    if json {
        return print_json(&json!({
            "capabilities": capabilities,
            "security_level": level,
            "allows_biometrics": level.allows_biometrics(),
            "can_use_biometrics": usable,
        }));
    }

    println!("   {} {}", "Security level:".dimmed(), colored_level(level));
    println!(
        "   {} {}",
        "Level allows biometrics:".dimmed(),
        yes_no(level.allows_biometrics())
    );
    println!("   {} {}", "Biometric login possible:".dimmed(), yes_no(usable));
    Ok(())
}
