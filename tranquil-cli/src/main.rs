//! Tranquil CLI - operator tool for device trust and biometric credentials.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod exit_codes;
mod utils;

use exit_codes::ExitCode;

const EXIT_CODES_HELP: &str = "\
Exit codes:
  0   Success
  1   General error
  64  Usage error (invalid arguments)
  65  Data error (malformed input such as a bad backup code)";

#[derive(Parser)]
#[command(name = "tranquil")]
#[command(author, version, about = "Device trust and biometric credential tool", long_about = None)]
#[command(after_help = EXIT_CODES_HELP)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive the security level of a capability set
    Level {
        /// Device has a biometric sensor
        #[arg(long)]
        biometrics: bool,

        /// Device is protected by a passcode
        #[arg(long)]
        passcode: bool,

        /// Device locks its screen automatically
        #[arg(long)]
        screen_lock: bool,

        /// The user has switched biometric login on
        #[arg(long)]
        biometric_enabled: bool,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Generate a batch of one-time backup codes
    BackupCodes {
        /// Number of codes to generate
        #[arg(short, long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..=50))]
        count: u64,

        /// Print JSON (codes with their hashes) instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print the stored hash of a biometric token or backup code
    Hash {
        /// Raw token or backup code
        #[arg(value_name = "VALUE")]
        value: String,

        /// Treat VALUE as a backup code (normalised before hashing)
        #[arg(long)]
        backup_code: bool,
    },

    /// Generate a random URL-safe secret (e.g. for JWT_SECRET)
    Secret {
        /// Number of random bytes
        #[arg(short, long, default_value_t = 32, value_parser = clap::value_parser!(u64).range(16..=128))]
        bytes: u64,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Level {
            biometrics,
            passcode,
            screen_lock,
            biometric_enabled,
            json,
        } => commands::level::execute(biometrics, passcode, screen_lock, biometric_enabled, json),
        Commands::BackupCodes { count, json } => commands::backup_codes::execute(count, json),
        Commands::Hash { value, backup_code } => commands::hash::execute(&value, backup_code),
        Commands::Secret { bytes } => commands::secret::execute(bytes),
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() {
                exit_codes::USAGE_ERROR
            } else {
                exit_codes::SUCCESS
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    init_tracing(cli.verbose);

    let exit = match run(cli.command) {
        Ok(()) => ExitCode::success(),
        Err(err) => ExitCode::from_anyhow(&err),
    };

    if let Some(message) = &exit.message {
        utils::print_error(message);
    }
    std::process::exit(exit.code);
}
