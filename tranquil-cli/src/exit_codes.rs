//! Exit codes following sysexits.h conventions.
//!
//! These codes provide semantic meaning for different failure modes,
//! enabling scripts and CI systems to handle errors appropriately.

use tranquil_core::CoreError;

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// General error (catch-all).
pub const GENERAL_ERROR: i32 = 1;

/// Command line usage error (invalid arguments).
/// Maps to EX_USAGE from sysexits.h.
pub const USAGE_ERROR: i32 = 64;

/// Data format error (malformed backup code, unknown variant).
/// Maps to EX_DATAERR from sysexits.h.
pub const DATA_ERROR: i32 = 65;

/// Represents an exit code with optional error context.
pub struct ExitCode {
    pub code: i32,
    pub message: Option<String>,
}

impl ExitCode {
    pub const fn success() -> Self {
        Self {
            code: SUCCESS,
            message: None,
        }
    }

    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        // Classify by the domain error anywhere in the chain
        let code = match err.chain().find_map(|e| e.downcast_ref::<CoreError>()) {
            Some(
                CoreError::MalformedBackupCode
                | CoreError::UnknownVariant { .. }
                | CoreError::ScoreOutOfRange { .. },
            ) => DATA_ERROR,
            Some(CoreError::Entropy(_)) | None => GENERAL_ERROR,
        };

        Self {
            code,
            message: Some(format!("{err:#}")),
        }
    }
}
