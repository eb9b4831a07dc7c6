use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Random generator error: {0}")]
    Entropy(String),

    #[error("Unknown {kind} value: '{value}'")]
    UnknownVariant { kind: &'static str, value: String },

    #[error("Score {field} out of range: {value} (expected 0-100)")]
    ScoreOutOfRange { field: &'static str, value: f64 },

    #[error("Malformed backup code")]
    MalformedBackupCode,
}

pub type Result<T> = std::result::Result<T, CoreError>;
