use thiserror::Error;

/// Pipeline errors.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Generation failed: {0}")]
    Gen(#[from] cgen_emit::GenError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid package: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Formatter `{command}` failed: {message}")]
    FormatFailed { command: String, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
