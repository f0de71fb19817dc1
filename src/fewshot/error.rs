use std::path::PathBuf;
use thiserror::Error;

/// Record stream failures.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt record in {path} at line {line}: {reason}")]
    CorruptLine {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("failed to serialize record for {path}: {reason}")]
    Serialize { path: PathBuf, reason: String },
}
