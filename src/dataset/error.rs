use std::path::PathBuf;
use thiserror::Error;

/// Failures while loading the input tables.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: malformed count record: {reason}")]
    MalformedCount {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("{path}:{line}: invalid metadata JSON: {source}")]
    MalformedMetadata {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

impl DatasetError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        DatasetError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
