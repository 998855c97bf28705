use std::path::PathBuf;

use thiserror::Error;

use orchestrator::OrchestratorError;

/// Failures of the file-backed store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read store file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write store file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse store file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode store document: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("unsupported store schema in {path}: expected {expected}, found {found}")]
    UnsupportedSchema {
        path: PathBuf,
        expected: u32,
        found: u32,
    },
}

impl From<StoreError> for OrchestratorError {
    fn from(err: StoreError) -> Self {
        OrchestratorError::Store {
            message: err.to_string(),
        }
    }
}
