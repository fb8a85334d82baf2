//! Error types for the mock history API

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MockApiError {
    #[error("Failed to read mock fixture {path}: {source}")]
    FixtureRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse mock fixture {path}: {source}")]
    FixtureParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Mock fixture {path} declares count={declared} but holds {actual} results")]
    FixtureCountMismatch {
        path: PathBuf,
        declared: usize,
        actual: usize,
    },

    #[error("Mock server failed to bind: {0}")]
    ServerBind(std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type MockApiResult<T> = Result<T, MockApiError>;
