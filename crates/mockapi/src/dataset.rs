//! Loading the fixture dataset

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{MockApiError, MockApiResult};

/// The full unpaginated history dataset backing one test.
///
/// Records are opaque JSON objects (file name, price, date, status flags);
/// the mock only relies on their order staying stable under slicing. The
/// dataset is loaded once at test setup and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockDataset {
    pub count: usize,
    pub results: Vec<Value>,
}

impl MockDataset {
    /// Load the dataset from a JSON fixture file.
    ///
    /// Fails fast when the file is missing, unparseable, or its declared
    /// `count` disagrees with the number of records. A silently empty
    /// dataset would let every pagination assertion pass vacuously, so this
    /// is a setup error rather than a recoverable one.
    pub fn load(path: &Path) -> MockApiResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| MockApiError::FixtureRead {
            path: path.to_path_buf(),
            source,
        })?;

        let dataset: Self =
            serde_json::from_str(&raw).map_err(|source| MockApiError::FixtureParse {
                path: path.to_path_buf(),
                source,
            })?;

        if dataset.count != dataset.results.len() {
            return Err(MockApiError::FixtureCountMismatch {
                path: path.to_path_buf(),
                declared: dataset.count,
                actual: dataset.results.len(),
            });
        }

        debug!("Loaded {} mock history records from {}", dataset.count, path.display());
        Ok(dataset)
    }

    /// Build a dataset directly from records, with `count` derived.
    pub fn from_records(results: Vec<Value>) -> Self {
        Self {
            count: results.len(),
            results,
        }
    }
}
