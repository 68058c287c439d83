use std::io;
use std::path::PathBuf;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;
use thiserror::Error;

/// Error type for normalization and query failures.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("ingestion source '{}' does not exist", path.display())]
    MissingSource { path: PathBuf },
    #[error("{}:{line}: invalid JSON record: {source}", path.display())]
    IngestionParse {
        path: PathBuf,
        line: u64,
        #[source]
        source: serde_json::Error,
    },
    #[error("post store '{}' is unavailable: {reason}", path.display())]
    StoreUnavailable { path: PathBuf, reason: String },
    #[error("field '{field}' has type {found}, which conflicts with the post schema")]
    SchemaConflict { field: String, found: String },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Arrow(#[from] ArrowError),
    #[error(transparent)]
    Parquet(#[from] ParquetError),
}

impl AnalyticsError {
    pub(crate) fn store_unavailable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::StoreUnavailable { path: path.into(), reason: reason.to_string() }
    }
}

pub type Result<T, E = AnalyticsError> = std::result::Result<T, E>;
