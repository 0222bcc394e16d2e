use polars::prelude::PolarsError;
use thiserror::Error;
pub type Result<T> = std::result::Result<T, DataError>;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
    #[error("Required item table not found in the data directory")]
    RequiredFilesNotFound,
    #[error("Unsupported item table format: {0}")]
    UnsupportedFormat(String),
    #[error("Item table is missing required column '{0}'")]
    MissingColumn(String),
    #[error("Invalid item row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },
}
