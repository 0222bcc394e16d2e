use thiserror::Error;

#[derive(Error, Debug)]
pub enum VigiloError {
    #[error("Search error: {0}")]
    SearchError(#[from] crate::search::SearchError),
    #[error("Lifecycle error: {0}")]
    LifecycleError(#[from] crate::item::LifecycleError),
    #[error("Item error: {0}")]
    ItemError(#[from] crate::item::ItemError),
    #[error("Data processing error: {0}")]
    DataProcessing(#[from] vigilo_data_processing::DataError),
    #[error("DataFrame error: {0}")]
    DataFrame(#[from] polars::prelude::PolarsError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Init Logging error: {0}")]
    InitLoggingError(#[from] tracing_subscriber::filter::ParseError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, VigiloError>;
