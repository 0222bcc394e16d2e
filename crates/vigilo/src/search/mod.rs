//! Proximity and filter search over the item registry.
//!
//! A [`SearchRequest`] is either [`SearchRequest::ByRadius`] or
//! [`SearchRequest::ByFilterOnly`]. The two run through separate code paths
//! ([`radius_search_inner`] and [`filter_search_inner`]) and produce separate
//! result shapes, joined only by the [`SearchOutcome`] enum.

pub use error::SearchError;
mod filter_only;
mod filters;
mod outcome;
mod proximity;
mod request;

use error::Result;
pub use filter_only::filter_search_inner;
pub use filters::{eligible_expr, filters_expr};
pub use outcome::{NearbyItem, SearchOutcome};
pub use proximity::radius_search_inner;
pub(crate) use request::validate_radius;
pub use request::{SearchFilters, SearchRequest};

mod error {
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum SearchError {
        #[error("Invalid argument: {0}")]
        InvalidArgument(String),
        #[error("DataFrame error: {0}")]
        DataFrame(#[from] polars::prelude::PolarsError),
        #[error("Item data error: {0}")]
        Data(#[from] vigilo_data_processing::DataError),
        #[error("Item error: {0}")]
        Item(#[from] crate::item::ItemError),
        #[error(transparent)]
        Other(#[from] anyhow::Error),
    }
    pub type Result<T> = std::result::Result<T, SearchError>;
}
