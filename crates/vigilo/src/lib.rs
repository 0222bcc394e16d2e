//! Vigilo - Lost and Stolen Item Search Library
//!
//! Vigilo answers the question "what has been lost or stolen near here?" over
//! a registry of user-owned items. Owners report items lost, stolen or
//! damaged; public reports with a known location become searchable until the
//! item is marked found.
//!
//! # Quick Start
//!
//! ```rust
//! use vigilo::{Item, ItemSearcher, ItemStatus, SearchFilters, SearchOutcome, SearchRequest};
//!
//! let wallet = Item {
//!     status: ItemStatus::Lost,
//!     is_public: true,
//!     latitude: Some(40.001),
//!     longitude: Some(-74.001),
//!     reward: 20.0,
//!     ..Item::register(3, 11, "Leather wallet", "accessories")
//! };
//! let searcher = ItemSearcher::from_items(&[wallet])?;
//!
//! // Radius search: nearest first, each hit with its distance
//! let request = SearchRequest::by_radius(40.0, -74.0, 5, SearchFilters::new())?;
//! if let SearchOutcome::Nearby(hits) = searcher.search(&request)? {
//!     assert!((hits[0].distance_km - 0.14).abs() < 0.01);
//! }
//!
//! // Filter-only search: no reference point, highest reward first
//! let request = SearchRequest::filter_only(SearchFilters::new().text("wallet"));
//! assert_eq!(searcher.search(&request)?.len(), 1);
//! # Ok::<(), vigilo::error::VigiloError>(())
//! ```
//!
//! # Features
//!
//! - **Two search modes**: radius search with distances, or filter-only search
//! - **Spherical distances**: law-of-cosines great-circle distance on a 6371 km Earth
//! - **Item lifecycle**: owner-only transitions between active, lost, stolen,
//!   damaged, found, sold and archived
//! - **Polars backed**: items live in a Parquet-cached polars frame
//! - **Batch Processing**: run many independent searches in parallel
//!
//! # Data
//!
//! Items are read from a CSV export or a Parquet file (see
//! [`data_processing`]). Without either, tests and the demo server fall back
//! to a generated sample registry around New York.
use once_cell::sync::OnceCell;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

mod config;
mod core;
pub mod error;
mod geo;
mod item;
mod search;

pub use core::{ItemSearcher, ItemSearcherBuilder, SearcherInfo};

pub use config::{DEFAULT_RADIUS_KM, DEFAULT_RESULT_LIMIT, SearchConfig, SearchConfigBuilder};
pub use geo::{BoundingBox, Coordinates, EARTH_RADIUS_KM, haversine_distance_km};
pub use item::{
    IncidentReport, Item, ItemError, ItemStatus, LifecycleError, ReportKind, Transition,
};
pub use polars;
pub use search::{NearbyItem, SearchError, SearchFilters, SearchOutcome, SearchRequest};
pub use vigilo_data_processing as data_processing;
pub use vigilo_data_processing::ItemStoreData;

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

/// Initialize logging for the Vigilo library.
///
/// This sets up structured logging with configurable levels and filtering.
/// `RUST_LOG` takes precedence over `level` when set. Later calls are no-ops.
///
/// # Examples
///
/// ```rust
/// use tracing::Level;
/// use vigilo::init_logging;
///
/// init_logging(Level::INFO)?;
/// # Ok::<(), vigilo::error::VigiloError>(())
/// ```
pub fn init_logging(level: impl Into<LevelFilter>) -> Result<&'static (), error::VigiloError> {
    LOGGER_INIT.get_or_try_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level.into().to_string()))?
            .add_directive("polars=warn".parse()?)
            .add_directive("hyper_util=warn".parse()?);

        tracing_subscriber::fmt::fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .try_init()
            .map_err(|e| error::VigiloError::Other(anyhow::anyhow!(e)))?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_test_env() {
        let _ = init_logging(tracing::Level::WARN);
    }

    fn sample_searcher() -> ItemSearcher {
        let fixture = data_processing::create_test_data(&data_processing::TestDataConfig::sample()).unwrap();
        let dir = tempfile::TempDir::new().unwrap();
        let parquet = dir.path().join("items.parquet");
        data_processing::processed::process_csv_to_parquet(fixture.path(), &parquet).unwrap();
        // The store reads lazily; collect while the file still exists
        ItemSearcher::from_path(&parquet).unwrap()
    }

    #[test]
    fn test_init_logging_is_idempotent() {
        setup_test_env();
        assert!(init_logging(tracing::Level::DEBUG).is_ok());
    }

    #[test]
    fn test_searcher_creation() {
        setup_test_env();
        let searcher = sample_searcher();
        assert!(!searcher.is_empty(), "Sample registry should have rows");
    }

    #[test]
    fn test_basic_radius_search() {
        setup_test_env();
        let searcher = sample_searcher();

        let hits = searcher.nearby(40.7128, -74.0060, 5).unwrap();
        assert!(!hits.is_empty(), "Expected items near lower Manhattan");
        assert!(hits.iter().all(|hit| hit.distance_km <= 5.0));
        assert!(hits.windows(2).all(|w| w[0].distance_km <= w[1].distance_km));
    }

    #[test]
    fn test_configuration() {
        setup_test_env();
        let config = SearchConfigBuilder::compact().limit(2).build();
        let searcher = sample_searcher().with_config(config);

        let outcome = searcher.search(&SearchRequest::filter_only(SearchFilters::new())).unwrap();
        assert!(outcome.len() <= 2, "Should respect limit in configuration");
    }

    #[test]
    fn test_empty_search() {
        setup_test_env();
        let searcher = sample_searcher();

        let request = SearchRequest::filter_only(SearchFilters::new().text("XYZ123NONEXISTENT"));
        let outcome = searcher.search(&request).unwrap();
        assert!(outcome.is_empty(), "No match is not an error");
    }
}
