//! Core item search functionality for the Vigilo library.
//!
//! This module provides the main [`ItemSearcher`] interface. It owns a
//! snapshot of the item registry and runs [`SearchRequest`]s against it, in
//! either of the two search modes.
//!
//! # Quick Start
//!
//! ```rust
//! use vigilo::{ItemSearcher, SearchFilters, SearchRequest};
//!
//! let searcher = ItemSearcher::from_items(&[])?;
//!
//! // Everything within 5 km of lower Manhattan
//! let nearby = searcher.nearby(40.7128, -74.0060, 5)?;
//! assert!(nearby.is_empty());
//!
//! // Filter-only search, highest reward first
//! let request = SearchRequest::filter_only(SearchFilters::new().category("bicycle"));
//! let outcome = searcher.search(&request)?;
//! assert!(outcome.distances().is_none());
//! # Ok::<(), vigilo::error::VigiloError>(())
//! ```
//!
//! # Concurrency
//!
//! Searches clone an `Arc` to the current snapshot and run without holding the
//! lock. [`ItemSearcher::apply`] builds a new frame and swaps it in, so a
//! search sees the registry either entirely before or entirely after a
//! lifecycle change.

use std::{
    path::{Path, PathBuf},
    sync::{Arc, PoisonError, RwLock},
};

use chrono::{DateTime, Utc};
use polars::prelude::*;
use rayon::prelude::*;
use tracing::{debug, info, instrument};
use vigilo_data_processing::{ItemStoreData, schema};

use crate::{
    SearchConfig,
    error::VigiloError,
    geo::Coordinates,
    item::{Item, LifecycleError, Transition},
    search::{
        NearbyItem, SearchFilters, SearchOutcome, SearchRequest, eligible_expr,
        filter_search_inner, radius_search_inner, validate_radius,
    },
};

/// Runs searches and lifecycle changes against an in-memory item registry.
///
/// # Examples
///
/// ```rust
/// use vigilo::{Item, ItemSearcher, ItemStatus, SearchConfig};
///
/// let bike = Item {
///     status: ItemStatus::Stolen,
///     is_public: true,
///     latitude: Some(40.73),
///     longitude: Some(-73.99),
///     ..Item::register(1, 42, "Black Trek bicycle", "bicycle")
/// };
///
/// let searcher = ItemSearcher::from_items(&[bike])?
///     .with_config(SearchConfig::builder().limit(10).build());
/// let hits = searcher.nearby(40.7306, -73.9866, 2)?;
/// assert_eq!(hits.len(), 1);
/// # Ok::<(), vigilo::error::VigiloError>(())
/// ```
#[derive(Debug)]
pub struct ItemSearcher {
    items: RwLock<Arc<DataFrame>>,
    config: SearchConfig,
    source: Option<PathBuf>,
}

impl ItemSearcher {
    /// Load the registry from the default data directory.
    ///
    /// Uses `processed/items.parquet` or `raw/items.csv` under the data
    /// directory. When neither exists and `vigilo-data-processing` is built
    /// with its `test_data` feature and `USE_TEST_DATA=1`, a generated sample
    /// registry is used instead; otherwise this fails with
    /// `DataError::RequiredFilesNotFound`.
    #[instrument(name = "Create ItemSearcher", level = "info")]
    pub fn new() -> Result<Self, VigiloError> {
        let store = ItemStoreData::new()?;
        Self::from_store(&store)
    }

    /// Load the registry from a CSV or Parquet file.
    #[instrument(name = "Create ItemSearcher from path", level = "info", skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, VigiloError> {
        let store = ItemStoreData::from_path(path)?;
        Self::from_store(&store)
    }

    /// Build a searcher over already-loaded store data.
    pub fn from_store(store: &ItemStoreData) -> Result<Self, VigiloError> {
        let t_load = std::time::Instant::now();
        let df = store.items_lf()?.clone().collect()?;

        info!(
            rows = df.height(),
            elapsed = ?t_load.elapsed(),
            "Item registry loaded"
        );

        Ok(Self {
            items: RwLock::new(Arc::new(df)),
            config: SearchConfig::default(),
            source: store.items_path().map(Path::to_path_buf),
        })
    }

    /// Build a searcher over the given items. Rows are validated like any
    /// other registry source.
    pub fn from_items(items: &[Item]) -> Result<Self, VigiloError> {
        let store = ItemStoreData::from_frame(Item::to_df(items)?)?;
        Self::from_store(&store)
    }

    #[must_use]
    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Run one search against the current snapshot.
    #[instrument(name = "Item Search", level = "info", skip(self), fields(by_radius = request.is_by_radius()))]
    pub fn search(&self, request: &SearchRequest) -> Result<SearchOutcome, VigiloError> {
        let t_search = std::time::Instant::now();
        let outcome = run_search(self.snapshot(), request, &self.config, Utc::now())?;
        info!(
            hits = outcome.len(),
            elapsed = ?t_search.elapsed(),
            "Search complete"
        );
        Ok(outcome)
    }

    /// Eligible items within `radius_km` of `(lat, lng)`, nearest first.
    pub fn nearby(&self, lat: f64, lng: f64, radius_km: i64) -> Result<Vec<NearbyItem>, VigiloError> {
        let origin = Coordinates::new(lat, lng)?;
        let radius_km = validate_radius(radius_km)?;
        let df = self.snapshot().as_ref().clone();
        Ok(radius_search_inner(
            df,
            origin,
            radius_km,
            &SearchFilters::new(),
            &self.config,
            Utc::now(),
        )?)
    }

    /// Run independent searches in parallel against one snapshot.
    ///
    /// Results come back in request order.
    #[instrument(name = "Bulk Item Search", level = "info", skip_all, fields(requests = requests.len()))]
    pub fn search_bulk(&self, requests: &[SearchRequest]) -> Result<Vec<SearchOutcome>, VigiloError> {
        let t_search = std::time::Instant::now();
        let snapshot = self.snapshot();
        let now = Utc::now();

        let outcomes = requests
            .par_iter()
            .map(|request| run_search(Arc::clone(&snapshot), request, &self.config, now))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            elapsed = ?t_search.elapsed(),
            "Bulk search complete for {} requests",
            outcomes.len()
        );
        Ok(outcomes)
    }

    /// Apply a lifecycle transition on behalf of `actor` and publish the result.
    ///
    /// Returns the updated item. The registry is unchanged when the
    /// transition is rejected.
    #[instrument(name = "Apply Transition", level = "info", skip(self, transition), fields(action = transition.action()))]
    pub fn apply(&self, item_id: u64, actor: u64, transition: Transition) -> Result<Item, VigiloError> {
        let mut guard = self.items.write().unwrap_or_else(PoisonError::into_inner);

        let row = guard
            .as_ref()
            .clone()
            .lazy()
            .filter(col(schema::ID).eq(lit(item_id)))
            .collect()?;
        let mut item = Item::from_df(&row)?
            .into_iter()
            .next()
            .ok_or(LifecycleError::UnknownItem(item_id))?;

        let from = item.status;
        item.apply(actor, transition)?;

        let mut next = guard
            .as_ref()
            .clone()
            .lazy()
            .filter(col(schema::ID).neq(lit(item_id)))
            .collect()?;
        next.vstack_mut(&Item::to_df(std::slice::from_ref(&item))?)?;
        let next = next.sort([schema::ID], SortMultipleOptions::default())?;

        *guard = Arc::new(next);
        info!(item_id, %from, to = %item.status, "Item updated");
        Ok(item)
    }

    /// Look up one item by id, eligible or not.
    pub fn get(&self, item_id: u64) -> Result<Option<Item>, VigiloError> {
        let row = self
            .snapshot()
            .as_ref()
            .clone()
            .lazy()
            .filter(col(schema::ID).eq(lit(item_id)))
            .collect()?;
        Ok(Item::from_df(&row)?.into_iter().next())
    }

    /// Number of items in the registry.
    pub fn len(&self) -> usize {
        self.snapshot().height()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn info(&self) -> Result<SearcherInfo, VigiloError> {
        let snapshot = self.snapshot();
        let searchable_items = snapshot
            .as_ref()
            .clone()
            .lazy()
            .filter(eligible_expr())
            .collect()?
            .height();

        Ok(SearcherInfo {
            total_items: snapshot.height(),
            searchable_items,
            source: self.source.clone(),
            config: self.config,
        })
    }

    fn snapshot(&self) -> Arc<DataFrame> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn run_search(
    snapshot: Arc<DataFrame>,
    request: &SearchRequest,
    config: &SearchConfig,
    now: DateTime<Utc>,
) -> Result<SearchOutcome, VigiloError> {
    let df = snapshot.as_ref().clone();
    let outcome = match request {
        SearchRequest::ByRadius {
            origin,
            radius_km,
            filters,
        } => {
            debug!(%origin, radius_km, "Radius search");
            SearchOutcome::Nearby(radius_search_inner(df, *origin, *radius_km, filters, config, now)?)
        }
        SearchRequest::ByFilterOnly { filters } => {
            debug!(?filters, "Filter-only search");
            SearchOutcome::Filtered(filter_search_inner(df, filters, config, now)?)
        }
    };
    Ok(outcome)
}

/// Information about an `ItemSearcher`'s configuration and state.
#[derive(Debug, Clone)]
pub struct SearcherInfo {
    pub total_items: usize,
    /// Items a public search can currently return
    pub searchable_items: usize,
    /// File the registry was loaded from, if any
    pub source: Option<PathBuf>,
    pub config: SearchConfig,
}

impl SearcherInfo {
    /// Get a human-readable summary of the searcher.
    pub fn summary(&self) -> String {
        let source = self
            .source
            .as_ref()
            .map_or_else(|| "in-memory items".to_string(), |p| p.display().to_string());
        format!(
            "ItemSearcher over {source} with {} items ({} searchable), result limit {}",
            self.total_items, self.searchable_items, self.config.limit
        )
    }
}

// === Builder Pattern ===

/// Builder for creating an `ItemSearcher` with custom configuration.
#[derive(Debug, Clone, Default)]
pub struct ItemSearcherBuilder {
    data_path: Option<PathBuf>,
    config: SearchConfig,
}

impl ItemSearcherBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load items from this CSV or Parquet file instead of the data directory.
    #[must_use]
    pub fn data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the `ItemSearcher`.
    pub fn build(self) -> Result<ItemSearcher, VigiloError> {
        let searcher = match self.data_path {
            Some(path) => ItemSearcher::from_path(path)?,
            None => ItemSearcher::new()?,
        };
        Ok(searcher.with_config(self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ItemStatus,
        item::{IncidentReport, ReportKind},
    };

    fn stolen_bike() -> Item {
        Item {
            status: ItemStatus::Stolen,
            is_public: true,
            latitude: Some(40.73),
            longitude: Some(-73.99),
            reward: 150.0,
            ..Item::register(1, 42, "Black Trek bicycle", "bicycle")
        }
    }

    fn searcher() -> ItemSearcher {
        let phone = Item {
            status: ItemStatus::Lost,
            is_public: true,
            latitude: Some(40.7128),
            longitude: Some(-74.006),
            reward: 50.0,
            ..Item::register(2, 7, "iPhone", "electronics")
        };
        let helmet = Item::register(3, 42, "Helmet", "bicycle");
        ItemSearcher::from_items(&[stolen_bike(), phone, helmet]).unwrap()
    }

    #[test]
    fn test_dual_mode_outcomes() {
        let searcher = searcher();

        let nearby = searcher
            .search(&SearchRequest::by_radius(40.73, -73.99, 10, SearchFilters::new()).unwrap())
            .unwrap();
        assert!(matches!(nearby, SearchOutcome::Nearby(_)));
        assert_eq!(nearby.ids(), vec![1, 2]);

        let filtered = searcher.search(&SearchRequest::filter_only(SearchFilters::new())).unwrap();
        assert!(matches!(filtered, SearchOutcome::Filtered(_)));
        assert_eq!(filtered.ids(), vec![1, 2]);
    }

    #[test]
    fn test_mark_found_removes_item_from_search() {
        let searcher = searcher();
        assert_eq!(searcher.nearby(40.73, -73.99, 1).unwrap().len(), 1);

        let updated = searcher.apply(1, 42, Transition::MarkFound).unwrap();
        assert_eq!(updated.status, ItemStatus::Found);

        assert!(searcher.nearby(40.73, -73.99, 1).unwrap().is_empty());
        assert_eq!(searcher.len(), 3);
        assert_eq!(searcher.get(1).unwrap().unwrap().status, ItemStatus::Found);
    }

    #[test]
    fn test_report_makes_item_searchable() {
        let searcher = searcher();
        let report = IncidentReport::new(ReportKind::Lost)
            .at(Coordinates::new(40.7306, -73.9866).unwrap(), "East Village")
            .public();
        searcher.apply(3, 42, Transition::Report(report)).unwrap();

        let ids: Vec<_> = searcher
            .nearby(40.7306, -73.9866, 1)
            .unwrap()
            .into_iter()
            .map(|hit| hit.item.id)
            .collect();
        assert!(ids.contains(&3));
    }

    #[test]
    fn test_rejected_transition_leaves_registry_untouched() {
        let searcher = searcher();
        let err = searcher.apply(1, 7, Transition::MarkFound).unwrap_err();
        assert!(matches!(err, VigiloError::LifecycleError(LifecycleError::NotOwner { .. })));

        let err = searcher.apply(99, 42, Transition::Archive).unwrap_err();
        assert!(matches!(err, VigiloError::LifecycleError(LifecycleError::UnknownItem(99))));

        assert_eq!(searcher.get(1).unwrap(), Some(stolen_bike()));
    }

    #[test]
    fn test_bulk_preserves_order() {
        let searcher = searcher();
        let requests = vec![
            SearchRequest::filter_only(SearchFilters::new().category("electronics")),
            SearchRequest::by_radius(40.73, -73.99, 1, SearchFilters::new()).unwrap(),
            SearchRequest::filter_only(SearchFilters::new().text("nothing like this")),
        ];
        let outcomes = searcher.search_bulk(&requests).unwrap();
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].ids(), vec![2]);
        assert_eq!(outcomes[1].ids(), vec![1]);
        assert!(outcomes[2].is_empty());
    }

    #[test]
    fn test_info_counts_searchable_items() {
        let info = searcher().info().unwrap();
        assert_eq!(info.total_items, 3);
        assert_eq!(info.searchable_items, 2);
        assert!(info.summary().contains("in-memory items"));
    }
}
