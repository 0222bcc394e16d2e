//! Integration tests for Vigilo item search
//!
//! These tests run against the full public API over the generated sample
//! registry (items around New York, London, Fiji and the North Pole).

use vigilo::{
    Coordinates, IncidentReport, ItemSearcher, ItemSearcherBuilder, ItemStatus, LifecycleError,
    ReportKind, SearchConfigBuilder, SearchError, SearchFilters, SearchOutcome, SearchRequest,
    Transition,
    data_processing::{TestDataConfig, create_test_data, processed::process_csv_to_parquet},
    error::VigiloError,
    haversine_distance_km,
};

const NYC: (f64, f64) = (40.7128, -74.0060);

fn setup_test_env() {
    let _ = vigilo::init_logging(tracing::Level::WARN);
}

fn sample_searcher() -> ItemSearcher {
    setup_test_env();
    let fixture = create_test_data(&TestDataConfig::sample()).expect("Should write fixture");
    let dir = tempfile::TempDir::new().unwrap();
    let parquet = dir.path().join("items.parquet");
    process_csv_to_parquet(fixture.path(), &parquet).expect("Should process fixture");

    ItemSearcherBuilder::new()
        .data_path(&parquet)
        .build()
        .expect("Should create searcher")
}

fn radius(lat: f64, lng: f64, km: i64) -> SearchRequest {
    SearchRequest::by_radius(lat, lng, km, SearchFilters::new()).unwrap()
}

#[test]
fn test_nearby_ordering_around_lower_manhattan() {
    let searcher = sample_searcher();
    let hits = searcher.nearby(NYC.0, NYC.1, 10).unwrap();

    let ids: Vec<_> = hits.iter().map(|hit| hit.item.id).collect();
    // Phone and tablet share a spot and a reward; the newer report wins
    assert_eq!(ids, vec![2, 15, 1, 9]);
    assert_eq!(hits[0].distance_km, 0.0);
    assert!((hits[2].distance_km - 2.567).abs() < 1e-2);
    assert!((hits[3].distance_km - 5.31).abs() < 1e-2);
}

#[test]
fn test_every_hit_is_within_radius_and_sorted() {
    let searcher = sample_searcher();

    for km in [1, 3, 5, 10, 50, 100, 6_000, 20_100] {
        let hits = searcher.nearby(NYC.0, NYC.1, km).unwrap();
        let origin = Coordinates::new(NYC.0, NYC.1).unwrap();

        for hit in &hits {
            assert!(hit.distance_km <= km as f64 + 1e-6, "{} beyond {km} km", hit.item);
            let point = hit.item.coordinates().expect("hits always have coordinates");
            assert!((haversine_distance_km(origin, point) - hit.distance_km).abs() < 1e-9);
        }
        assert!(
            hits.windows(2).all(|w| w[0].distance_km <= w[1].distance_km),
            "distances should be non-decreasing for {km} km"
        );
    }
}

#[test]
fn test_ineligible_items_never_appear() {
    let searcher = sample_searcher();
    let hits = searcher.nearby(NYC.0, NYC.1, 20_100).unwrap();

    for hit in &hits {
        assert!(hit.item.is_public, "{} is private", hit.item);
        assert!(hit.item.status.is_searchable(), "{} is {}", hit.item, hit.item.status);
        assert!(hit.item.latitude.is_some() && hit.item.longitude.is_some());
    }
    let ids: Vec<_> = hits.iter().map(|hit| hit.item.id).collect();
    for excluded in [5, 6, 7, 8, 14, 16] {
        assert!(!ids.contains(&excluded), "item {excluded} should be excluded");
    }
}

#[test]
fn test_reference_points_from_the_item_registry() {
    let searcher = sample_searcher();

    // Wallet ~0.14 km away is included, dog collar ~111 km away is not
    let hits = searcher.nearby(40.0, -74.0, 5).unwrap();
    let ids: Vec<_> = hits.iter().map(|hit| hit.item.id).collect();
    assert_eq!(ids, vec![3]);
    assert!((hits[0].distance_km - 0.14).abs() < 1e-2);
}

#[test]
fn test_non_positive_radius_is_rejected() {
    let searcher = sample_searcher();

    for km in [0, -5] {
        let err = searcher.nearby(NYC.0, NYC.1, km).unwrap_err();
        assert!(matches!(err, VigiloError::SearchError(SearchError::InvalidArgument(_))));
    }
}

#[test]
fn test_filter_only_mode() {
    let searcher = sample_searcher();
    let outcome = searcher.search(&SearchRequest::filter_only(SearchFilters::new())).unwrap();

    let SearchOutcome::Filtered(items) = &outcome else {
        panic!("filter-only requests produce filtered results");
    };
    assert!(outcome.distances().is_none());
    let ids: Vec<_> = items.iter().map(|item| item.id).collect();
    assert_eq!(ids, vec![10, 1, 9, 11, 2, 15, 12, 3, 13, 4]);
}

#[test]
fn test_filters_narrow_both_modes() {
    let searcher = sample_searcher();

    let request = SearchRequest::filter_only(SearchFilters::new().text("WALLET"));
    assert_eq!(searcher.search(&request).unwrap().ids(), vec![12, 3]);

    let request = SearchRequest::filter_only(SearchFilters::new().city("new york"));
    assert_eq!(searcher.search(&request).unwrap().ids(), vec![1, 9, 2, 15, 4]);

    let request = SearchRequest::filter_only(SearchFilters::new().city("brooklyn"));
    assert!(searcher.search(&request).unwrap().is_empty());

    let request =
        SearchRequest::by_radius(NYC.0, NYC.1, 10, SearchFilters::new().category("electronics")).unwrap();
    assert_eq!(searcher.search(&request).unwrap().ids(), vec![2, 15]);
}

#[test]
fn test_date_window() {
    let searcher = sample_searcher();

    let request = SearchRequest::filter_only(SearchFilters::new().within_days(7));
    assert_eq!(searcher.search(&request).unwrap().ids(), vec![1, 2, 3]);

    // Zero days means all time
    let request = SearchRequest::filter_only(SearchFilters::new().within_days(0));
    assert_eq!(searcher.search(&request).unwrap().len(), 10);
}

#[test]
fn test_from_params_dispatch() {
    let searcher = sample_searcher();

    let request = SearchRequest::from_params(Some(NYC.0), Some(NYC.1), None, SearchFilters::new(), 10).unwrap();
    assert!(matches!(searcher.search(&request).unwrap(), SearchOutcome::Nearby(_)));

    let request = SearchRequest::from_params(None, None, None, SearchFilters::new(), 10).unwrap();
    assert!(matches!(searcher.search(&request).unwrap(), SearchOutcome::Filtered(_)));

    assert!(SearchRequest::from_params(Some(NYC.0), None, None, SearchFilters::new(), 10).is_err());
}

#[test]
fn test_antimeridian_and_pole() {
    let searcher = sample_searcher();

    let hits = searcher.nearby(-16.5, 179.99, 5).unwrap();
    let ids: Vec<_> = hits.iter().map(|hit| hit.item.id).collect();
    assert_eq!(ids, vec![11, 12]);
    assert!((hits[1].distance_km - 2.132).abs() < 1e-2);

    let hits = searcher.nearby(89.99, 180.0, 3).unwrap();
    let ids: Vec<_> = hits.iter().map(|hit| hit.item.id).collect();
    assert_eq!(ids, vec![13]);
    assert!((hits[0].distance_km - 2.224).abs() < 1e-2);

    let hits = searcher.nearby(90.0, 0.0, 2).unwrap();
    assert_eq!(hits.len(), 1, "harness is ~1.1 km from the pole");
}

#[test]
fn test_bulk_search_matches_sequential() {
    let searcher = sample_searcher();
    let requests = vec![
        radius(NYC.0, NYC.1, 10),
        SearchRequest::filter_only(SearchFilters::new().text("wallet")),
        radius(51.5074, -0.1278, 1),
        radius(0.0, 0.0, 1),
    ];

    let bulk = searcher.search_bulk(&requests).unwrap();
    let sequential: Vec<_> = requests.iter().map(|r| searcher.search(r).unwrap()).collect();
    assert_eq!(bulk, sequential);
    assert_eq!(bulk[2].ids(), vec![10]);
    assert!(bulk[3].is_empty());
}

#[test]
fn test_lifecycle_changes_are_visible_to_search() {
    let searcher = sample_searcher();

    // Only the owner can close a report
    let err = searcher.apply(2, 99, Transition::MarkFound).unwrap_err();
    assert!(matches!(err, VigiloError::LifecycleError(LifecycleError::NotOwner { .. })));

    let found = searcher.apply(2, 2, Transition::MarkFound).unwrap();
    assert_eq!(found.status, ItemStatus::Found);
    assert!(!found.is_public);

    let ids: Vec<_> = searcher
        .nearby(NYC.0, NYC.1, 10)
        .unwrap()
        .into_iter()
        .map(|hit| hit.item.id)
        .collect();
    assert_eq!(ids, vec![15, 1, 9]);

    // The helmet goes missing and shows up on the map
    let helmet = searcher.get(14).unwrap().expect("helmet is registered");
    let report = IncidentReport::new(ReportKind::Stolen)
        .at(Coordinates::new(40.7306, -73.9866).unwrap(), "East Village, New York")
        .reward(25.0)
        .public();
    searcher.apply(14, helmet.owner_id, Transition::Report(report)).unwrap();

    let hits = searcher.nearby(40.7306, -73.9866, 1).unwrap();
    assert!(hits.iter().any(|hit| hit.item.id == 14));
}

#[test]
fn test_configured_limit() {
    let searcher = sample_searcher().with_config(SearchConfigBuilder::compact().limit(3).build());
    assert_eq!(searcher.config().limit, 3);

    let outcome = searcher.search(&radius(NYC.0, NYC.1, 20_100)).unwrap();
    assert_eq!(outcome.len(), 3);
    assert_eq!(outcome.ids(), vec![2, 15, 1]);
}

#[test]
fn test_missing_data_file() {
    setup_test_env();
    let dir = tempfile::TempDir::new().unwrap();
    let result = ItemSearcher::from_path(dir.path().join("missing.parquet"));
    assert!(matches!(result, Err(VigiloError::DataProcessing(_))));
}

#[cfg(not(feature = "test_data"))]
#[test]
fn test_default_store_does_not_fall_back_to_fixtures() {
    // Fixture fallback is the data crate's own unit-test behaviour; here it
    // needs the `test_data` feature.
    assert!(!vigilo::data_processing::should_use_test_data());
}
