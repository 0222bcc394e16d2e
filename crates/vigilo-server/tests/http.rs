//! End-to-end tests of the HTTP surface over the generated sample registry.

use std::sync::Arc;

use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use serde_json::Value;
use tower::ServiceExt;
use vigilo::ItemSearcher;
use vigilo_data_processing::{TestDataConfig, create_test_data, processed::process_csv_to_parquet};
use vigilo_server::{app, config::Config, state::AppState};

/// Builds the state with blocking polars IO, so call it off the async runtime.
fn sample_state() -> Arc<AppState> {
    let _ = vigilo::init_logging(tracing::Level::WARN);
    let fixture = create_test_data(&TestDataConfig::sample()).expect("Should write fixture");
    let dir = tempfile::TempDir::new().unwrap();
    let parquet = dir.path().join("items.parquet");
    process_csv_to_parquet(fixture.path(), &parquet).expect("Should process fixture");

    let config = Config::default();
    let searcher = ItemSearcher::from_path(&parquet)
        .expect("Should create searcher")
        .with_config(config.search_config().unwrap());
    AppState::from_searcher(searcher, config)
}

async fn get(uri: &str) -> (StatusCode, Value) {
    let state = tokio::task::spawn_blocking(sample_state).await.unwrap();
    let response = app(state)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice::<Value>(&bytes).unwrap_or_else(|_| {
        Value::String(String::from_utf8_lossy(&bytes).into_owned())
    });
    (status, body)
}

fn ids(body: &Value) -> Vec<u64> {
    body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_u64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_health() {
    let (status, body) = get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".into()));
}

#[tokio::test]
async fn test_radius_search() {
    let (status, body) = get("/items/search?lat=40.7128&lng=-74.0060&radius=10").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 4);
    assert_eq!(ids(&body), vec![2, 15, 1, 9]);

    let first = &body["items"][0];
    assert_eq!(first["distance"], 0.0);
    assert_eq!(first["url"], "/items/2");
    assert_eq!(first["status"], "lost");
    assert_eq!(first["location"], "Lower Manhattan, New York");
    let bike = body["items"][2]["distance"].as_f64().unwrap();
    assert!((bike - 2.567).abs() < 1e-2);
}

#[tokio::test]
async fn test_filter_only_search_has_no_distance() {
    let (status, body) = get("/items/search?q=wallet").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![12, 3]);
    for item in body["items"].as_array().unwrap() {
        assert!(item.get("distance").is_none());
    }
}

#[tokio::test]
async fn test_blank_params_fall_back_to_filter_only() {
    let (status, body) = get("/items/search?lat=&lng=&radius=&q=&category=&date_range=").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![10, 1, 9, 11, 2, 15, 12, 3, 13, 4]);
}

#[tokio::test]
async fn test_address_is_city_alias() {
    let (_, by_city) = get("/items/search?city=new%20york").await;
    let (_, by_address) = get("/items/search?address=new%20york").await;
    assert_eq!(ids(&by_city), vec![1, 9, 2, 15, 4]);
    assert_eq!(ids(&by_city), ids(&by_address));
}

#[tokio::test]
async fn test_date_range() {
    let (status, body) = get("/items/search?date_range=7").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![1, 2, 3]);

    let reported = body["items"][0]["reported_date"].as_str().unwrap();
    assert!(chrono::NaiveDateTime::parse_from_str(reported, "%Y-%m-%d %H:%M:%S").is_ok());
}

#[tokio::test]
async fn test_invalid_arguments_are_bad_requests() {
    for uri in [
        "/items/search?lat=40.7&lng=-74.0&radius=0",
        "/items/search?lat=40.7&lng=-74.0&radius=-3",
        "/items/search?lat=40.7",
        "/items/search?lat=95&lng=0",
        "/items/search?date_range=-1",
        "/items/search?lat=abc&lng=-74.0",
    ] {
        let (status, body) = get(uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["success"], false, "{uri}");
        assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()), "{uri}");
    }
}

#[tokio::test]
async fn test_nearby_endpoint() {
    let (status, body) = get("/api/items/nearby?lat=51.5074&lng=-0.1278&radius=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![10]);

    let (status, body) = get("/api/items/nearby?q=wallet").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_default_radius() {
    let (status, body) = get("/api/items/nearby?lat=40.7128&lng=-74.0060").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![2, 15, 1, 9]);
}
