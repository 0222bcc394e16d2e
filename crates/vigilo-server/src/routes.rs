use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use tracing::debug;
use vigilo::{SearchOutcome, SearchRequest};

use crate::{
    error::AppError,
    payload::{SearchParams, SearchResponse},
    state::AppState,
};

/// `GET /items/search`: radius search when coordinates are given, filter-only otherwise.
pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<SearchResponse>, AppError> {
    let Query(params) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let request = params.to_request(state.config.default_radius_km)?;

    respond(state, request).await
}

/// `GET /api/items/nearby`: radius search only.
pub async fn nearby_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<SearchResponse>, AppError> {
    let Query(params) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    if !params.has_coordinates() {
        return Err(AppError::BadRequest(
            "lat and lng are required".to_string(),
        ));
    }
    let request = params.to_request(state.config.default_radius_km)?;

    respond(state, request).await
}

pub async fn health_handler() -> &'static str {
    "ok"
}

async fn respond(state: Arc<AppState>, request: SearchRequest) -> Result<Json<SearchResponse>, AppError> {
    debug!(?request, "Dispatching search");
    let searcher_state = Arc::clone(&state);
    let outcome: SearchOutcome =
        tokio::task::spawn_blocking(move || searcher_state.searcher.search(&request)).await??;

    Ok(Json(SearchResponse::from_outcome(
        outcome,
        &state.config.item_url_prefix,
    )))
}
