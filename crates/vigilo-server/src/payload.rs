//! Query parameters and JSON bodies of the search endpoints.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, de};
use vigilo::{Item, SearchError, SearchFilters, SearchOutcome, SearchRequest};

const REPORTED_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Query string shared by `/items/search` and `/api/items/nearby`.
///
/// Blank values count as absent, so a map form submitted with empty fields
/// behaves like one that omits them.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub lng: Option<f64>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub radius: Option<i64>,
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    /// Alias of `city`
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub date_range: Option<i64>,
}

impl SearchParams {
    pub fn has_coordinates(&self) -> bool {
        self.lat.is_some() && self.lng.is_some()
    }

    pub fn filters(&self) -> Result<SearchFilters, SearchError> {
        let mut filters = SearchFilters::new();
        if let Some(q) = &self.q {
            filters = filters.text(q);
        }
        if let Some(category) = &self.category {
            filters = filters.category(category);
        }
        if let Some(city) = self.city.as_ref().or(self.address.as_ref()) {
            filters = filters.city(city);
        }
        if let Some(days) = self.date_range {
            filters = filters.date_range(days)?;
        }
        Ok(filters)
    }

    pub fn to_request(&self, default_radius_km: u32) -> Result<SearchRequest, SearchError> {
        SearchRequest::from_params(
            self.lat,
            self.lng,
            self.radius,
            self.filters()?,
            default_radius_km,
        )
    }
}

fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(de::Error::custom),
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub success: bool,
    pub count: usize,
    pub items: Vec<ItemPayload>,
}

impl SearchResponse {
    pub fn from_outcome(outcome: SearchOutcome, url_prefix: &str) -> Self {
        let items: Vec<_> = match outcome {
            SearchOutcome::Nearby(hits) => hits
                .into_iter()
                .map(|hit| ItemPayload::new(hit.item, Some(hit.distance_km), url_prefix))
                .collect(),
            SearchOutcome::Filtered(items) => items
                .into_iter()
                .map(|item| ItemPayload::new(item, None, url_prefix))
                .collect(),
        };

        Self {
            success: true,
            count: items.len(),
            items,
        }
    }
}

/// One item as the map view renders it.
#[derive(Debug, Serialize, Deserialize)]
pub struct ItemPayload {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub brand: Option<String>,
    pub location: Option<String>,
    /// `YYYY-MM-DD HH:MM:SS`, UTC
    pub reported_date: Option<String>,
    pub reward: f64,
    pub status: String,
    /// Kilometres from the search origin; absent in filter-only results
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub photos: Vec<String>,
    pub url: String,
}

impl ItemPayload {
    pub fn new(item: Item, distance: Option<f64>, url_prefix: &str) -> Self {
        Self {
            url: format!("{url_prefix}{}", item.id),
            id: item.id,
            name: item.name,
            description: item.description,
            category: item.category,
            brand: item.brand,
            location: item.incident_location,
            reported_date: item
                .reported_at
                .map(|at| at.format(REPORTED_DATE_FORMAT).to_string()),
            reward: item.reward,
            status: item.status.to_string(),
            distance,
            lat: item.latitude,
            lng: item.longitude,
            photos: item.photos,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}
