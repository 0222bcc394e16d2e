use tracing::debug;

use super::{Result, SearchError};
use crate::geo::Coordinates;

/// Optional narrowing applied in both search modes.
///
/// Empty or whitespace-only strings count as "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilters {
    /// Case-insensitive substring of name, description or brand
    pub text: Option<String>,
    /// Exact category
    pub category: Option<String>,
    /// Case-insensitive substring of the incident location
    pub city: Option<String>,
    /// Only items reported within this many days
    pub within_days: Option<u32>,
}

impl SearchFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: impl AsRef<str>) -> Self {
        self.text = non_blank(text.as_ref());
        self
    }

    pub fn category(mut self, category: impl AsRef<str>) -> Self {
        self.category = non_blank(category.as_ref());
        self
    }

    pub fn city(mut self, city: impl AsRef<str>) -> Self {
        self.city = non_blank(city.as_ref());
        self
    }

    /// Restrict to recent reports. `0` means all time.
    pub fn within_days(mut self, days: u32) -> Self {
        self.within_days = (days > 0).then_some(days);
        self
    }

    /// Like [`Self::within_days`] but for a raw query value, rejecting negatives.
    pub fn date_range(self, days: i64) -> Result<Self> {
        let days = u32::try_from(days).map_err(|_| {
            SearchError::InvalidArgument(format!(
                "date range must be a non-negative number of days, got {days}"
            ))
        })?;
        Ok(self.within_days(days))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// A search over the item registry.
///
/// The variant decides both how results are ranked and what they carry: a
/// radius search annotates every hit with its distance, a filter-only search
/// has no reference point and therefore no distances.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchRequest {
    /// Eligible items within `radius_km` of `origin`, nearest first
    ByRadius {
        origin: Coordinates,
        radius_km: u32,
        filters: SearchFilters,
    },
    /// Eligible items matching the filters, highest reward first
    ByFilterOnly { filters: SearchFilters },
}

impl SearchRequest {
    /// Radius search around `(lat, lng)`.
    ///
    /// ```rust
    /// use vigilo::{SearchFilters, SearchRequest};
    ///
    /// assert!(SearchRequest::by_radius(40.0, -74.0, 5, SearchFilters::new()).is_ok());
    /// assert!(SearchRequest::by_radius(40.0, -74.0, 0, SearchFilters::new()).is_err());
    /// ```
    pub fn by_radius(lat: f64, lng: f64, radius_km: i64, filters: SearchFilters) -> Result<Self> {
        Ok(Self::ByRadius {
            origin: Coordinates::new(lat, lng)?,
            radius_km: validate_radius(radius_km)?,
            filters,
        })
    }

    pub fn filter_only(filters: SearchFilters) -> Self {
        Self::ByFilterOnly { filters }
    }

    /// Pick the variant from raw, optional query values.
    ///
    /// Both coordinates select [`SearchRequest::ByRadius`] (with
    /// `default_radius_km` when no radius is given); neither selects
    /// [`SearchRequest::ByFilterOnly`]. A lone coordinate, or a radius that is
    /// not positive, is rejected.
    pub fn from_params(
        lat: Option<f64>,
        lng: Option<f64>,
        radius_km: Option<i64>,
        filters: SearchFilters,
        default_radius_km: u32,
    ) -> Result<Self> {
        let radius_km = radius_km.map(validate_radius).transpose()?;

        match (lat, lng) {
            (Some(lat), Some(lng)) => Ok(Self::ByRadius {
                origin: Coordinates::new(lat, lng)?,
                radius_km: radius_km.unwrap_or(default_radius_km),
                filters,
            }),
            (None, None) => {
                if radius_km.is_some() {
                    debug!("Radius given without coordinates, running filter-only search");
                }
                Ok(Self::ByFilterOnly { filters })
            }
            (Some(_), None) => Err(SearchError::InvalidArgument(
                "longitude is required when latitude is given".to_string(),
            )),
            (None, Some(_)) => Err(SearchError::InvalidArgument(
                "latitude is required when longitude is given".to_string(),
            )),
        }
    }

    #[must_use]
    pub fn filters(&self) -> &SearchFilters {
        match self {
            Self::ByRadius { filters, .. } | Self::ByFilterOnly { filters } => filters,
        }
    }

    #[must_use]
    pub fn is_by_radius(&self) -> bool {
        matches!(self, Self::ByRadius { .. })
    }
}

pub(crate) fn validate_radius(radius_km: i64) -> Result<u32> {
    if radius_km <= 0 {
        return Err(SearchError::InvalidArgument(format!(
            "radius must be a positive number of kilometres, got {radius_km}"
        )));
    }
    u32::try_from(radius_km).map_err(|_| {
        SearchError::InvalidArgument(format!("radius {radius_km} km is too large"))
    })
}
