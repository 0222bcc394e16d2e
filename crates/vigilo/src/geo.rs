//! Great-circle distance on a spherical Earth.
//!
//! [`haversine_distance_km`] is the single source of truth for distances in
//! search results. It keeps the spherical-law-of-cosines form (and the 6371 km
//! radius) the item registry has always used, so distances stay comparable with
//! values computed by older clients.

use std::fmt;

use crate::search::SearchError;

/// Mean Earth radius used by every distance computation.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Padding added to bounding boxes so rounding never drops a boundary match.
const BOUNDING_BOX_MARGIN_DEG: f64 = 1e-6;

/// A validated latitude/longitude pair in decimal degrees.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    lat: f64,
    lng: f64,
}

impl Coordinates {
    /// Latitude must lie in `[-90, 90]`, longitude in `[-180, 180]`.
    pub fn new(lat: f64, lng: f64) -> Result<Self, SearchError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(SearchError::InvalidArgument(format!(
                "latitude must be between -90 and 90, got {lat}"
            )));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(SearchError::InvalidArgument(format!(
                "longitude must be between -180 and 180, got {lng}"
            )));
        }
        Ok(Self { lat, lng })
    }

    #[must_use]
    pub fn lat(&self) -> f64 {
        self.lat
    }

    #[must_use]
    pub fn lng(&self) -> f64 {
        self.lng
    }

    /// Distance to `other` in kilometres.
    #[must_use]
    pub fn distance_km(&self, other: &Self) -> f64 {
        haversine_distance_km(*self, *other)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lat, self.lng)
    }
}

/// Great-circle distance between two points, in kilometres.
///
/// ```text
/// 6371 * acos(cos(φ1)·cos(φ2)·cos(λ2 − λ1) + sin(φ1)·sin(φ2))
/// ```
///
/// The `acos` argument is clamped to `[-1, 1]`; rounding pushes it just past 1
/// for (nearly) coincident points.
///
/// ```rust
/// use vigilo::{Coordinates, haversine_distance_km};
///
/// let a = Coordinates::new(40.0, -74.0)?;
/// let b = Coordinates::new(41.0, -74.0)?;
/// assert!((haversine_distance_km(a, b) - 111.19).abs() < 0.01);
/// # Ok::<(), vigilo::error::VigiloError>(())
/// ```
#[must_use]
pub fn haversine_distance_km(from: Coordinates, to: Coordinates) -> f64 {
    if from == to {
        return 0.0;
    }
    let (lat1, lng1) = (from.lat.to_radians(), from.lng.to_radians());
    let (lat2, lng2) = (to.lat.to_radians(), to.lng.to_radians());

    let cos_angle = lat1.cos() * lat2.cos() * (lng2 - lng1).cos() + lat1.sin() * lat2.sin();
    EARTH_RADIUS_KM * cos_angle.clamp(-1.0, 1.0).acos()
}

/// Latitude/longitude window that contains every point within a radius.
///
/// Used to prune candidate rows before the exact distance check. `lng_range`
/// is `None` when the circle touches a pole or crosses the antimeridian; the
/// longitude is then left unconstrained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub lng_range: Option<(f64, f64)>,
}

impl BoundingBox {
    #[must_use]
    pub fn around(center: Coordinates, radius_km: f64) -> Self {
        let angular_radius = radius_km / EARTH_RADIUS_KM;
        let delta_lat = angular_radius.to_degrees() + BOUNDING_BOX_MARGIN_DEG;

        let min_lat = center.lat - delta_lat;
        let max_lat = center.lat + delta_lat;

        if min_lat <= -90.0 || max_lat >= 90.0 || angular_radius >= std::f64::consts::FRAC_PI_2 {
            return Self {
                min_lat: min_lat.max(-90.0),
                max_lat: max_lat.min(90.0),
                lng_range: None,
            };
        }

        let delta_lng = (angular_radius.sin() / center.lat.to_radians().cos())
            .clamp(-1.0, 1.0)
            .asin()
            .to_degrees()
            + BOUNDING_BOX_MARGIN_DEG;
        let min_lng = center.lng - delta_lng;
        let max_lng = center.lng + delta_lng;

        let lng_range = (min_lng >= -180.0 && max_lng <= 180.0).then_some((min_lng, max_lng));
        Self {
            min_lat,
            max_lat,
            lng_range,
        }
    }

    #[must_use]
    pub fn contains(&self, point: Coordinates) -> bool {
        let lat_ok = (self.min_lat..=self.max_lat).contains(&point.lat);
        let lng_ok = self
            .lng_range
            .is_none_or(|(min, max)| (min..=max).contains(&point.lng));
        lat_ok && lng_ok
    }
}
