use chrono::{DateTime, Utc};
use polars::prelude::*;
use tracing::debug;
use vigilo_data_processing::schema;

use super::{
    Result, SearchFilters,
    filters::{bounding_box_expr, eligible_expr, filters_expr},
    outcome::NearbyItem,
};
use crate::{
    SearchConfig,
    geo::{BoundingBox, Coordinates},
    item::Item,
};

const DISTANCE_COL: &str = "distance_km";

/// Eligible items within `radius_km` of `origin`.
///
/// Ordered by distance, then reward (highest first), then report time (newest
/// first), and capped at `config.limit`.
pub fn radius_search_inner(
    data: impl IntoLazy,
    origin: Coordinates,
    radius_km: u32,
    filters: &SearchFilters,
    config: &SearchConfig,
    now: DateTime<Utc>,
) -> Result<Vec<NearbyItem>> {
    let radius = f64::from(radius_km);
    let mut lf = data.lazy().filter(eligible_expr().and(filters_expr(filters, now)));

    if config.bounding_box_prefilter {
        let bbox = BoundingBox::around(origin, radius);
        debug!(?bbox, "Applying bounding box prefilter");
        lf = lf.filter(bounding_box_expr(&bbox));
    }

    let mut candidates = lf.collect()?;
    debug!(candidates = candidates.height(), "Computing distances");

    let distances = distance_column(&candidates, origin)?;
    candidates.with_column(distances.into_series())?;

    let limit = IdxSize::try_from(config.limit).unwrap_or(IdxSize::MAX);
    let hits = candidates
        .lazy()
        .filter(col(DISTANCE_COL).lt_eq(lit(radius)))
        .sort(
            [DISTANCE_COL, schema::REWARD, schema::REPORTED_AT],
            SortMultipleOptions::default()
                .with_order_descending_multi([false, true, true])
                .with_nulls_last(true)
                .with_maintain_order(true),
        )
        .limit(limit)
        .collect()?;

    let items = Item::from_df(&hits)?;
    let distances = hits.column(DISTANCE_COL)?.f64()?;

    Ok(items
        .into_iter()
        .zip(distances.into_iter())
        .map(|(item, distance_km)| NearbyItem {
            item,
            distance_km: distance_km.unwrap_or_default(),
        })
        .collect())
}

/// Distance of every row from `origin`; null where the row has no usable coordinates.
fn distance_column(df: &DataFrame, origin: Coordinates) -> Result<Float64Chunked> {
    let lats = df.column(schema::LATITUDE)?.f64()?;
    let lngs = df.column(schema::LONGITUDE)?.f64()?;

    let distances: Float64Chunked = lats
        .into_iter()
        .zip(lngs.into_iter())
        .map(|(lat, lng)| {
            let point = Coordinates::new(lat?, lng?).ok()?;
            Some(origin.distance_km(&point))
        })
        .collect();

    Ok(distances.with_name(DISTANCE_COL.into()))
}
