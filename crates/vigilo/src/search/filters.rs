use chrono::{DateTime, Duration, Utc};
use polars::prelude::*;
use vigilo_data_processing::schema;

use super::SearchFilters;
use crate::{geo::BoundingBox, item::ItemStatus};

/// Rows the public may see: listed, lost or stolen, and placed on the map.
pub fn eligible_expr() -> Expr {
    let searchable: Vec<&str> = ItemStatus::ALL
        .iter()
        .filter(|status| status.is_searchable())
        .map(ItemStatus::as_str)
        .collect();

    col(schema::IS_PUBLIC)
        .eq(lit(true))
        .and(
            col(schema::STATUS).is_in(
                lit(Series::new("searchable_status".into(), searchable)).implode(),
                false,
            ),
        )
        .and(col(schema::LATITUDE).is_not_null())
        .and(col(schema::LONGITUDE).is_not_null())
}

/// Combine the optional filters into one predicate. `now` anchors the date window.
pub fn filters_expr(filters: &SearchFilters, now: DateTime<Utc>) -> Expr {
    let mut parts = Vec::new();

    if let Some(text) = &filters.text {
        let needle = text.to_lowercase();
        let text_match = [schema::NAME, schema::DESCRIPTION, schema::BRAND]
            .into_iter()
            .map(|column| contains_ignore_case(column, &needle))
            .reduce(|acc, expr| acc.or(expr))
            .unwrap_or(lit(false));
        parts.push(text_match);
    }

    if let Some(category) = &filters.category {
        parts.push(col(schema::CATEGORY).eq(lit(category.clone())));
    }

    if let Some(city) = &filters.city {
        parts.push(contains_ignore_case(schema::INCIDENT_LOCATION, &city.to_lowercase()));
    }

    if let Some(days) = filters.within_days {
        let cutoff = now
            .checked_sub_signed(Duration::days(i64::from(days)))
            .map_or(i64::MIN, |t| t.timestamp());
        // Null timestamps compare as null and drop out of the filter
        parts.push(col(schema::REPORTED_AT).gt_eq(lit(cutoff)));
    }

    parts.into_iter().reduce(|acc, expr| acc.and(expr)).unwrap_or(lit(true))
}

/// Cheap latitude/longitude window. Every point within the radius passes.
pub fn bounding_box_expr(bbox: &BoundingBox) -> Expr {
    let lat_band = col(schema::LATITUDE)
        .gt_eq(lit(bbox.min_lat))
        .and(col(schema::LATITUDE).lt_eq(lit(bbox.max_lat)));

    match bbox.lng_range {
        Some((min_lng, max_lng)) => lat_band.and(
            col(schema::LONGITUDE)
                .gt_eq(lit(min_lng))
                .and(col(schema::LONGITUDE).lt_eq(lit(max_lng))),
        ),
        None => lat_band,
    }
}

fn contains_ignore_case(column: &str, needle_lowercase: &str) -> Expr {
    col(column)
        .str()
        .to_lowercase()
        .str()
        .contains_literal(lit(needle_lowercase.to_string()))
        .fill_null(lit(false))
}
