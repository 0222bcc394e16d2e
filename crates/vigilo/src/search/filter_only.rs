use chrono::{DateTime, Utc};
use polars::prelude::*;
use tracing::debug;
use vigilo_data_processing::schema;

use super::{
    Result, SearchFilters,
    filters::{eligible_expr, filters_expr},
};
use crate::{SearchConfig, item::Item};

/// Eligible items matching `filters`, with no reference point.
///
/// Ordered by reward (highest first), then report time (newest first, undated
/// last), and capped at `config.limit`.
pub fn filter_search_inner(
    data: impl IntoLazy,
    filters: &SearchFilters,
    config: &SearchConfig,
    now: DateTime<Utc>,
) -> Result<Vec<Item>> {
    let limit = IdxSize::try_from(config.limit).unwrap_or(IdxSize::MAX);

    let hits = data
        .lazy()
        .filter(eligible_expr().and(filters_expr(filters, now)))
        .sort(
            [schema::REWARD, schema::REPORTED_AT],
            SortMultipleOptions::default()
                .with_order_descending_multi([true, true])
                .with_nulls_last(true)
                .with_maintain_order(true),
        )
        .limit(limit)
        .collect()?;
    debug!(hits = hits.height(), "Filter-only search complete");

    Ok(Item::from_df(&hits)?)
}
