use std::path::Path;

use polars::prelude::*;
use tracing::{debug, info, instrument};

use crate::{
    DataError,
    schema::{self, ITEM_COLUMNS, NON_NULL_COLUMNS, STATUS_VALUES},
};

pub use super::error::Result;

/// Lazily scan a CSV export of the `items` table.
///
/// Dtypes are inferred over the whole file and reconciled with
/// [`schema::item_schema`] later by [`normalize_items`], so exports that
/// write booleans as `1`/`0` or integral rewards still load.
#[instrument(name = "Scan items CSV", skip_all, level = "info")]
pub fn read_items_csv(path: impl AsRef<Path>) -> Result<LazyFrame> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(DataError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("item table not found: {}", path.display()),
        )));
    }
    info!(path = %path.display(), "Scanning items CSV");

    Ok(LazyCsvReader::new(path)
        .with_has_header(true)
        .with_infer_schema_length(None)
        .finish()?)
}

/// Select the item columns in canonical order with canonical dtypes.
///
/// Fails with [`DataError::MissingColumn`] when the input lacks a column.
/// Casts are strict: a cell that does not parse as its column's dtype (say a
/// latitude of `north`) fails the collect instead of becoming null.
pub fn normalize_items(mut lf: LazyFrame) -> Result<LazyFrame> {
    let input_schema = lf.collect_schema()?;
    let missing = ITEM_COLUMNS
        .into_iter()
        .map(|(name, _)| name)
        .find(|name| input_schema.get(name).is_none());
    if let Some(missing) = missing {
        return Err(DataError::MissingColumn(missing.to_string()));
    }

    let projection: Vec<Expr> = ITEM_COLUMNS
        .into_iter()
        .map(|(name, dtype)| col(name).strict_cast(dtype))
        .collect();

    Ok(lf.select(projection).with_columns([
        col(schema::STATUS).str().to_lowercase(),
        col(schema::REWARD).fill_null(lit(0.0)),
        col(schema::IS_PUBLIC).fill_null(lit(false)),
    ]))
}

/// Row-level checks the dtype cast cannot express.
///
/// Returns the frame unchanged when every row passes.
pub fn validate_items(df: DataFrame) -> Result<DataFrame> {
    for column in NON_NULL_COLUMNS {
        let nulls = df.column(column)?.null_count();
        if nulls > 0 {
            return Err(DataError::InvalidRow {
                row: first_null_row(&df, column)?,
                reason: format!("'{column}' must not be null ({nulls} null values)"),
            });
        }
    }

    for (row, status) in df.column(schema::STATUS)?.str()?.into_iter().enumerate() {
        if let Some(status) = status
            && !STATUS_VALUES.contains(&status)
        {
            return Err(DataError::InvalidRow {
                row,
                reason: format!("unknown status '{status}'"),
            });
        }
    }

    for (row, reward) in df.column(schema::REWARD)?.f64()?.into_iter().enumerate() {
        if let Some(reward) = reward
            && (reward < 0.0 || !reward.is_finite())
        {
            return Err(DataError::InvalidRow {
                row,
                reason: format!("reward must be a non-negative amount, got {reward}"),
            });
        }
    }

    check_range(&df, schema::LATITUDE, 90.0)?;
    check_range(&df, schema::LONGITUDE, 180.0)?;

    let unique_ids = df.column(schema::ID)?.n_unique()?;
    if unique_ids != df.height() {
        return Err(DataError::InvalidRow {
            row: 0,
            reason: format!(
                "item ids must be unique ({} rows, {unique_ids} distinct ids)",
                df.height()
            ),
        });
    }

    debug!(rows = df.height(), "Item table validated");
    Ok(df)
}

/// Non-null values of `column` must be finite and within `[-limit, limit]`.
fn check_range(df: &DataFrame, column: &str, limit: f64) -> Result<()> {
    for (row, value) in df.column(column)?.f64()?.into_iter().enumerate() {
        if let Some(value) = value
            && !(value.is_finite() && (-limit..=limit).contains(&value))
        {
            return Err(DataError::InvalidRow {
                row,
                reason: format!("{column} must be within ±{limit}, got {value}"),
            });
        }
    }
    Ok(())
}

fn first_null_row(df: &DataFrame, column: &str) -> Result<usize> {
    Ok(df
        .column(column)?
        .is_null()
        .into_iter()
        .position(|is_null| is_null == Some(true))
        .unwrap_or_default())
}

/// Scan, normalise and validate a CSV export in one go.
#[instrument(name = "Load items CSV", skip_all, level = "info")]
pub fn load_items_csv(path: impl AsRef<Path>) -> Result<DataFrame> {
    let lf = normalize_items(read_items_csv(path)?)?;
    validate_items(
        lf.sort([schema::ID], SortMultipleOptions::default())
            .collect()?,
    )
}
