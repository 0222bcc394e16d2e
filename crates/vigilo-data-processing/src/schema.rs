//! Column layout of the `items` table.
//!
//! The raw CSV export and the processed Parquet cache share this layout. Every
//! frame handed to the search layer has exactly these columns, in this order,
//! with these dtypes.

use polars::prelude::*;

pub const ID: &str = "id";
pub const OWNER_ID: &str = "owner_id";
pub const NAME: &str = "name";
pub const CATEGORY: &str = "category";
pub const BRAND: &str = "brand";
pub const DESCRIPTION: &str = "description";
pub const STATUS: &str = "status";
pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";
pub const INCIDENT_LOCATION: &str = "incident_location";
pub const REWARD: &str = "reward";
pub const IS_PUBLIC: &str = "is_public";
/// Unix seconds, UTC.
pub const REPORTED_AT: &str = "reported_at";
/// `|`-separated photo paths.
pub const PHOTOS: &str = "photos";

pub const PHOTO_SEPARATOR: &str = "|";

/// Every status an item row may carry.
pub const STATUS_VALUES: [&str; 7] = [
    "active", "lost", "stolen", "damaged", "sold", "archived", "found",
];

pub const ITEM_COLUMNS: [(&str, DataType); 14] = [
    (ID, DataType::UInt64),
    (OWNER_ID, DataType::UInt64),
    (NAME, DataType::String),
    (CATEGORY, DataType::String),
    (BRAND, DataType::String),
    (DESCRIPTION, DataType::String),
    (STATUS, DataType::String),
    (LATITUDE, DataType::Float64),
    (LONGITUDE, DataType::Float64),
    (INCIDENT_LOCATION, DataType::String),
    (REWARD, DataType::Float64),
    (IS_PUBLIC, DataType::Boolean),
    (REPORTED_AT, DataType::Int64),
    (PHOTOS, DataType::String),
];

/// Columns that may never contain nulls after processing.
pub const NON_NULL_COLUMNS: [&str; 7] = [ID, OWNER_ID, NAME, CATEGORY, STATUS, REWARD, IS_PUBLIC];

pub fn item_schema() -> Schema {
    ITEM_COLUMNS
        .into_iter()
        .map(|(name, dtype)| Field::new(name.into(), dtype))
        .collect()
}

pub fn column_names() -> Vec<&'static str> {
    ITEM_COLUMNS.into_iter().map(|(name, _)| name).collect()
}
