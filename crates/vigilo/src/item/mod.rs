//! Items in the lost-and-found registry.
//!
//! An [`Item`] is one row of the `items` table. Conversion to and from polars
//! frames lives here so the search layer can work on columns and hand back
//! typed rows.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use polars::prelude::*;
use vigilo_data_processing::schema;

use crate::geo::Coordinates;

mod lifecycle;
pub use lifecycle::{IncidentReport, LifecycleError, ReportKind, Transition};

pub type Result<T> = std::result::Result<T, ItemError>;

#[derive(thiserror::Error, Debug)]
pub enum ItemError {
    #[error("DataFrame error: {0}")]
    DataFrame(#[from] PolarsError),
    #[error("Unknown item status '{0}'")]
    UnknownStatus(String),
    #[error("Column '{column}' is null at row {row}")]
    MissingValue { column: &'static str, row: usize },
    #[error("Timestamp {0} is out of range")]
    InvalidTimestamp(i64),
}

/// Where an item is in its lifecycle.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ItemStatus {
    /// Registered and in the owner's possession
    #[default]
    Active,
    Lost,
    Stolen,
    Damaged,
    Sold,
    Archived,
    /// Recovered after a lost/stolen/damaged report
    Found,
}

impl ItemStatus {
    pub const ALL: [Self; 7] = [
        Self::Active,
        Self::Lost,
        Self::Stolen,
        Self::Damaged,
        Self::Sold,
        Self::Archived,
        Self::Found,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Lost => "lost",
            Self::Stolen => "stolen",
            Self::Damaged => "damaged",
            Self::Sold => "sold",
            Self::Archived => "archived",
            Self::Found => "found",
        }
    }

    /// Lost and stolen items are the only ones the public can search for.
    #[must_use]
    pub fn is_searchable(&self) -> bool {
        matches!(self, Self::Lost | Self::Stolen)
    }
}

impl FromStr for ItemStatus {
    type Err = ItemError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ItemError::UnknownStatus(s.to_string()))
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One registered item.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Item {
    pub id: u64,
    pub owner_id: u64,
    pub name: String,
    pub category: String,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub status: ItemStatus,
    /// Latitude of the incident, in decimal degrees
    pub latitude: Option<f64>,
    /// Longitude of the incident, in decimal degrees
    pub longitude: Option<f64>,
    /// Free-text incident location ("East Village, New York")
    pub incident_location: Option<String>,
    pub reward: f64,
    pub is_public: bool,
    pub reported_at: Option<DateTime<Utc>>,
    pub photos: Vec<String>,
}

impl Item {
    /// A freshly registered item: active, private, never reported.
    pub fn register(id: u64, owner_id: u64, name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id,
            owner_id,
            name: name.into(),
            category: category.into(),
            ..Default::default()
        }
    }

    /// Incident coordinates, if both are present and in range.
    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        let (lat, lng) = self.latitude.zip(self.longitude)?;
        Coordinates::new(lat, lng).ok()
    }

    /// Public, lost or stolen, and with known coordinates.
    #[must_use]
    pub fn is_search_eligible(&self) -> bool {
        self.is_public && self.status.is_searchable() && self.coordinates().is_some()
    }

    /// Create `Item` instances from a polars `DataFrame` in the `items` layout.
    pub fn from_df(df: &DataFrame) -> Result<Vec<Self>> {
        let ids = df.column(schema::ID)?.u64()?;
        let owner_ids = df.column(schema::OWNER_ID)?.u64()?;
        let names = df.column(schema::NAME)?.str()?;
        let categories = df.column(schema::CATEGORY)?.str()?;
        let brands = df.column(schema::BRAND)?.str()?;
        let descriptions = df.column(schema::DESCRIPTION)?.str()?;
        let statuses = df.column(schema::STATUS)?.str()?;
        let latitudes = df.column(schema::LATITUDE)?.f64()?;
        let longitudes = df.column(schema::LONGITUDE)?.f64()?;
        let locations = df.column(schema::INCIDENT_LOCATION)?.str()?;
        let rewards = df.column(schema::REWARD)?.f64()?;
        let public_flags = df.column(schema::IS_PUBLIC)?.bool()?;
        let reported = df.column(schema::REPORTED_AT)?.i64()?;
        let photos = df.column(schema::PHOTOS)?.str()?;

        (0..df.height())
            .map(|row| -> Result<Self> {
                let reported_at = reported
                    .get(row)
                    .map(|ts| DateTime::from_timestamp(ts, 0).ok_or(ItemError::InvalidTimestamp(ts)))
                    .transpose()?;
                Ok(Self {
                    id: required(ids.get(row), schema::ID, row)?,
                    owner_id: required(owner_ids.get(row), schema::OWNER_ID, row)?,
                    name: required(names.get(row), schema::NAME, row)?.to_string(),
                    category: required(categories.get(row), schema::CATEGORY, row)?.to_string(),
                    brand: brands.get(row).map(ToString::to_string),
                    description: descriptions.get(row).map(ToString::to_string),
                    status: required(statuses.get(row), schema::STATUS, row)?.parse()?,
                    latitude: latitudes.get(row),
                    longitude: longitudes.get(row),
                    incident_location: locations.get(row).map(ToString::to_string),
                    reward: rewards.get(row).unwrap_or_default(),
                    is_public: public_flags.get(row).unwrap_or_default(),
                    reported_at,
                    photos: split_photos(photos.get(row)),
                })
            })
            .collect()
    }

    /// Build a `DataFrame` in the `items` layout from a slice of items.
    pub fn to_df(items: &[Self]) -> Result<DataFrame> {
        let photos: Vec<Option<String>> = items
            .iter()
            .map(|item| {
                (!item.photos.is_empty())
                    .then(|| item.photos.join(schema::PHOTO_SEPARATOR))
            })
            .collect();

        Ok(df!(
            schema::ID => items.iter().map(|i| i.id).collect::<Vec<_>>(),
            schema::OWNER_ID => items.iter().map(|i| i.owner_id).collect::<Vec<_>>(),
            schema::NAME => items.iter().map(|i| i.name.as_str()).collect::<Vec<_>>(),
            schema::CATEGORY => items.iter().map(|i| i.category.as_str()).collect::<Vec<_>>(),
            schema::BRAND => items.iter().map(|i| i.brand.as_deref()).collect::<Vec<_>>(),
            schema::DESCRIPTION => items.iter().map(|i| i.description.as_deref()).collect::<Vec<_>>(),
            schema::STATUS => items.iter().map(|i| i.status.as_str()).collect::<Vec<_>>(),
            schema::LATITUDE => items.iter().map(|i| i.latitude).collect::<Vec<_>>(),
            schema::LONGITUDE => items.iter().map(|i| i.longitude).collect::<Vec<_>>(),
            schema::INCIDENT_LOCATION => items.iter().map(|i| i.incident_location.as_deref()).collect::<Vec<_>>(),
            schema::REWARD => items.iter().map(|i| i.reward).collect::<Vec<_>>(),
            schema::IS_PUBLIC => items.iter().map(|i| i.is_public).collect::<Vec<_>>(),
            schema::REPORTED_AT => items.iter().map(|i| i.reported_at.map(|t| t.timestamp())).collect::<Vec<_>>(),
            schema::PHOTOS => photos,
        )?)
    }

    /// Returns the column names expected in `DataFrames` for this entry type.
    #[must_use]
    pub fn field_names() -> Vec<&'static str> {
        schema::column_names()
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Item {{ id: {}, name: \"{}\", status: {} }}",
            self.id, self.name, self.status
        )
    }
}

fn required<T>(value: Option<T>, column: &'static str, row: usize) -> Result<T> {
    value.ok_or(ItemError::MissingValue { column, row })
}

fn split_photos(photos: Option<&str>) -> Vec<String> {
    photos
        .map(|p| {
            p.split(schema::PHOTO_SEPARATOR)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lost_bike() -> Item {
        Item {
            status: ItemStatus::Lost,
            latitude: Some(40.0),
            longitude: Some(-74.0),
            is_public: true,
            reward: 25.0,
            reported_at: DateTime::from_timestamp(1_700_000_000, 0),
            photos: vec!["a.jpg".into(), "b.jpg".into()],
            brand: Some("Trek".into()),
            ..Item::register(1, 7, "Bike", "bicycle")
        }
    }

    #[test]
    fn test_status_vocabulary_matches_schema() {
        let ours: Vec<_> = ItemStatus::ALL.iter().map(ItemStatus::as_str).collect();
        assert_eq!(ours, schema::STATUS_VALUES.to_vec());
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("lost".parse::<ItemStatus>().unwrap(), ItemStatus::Lost);
        assert_eq!(" STOLEN ".parse::<ItemStatus>().unwrap(), ItemStatus::Stolen);
        assert!("misplaced".parse::<ItemStatus>().is_err());
    }

    #[test]
    fn test_register_defaults() {
        let item = Item::register(3, 9, "Helmet", "bicycle");
        assert_eq!(item.status, ItemStatus::Active);
        assert!(!item.is_public);
        assert!(item.reported_at.is_none());
        assert!(!item.is_search_eligible());
    }

    #[test]
    fn test_eligibility_rules() {
        assert!(lost_bike().is_search_eligible());

        let private = Item { is_public: false, ..lost_bike() };
        assert!(!private.is_search_eligible());

        let damaged = Item { status: ItemStatus::Damaged, ..lost_bike() };
        assert!(!damaged.is_search_eligible());

        let no_lng = Item { longitude: None, ..lost_bike() };
        assert!(!no_lng.is_search_eligible());

        let stolen = Item { status: ItemStatus::Stolen, ..lost_bike() };
        assert!(stolen.is_search_eligible());
    }

    #[test]
    fn test_frame_conversion_preserves_fields() {
        let items = vec![lost_bike(), Item::register(2, 8, "Phone", "electronics")];
        let df = Item::to_df(&items).unwrap();
        assert_eq!(df.get_column_names().len(), Item::field_names().len());

        let back = Item::from_df(&df).unwrap();
        assert_eq!(back, items);
    }

    #[test]
    fn test_photos_split_and_trim() {
        assert_eq!(split_photos(Some("a.jpg| b.jpg ||")), vec!["a.jpg", "b.jpg"]);
        assert!(split_photos(None).is_empty());
    }
}
