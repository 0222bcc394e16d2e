use std::io::Write;

use chrono::Utc;
use itertools::Itertools;
use polars::prelude::*;
use tempfile::NamedTempFile;
use tracing::info;

use super::error::Result;
use crate::schema;

const SECONDS_PER_DAY: i64 = 86_400;

/// Configuration for test data generation
#[derive(Debug, Clone)]
pub struct TestDataConfig {
    /// Number of item rows to write
    pub item_rows: usize,
    /// Whether to use the realistic fixture set or the three-row minimal one
    pub realistic_data: bool,
}

impl Default for TestDataConfig {
    fn default() -> Self {
        Self::sample()
    }
}

impl TestDataConfig {
    /// Minimal data for unit tests
    pub fn minimal() -> Self {
        Self {
            item_rows: 3,
            realistic_data: false,
        }
    }

    /// Sample data for integration tests
    pub fn sample() -> Self {
        Self {
            item_rows: REALISTIC_ITEMS.len(),
            realistic_data: true,
        }
    }
}

/// One fixture row. `reported_days_ago` is relative to generation time so
/// recency windows behave the same whenever the fixture is written.
struct FixtureItem {
    owner_id: u64,
    name: &'static str,
    category: &'static str,
    brand: Option<&'static str>,
    description: Option<&'static str>,
    status: &'static str,
    coordinates: Option<(f64, f64)>,
    incident_location: Option<&'static str>,
    reward: f64,
    is_public: bool,
    reported_days_ago: Option<i64>,
    photos: &'static [&'static str],
}

static REALISTIC_ITEMS: [FixtureItem; 16] = [
    FixtureItem {
        owner_id: 1,
        name: "Black Trek bicycle",
        category: "bicycle",
        brand: Some("Trek"),
        description: Some("Stolen outside the library, red bell, \"FX 3\" decal"),
        status: "stolen",
        coordinates: Some((40.7306, -73.9866)),
        incident_location: Some("East Village, New York"),
        reward: 150.0,
        is_public: true,
        reported_days_ago: Some(2),
        photos: &["uploads/items/bike_front.jpg", "uploads/items/bike_side.jpg"],
    },
    FixtureItem {
        owner_id: 2,
        name: "iPhone 14 Pro",
        category: "electronics",
        brand: Some("Apple"),
        description: Some("Lost on the L train, purple case"),
        status: "lost",
        coordinates: Some((40.7128, -74.0060)),
        incident_location: Some("Lower Manhattan, New York"),
        reward: 50.0,
        is_public: true,
        reported_days_ago: Some(5),
        photos: &["uploads/items/phone.jpg"],
    },
    FixtureItem {
        owner_id: 3,
        name: "Leather wallet",
        category: "wallet",
        brand: Some("Fossil"),
        description: Some("Brown, contains library card"),
        status: "lost",
        coordinates: Some((40.001, -74.001)),
        incident_location: Some("Lakewood, New Jersey"),
        reward: 20.0,
        is_public: true,
        reported_days_ago: Some(1),
        photos: &[],
    },
    FixtureItem {
        owner_id: 4,
        name: "Dog collar",
        category: "pets",
        brand: None,
        description: Some("Green collar with bone-shaped tag"),
        status: "lost",
        coordinates: Some((41.0, -74.0)),
        incident_location: Some("Warwick, New York"),
        reward: 0.0,
        is_public: true,
        reported_days_ago: Some(12),
        photos: &[],
    },
    FixtureItem {
        owner_id: 5,
        name: "Work laptop",
        category: "electronics",
        brand: Some("Dell"),
        description: Some("Taken from a parked car"),
        status: "stolen",
        coordinates: Some((40.7310, -73.9870)),
        incident_location: Some("East Village, New York"),
        reward: 300.0,
        is_public: false,
        reported_days_ago: Some(3),
        photos: &[],
    },
    FixtureItem {
        owner_id: 6,
        name: "Film camera",
        category: "electronics",
        brand: Some("Leica"),
        description: Some("Location unknown, somewhere in Brooklyn"),
        status: "stolen",
        coordinates: None,
        incident_location: Some("Brooklyn, New York"),
        reward: 400.0,
        is_public: true,
        reported_days_ago: Some(4),
        photos: &[],
    },
    FixtureItem {
        owner_id: 7,
        name: "Blue umbrella",
        category: "accessories",
        brand: None,
        description: None,
        status: "found",
        coordinates: Some((40.7300, -73.9860)),
        incident_location: Some("East Village, New York"),
        reward: 5.0,
        is_public: true,
        reported_days_ago: Some(6),
        photos: &[],
    },
    FixtureItem {
        owner_id: 8,
        name: "Electric scooter",
        category: "vehicle",
        brand: Some("Segway"),
        description: Some("Front wheel bent"),
        status: "damaged",
        coordinates: Some((40.7200, -73.9900)),
        incident_location: Some("Lower East Side, New York"),
        reward: 0.0,
        is_public: true,
        reported_days_ago: Some(8),
        photos: &[],
    },
    FixtureItem {
        owner_id: 9,
        name: "Backpack",
        category: "bags",
        brand: Some("Herschel"),
        description: Some("Grey, laptop sleeve, notebooks inside"),
        status: "stolen",
        coordinates: Some((40.7580, -73.9855)),
        incident_location: Some("Times Square, New York"),
        reward: 75.0,
        is_public: true,
        reported_days_ago: None,
        photos: &["uploads/items/backpack.jpg"],
    },
    FixtureItem {
        owner_id: 10,
        name: "Wedding ring",
        category: "jewelry",
        brand: None,
        description: Some("White gold band, engraved inside"),
        status: "lost",
        coordinates: Some((51.5074, -0.1278)),
        incident_location: Some("Covent Garden, London"),
        reward: 500.0,
        is_public: true,
        reported_days_ago: Some(30),
        photos: &[],
    },
    FixtureItem {
        owner_id: 11,
        name: "Handheld GPS",
        category: "electronics",
        brand: Some("Garmin"),
        description: Some("Left at the ferry terminal"),
        status: "stolen",
        coordinates: Some((-16.5, 179.99)),
        incident_location: Some("Savusavu, Fiji"),
        reward: 60.0,
        is_public: true,
        reported_days_ago: Some(9),
        photos: &[],
    },
    FixtureItem {
        owner_id: 12,
        name: "Passport wallet",
        category: "documents",
        brand: None,
        description: Some("Red cover"),
        status: "lost",
        coordinates: Some((-16.5, -179.99)),
        incident_location: Some("Taveuni, Fiji"),
        reward: 40.0,
        is_public: true,
        reported_days_ago: Some(10),
        photos: &[],
    },
    FixtureItem {
        owner_id: 13,
        name: "Sled dog harness",
        category: "pets",
        brand: None,
        description: Some("Left at the last camp"),
        status: "lost",
        coordinates: Some((89.99, 0.0)),
        incident_location: Some("Arctic expedition camp"),
        reward: 10.0,
        is_public: true,
        reported_days_ago: Some(20),
        photos: &[],
    },
    FixtureItem {
        owner_id: 1,
        name: "Road helmet",
        category: "bicycle",
        brand: Some("Giro"),
        description: None,
        status: "active",
        coordinates: Some((40.7306, -73.9866)),
        incident_location: None,
        reward: 0.0,
        is_public: false,
        reported_days_ago: None,
        photos: &[],
    },
    FixtureItem {
        owner_id: 14,
        name: "Tablet",
        category: "electronics",
        brand: Some("Samsung"),
        description: Some("Cracked corner"),
        status: "lost",
        coordinates: Some((40.7128, -74.0060)),
        incident_location: Some("Lower Manhattan, New York"),
        reward: 50.0,
        is_public: true,
        reported_days_ago: Some(90),
        photos: &[],
    },
    FixtureItem {
        owner_id: 15,
        name: "Vintage watch",
        category: "jewelry",
        brand: Some("Omega"),
        description: Some("Sold at the Brooklyn flea"),
        status: "sold",
        coordinates: Some((40.6782, -73.9442)),
        incident_location: Some("Brooklyn, New York"),
        reward: 0.0,
        is_public: true,
        reported_days_ago: Some(15),
        photos: &[],
    },
];

/// Create a CSV fixture of the `items` table in a temporary file.
///
/// Rows are numbered from 1. Cycling past the realistic set reuses its rows
/// with fresh ids.
pub fn create_test_data(config: &TestDataConfig) -> Result<NamedTempFile> {
    info!("Creating test data with config: {:?}", config);

    let rows: &[FixtureItem] = if config.realistic_data {
        &REALISTIC_ITEMS
    } else {
        &REALISTIC_ITEMS[..3]
    };
    let rows = rows.iter().cycle().take(config.item_rows).collect_vec();
    let mut df = fixture_frame(&rows, Utc::now().timestamp())?;

    let mut file = tempfile::Builder::new()
        .prefix("items_")
        .suffix(".csv")
        .tempfile()?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)?;
    file.flush()?;
    Ok(file)
}

fn fixture_frame(rows: &[&FixtureItem], now: i64) -> Result<DataFrame> {
    let ids = (1..=rows.len() as u64).collect_vec();
    let reported_at = rows
        .iter()
        .map(|item| item.reported_days_ago.map(|days| now - days * SECONDS_PER_DAY))
        .collect_vec();
    let photos = rows
        .iter()
        .map(|item| {
            (!item.photos.is_empty()).then(|| item.photos.iter().join(schema::PHOTO_SEPARATOR))
        })
        .collect_vec();

    let df = df!(
        schema::ID => ids,
        schema::OWNER_ID => rows.iter().map(|item| item.owner_id).collect_vec(),
        schema::NAME => rows.iter().map(|item| item.name).collect_vec(),
        schema::CATEGORY => rows.iter().map(|item| item.category).collect_vec(),
        schema::BRAND => rows.iter().map(|item| item.brand).collect_vec(),
        schema::DESCRIPTION => rows.iter().map(|item| item.description).collect_vec(),
        schema::STATUS => rows.iter().map(|item| item.status).collect_vec(),
        schema::LATITUDE => rows.iter().map(|item| item.coordinates.map(|c| c.0)).collect_vec(),
        schema::LONGITUDE => rows.iter().map(|item| item.coordinates.map(|c| c.1)).collect_vec(),
        schema::INCIDENT_LOCATION => rows.iter().map(|item| item.incident_location).collect_vec(),
        schema::REWARD => rows.iter().map(|item| item.reward).collect_vec(),
        schema::IS_PUBLIC => rows.iter().map(|item| item.is_public).collect_vec(),
        schema::REPORTED_AT => reported_at,
        schema::PHOTOS => photos,
    )?;
    Ok(df)
}
