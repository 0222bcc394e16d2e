use super::error::Result;
use crate::{DataError, raw, schema};
use once_cell::sync::OnceCell;
use polars::prelude::*;
use std::{
    hash::{DefaultHasher, Hash, Hasher},
    path::{Path, PathBuf},
};
use tracing::{info, info_span, warn};

const ITEMS_CSV: &str = "items.csv";
const ITEMS_PARQUET: &str = "items.parquet";

/// The processed `items` table, loaded into memory on first access.
///
/// Backed either by a Parquet file (the processed cache) or by a frame handed
/// in directly. Every frame exposed by [`ItemStoreData::items_lf`] has passed
/// [`raw::normalize_items`] and [`raw::validate_items`].
#[derive(Clone)]
pub struct ItemStoreData {
    items_path: Option<PathBuf>,
    items_df: OnceCell<LazyFrame>,
}

impl ItemStoreData {
    /// Load the item table from the data directory.
    ///
    /// Looks for `processed/items.parquet`, then `raw/items.csv` (processing it
    /// into the Parquet cache). In this crate's own unit tests, or with the
    /// `test_data` feature and `USE_TEST_DATA=1`, a generated fixture stands
    /// in for a missing raw export.
    pub fn new() -> Result<Self> {
        info!("ItemStoreData: Using persistent data storage");

        let processed_dir = crate::get_data_dir().join("processed");
        std::fs::create_dir_all(&processed_dir)?;
        let parquet_path = processed_dir.join(ITEMS_PARQUET);

        if parquet_path.exists() {
            info!("ItemStoreData: Loading existing Parquet file");
            return Ok(Self::load_parquet_file(parquet_path));
        }

        let raw_path = crate::get_data_dir().join("raw").join(ITEMS_CSV);
        if raw_path.exists() {
            process_csv_to_parquet(&raw_path, &parquet_path)?;
            return Ok(Self::load_parquet_file(parquet_path));
        }

        if crate::should_use_test_data() {
            warn!("Raw item table not found, generating test data");
            let fixture = crate::create_test_data(&crate::get_test_data_config())?;
            process_csv_to_parquet(fixture.path(), &parquet_path)?;
            return Ok(Self::load_parquet_file(parquet_path));
        }

        Err(DataError::RequiredFilesNotFound)
    }

    /// Load the item table from an explicit file.
    ///
    /// Parquet files are read as-is. CSV exports are processed into a cache
    /// under `<data dir>/processed/` named after the CSV's canonical path, and
    /// that cache is reused while it is newer than the CSV.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("parquet") => {
                if !path.exists() {
                    return Err(DataError::RequiredFilesNotFound);
                }
                Ok(Self::load_parquet_file(path.to_path_buf()))
            }
            Some("csv") => {
                let processed_dir = crate::get_data_dir().join("processed");
                std::fs::create_dir_all(&processed_dir)?;
                let parquet_path = processed_dir.join(cache_file_name(path)?);

                if is_stale(path, &parquet_path)? {
                    process_csv_to_parquet(path, &parquet_path)?;
                } else {
                    info!(path = ?parquet_path, "Reusing processed Parquet cache");
                }
                Ok(Self::load_parquet_file(parquet_path))
            }
            other => Err(DataError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }

    /// Wrap an in-memory frame. It is normalised and validated up front.
    pub fn from_frame(df: DataFrame) -> Result<Self> {
        let df = raw::validate_items(raw::normalize_items(df.lazy())?.collect()?)?;
        Ok(Self {
            items_path: None,
            items_df: OnceCell::with_value(df.lazy()),
        })
    }

    fn load_parquet_file(path: PathBuf) -> Self {
        Self {
            items_path: Some(path),
            items_df: OnceCell::new(),
        }
    }

    fn get_data(path: &Path) -> Result<LazyFrame> {
        info!(
            path = ?path.file_stem(),
            "Loading and collecting into memory for the first time..."
        );
        let t_load = std::time::Instant::now();
        let df = LazyFrame::scan_parquet(path, ScanArgsParquet::default())?;
        let df = raw::validate_items(raw::normalize_items(df)?.collect()?)?;
        info!(
            rows = df.height(),
            time_collected = ?t_load.elapsed(),
            "Collected into memory"
        );
        Ok(df.lazy())
    }

    pub fn items_lf(&self) -> Result<&LazyFrame> {
        self.items_df.get_or_try_init(|| match &self.items_path {
            Some(path) => Self::get_data(path),
            None => Ok(DataFrame::empty_with_schema(&schema::item_schema()).lazy()),
        })
    }

    /// Path of the backing Parquet file, if any.
    pub fn items_path(&self) -> Option<&Path> {
        self.items_path.as_deref()
    }
}

/// `<stem>-<hash of the canonical path>.parquet`, so two exports that share
/// a file name never share a cache.
fn cache_file_name(source: &Path) -> Result<String> {
    let canonical = std::fs::canonicalize(source)?;
    let stem = canonical
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("items");

    let mut hasher = DefaultHasher::new();
    canonical.hash(&mut hasher);
    Ok(format!("{stem}-{:016x}.parquet", hasher.finish()))
}

fn is_stale(source: &Path, cache: &Path) -> Result<bool> {
    if !cache.exists() {
        return Ok(true);
    }
    let source_modified = std::fs::metadata(source)?.modified()?;
    let cache_modified = std::fs::metadata(cache)?.modified()?;
    // Equal timestamps are ambiguous on coarse-grained filesystems
    Ok(source_modified >= cache_modified)
}

/// Process a raw CSV export into the Parquet cache at `parquet_path`.
pub fn process_csv_to_parquet(csv_path: &Path, parquet_path: &Path) -> Result<()> {
    let _span = info_span!("Process item table").entered();
    let t_process = std::time::Instant::now();

    let mut df = raw::load_items_csv(csv_path)?;
    let mut file = std::fs::File::create(parquet_path)?;
    ParquetWriter::new(&mut file).finish(&mut df)?;

    info!(
        path = ?parquet_path.file_stem(),
        rows = df.height(),
        process_time = ?t_process.elapsed(),
        "Saved to parquet file"
    );
    Ok(())
}
