use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use tracing::{info, warn};
use vigilo::{DEFAULT_RADIUS_KM, DEFAULT_RESULT_LIMIT, SearchConfig};

use crate::error::AppError;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_ITEM_URL_PREFIX: &str = "/items/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    /// CSV or Parquet item table; generated sample data when unset
    pub data_path: Option<PathBuf>,
    pub result_limit: usize,
    pub default_radius_km: u32,
    /// Prepended to an item id to build its detail-page link
    pub item_url_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data_path: None,
            result_limit: DEFAULT_RESULT_LIMIT,
            default_radius_km: DEFAULT_RADIUS_KM,
            item_url_prefix: DEFAULT_ITEM_URL_PREFIX.to_string(),
        }
    }
}

impl Config {
    /// Read configuration from the process environment.
    pub fn load() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read configuration through `lookup`, falling back to defaults for
    /// unset keys. Unparseable values are an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let config = Self {
            port: try_load(&lookup, "VIGILO_PORT", DEFAULT_PORT)?,
            data_path: lookup("VIGILO_DATA_PATH")
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
            result_limit: try_load(&lookup, "VIGILO_RESULT_LIMIT", DEFAULT_RESULT_LIMIT)?,
            default_radius_km: try_load(&lookup, "VIGILO_DEFAULT_RADIUS_KM", DEFAULT_RADIUS_KM)?,
            item_url_prefix: lookup("VIGILO_ITEM_URL_PREFIX")
                .unwrap_or_else(|| DEFAULT_ITEM_URL_PREFIX.to_string()),
        };

        if config.data_path.is_none() {
            warn!("VIGILO_DATA_PATH not set, serving generated sample items");
        }
        // Validates the numeric settings
        config.search_config()?;
        Ok(config)
    }

    pub fn search_config(&self) -> Result<SearchConfig, AppError> {
        if self.result_limit == 0 {
            return Err(AppError::Config(
                "VIGILO_RESULT_LIMIT must be at least 1".to_string(),
            ));
        }
        let config = SearchConfig::builder()
            .limit(self.result_limit)
            .default_radius_km(self.default_radius_km)
            .map_err(|e| AppError::Config(format!("VIGILO_DEFAULT_RADIUS_KM: {e}")))?
            .build();
        Ok(config)
    }
}

fn try_load<T>(lookup: impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e| {
            warn!("Invalid {key} value: {e}");
            AppError::Config(format!("{key}={raw:?}: {e}"))
        }),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}
