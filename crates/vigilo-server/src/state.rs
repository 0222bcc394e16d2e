use std::sync::Arc;

use tracing::info;
use vigilo::ItemSearcher;
use vigilo_data_processing::{ItemStoreData, TestDataConfig, create_test_data, raw::load_items_csv};

use super::{config::Config, error::AppError};

pub struct AppState {
    pub searcher: ItemSearcher,
    pub config: Config,
}

impl AppState {
    /// Load the item registry named by `config`. Blocks while the table is read.
    pub fn new(config: Config) -> Result<Arc<Self>, AppError> {
        let searcher = match &config.data_path {
            Some(path) => ItemSearcher::from_path(path)?,
            None => sample_searcher()?,
        };
        let searcher = searcher.with_config(config.search_config()?);
        info!("{}", searcher.info()?.summary());

        Ok(Self::from_searcher(searcher, config))
    }

    pub fn from_searcher(searcher: ItemSearcher, config: Config) -> Arc<Self> {
        Arc::new(Self { searcher, config })
    }
}

/// The generated demo registry, held in memory only.
fn sample_searcher() -> Result<ItemSearcher, AppError> {
    let fixture = create_test_data(&TestDataConfig::sample())?;
    let store = ItemStoreData::from_frame(load_items_csv(fixture.path())?)?;
    Ok(ItemSearcher::from_store(&store)?)
}
