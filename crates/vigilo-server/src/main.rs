use anyhow::Result;
use tracing::Level;
use vigilo_server::{config::Config, start_server};

#[tokio::main]
async fn main() -> Result<()> {
    vigilo::init_logging(Level::INFO)?;

    let config = Config::load()?;
    start_server(config).await?;
    Ok(())
}
