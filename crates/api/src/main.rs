//! alertdeck - Main Entry Point

use api::{init_logging, run_server, Settings};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load()?;
    init_logging(settings.log_level()?, settings.log_json);

    info!("=== alertdeck v{} ===", env!("CARGO_PKG_VERSION"));
    info!(
        "Polling {} alert managers every {:?}",
        settings.sources.len(),
        settings.refresh_interval()
    );

    run_server(settings).await?;

    Ok(())
}
