// src/main.rs
mod api;
mod catalog;
mod config;
mod feasibility;
mod model;
mod packer;
mod selection;
mod types;

use catalog::Catalog;
use config::AppConfig;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let dotenv_result = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = dotenv_result {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            warn!("could not load .env: {}", err);
        }
    }

    let app_config = AppConfig::from_env();

    let catalog = match Catalog::load(
        app_config.catalog.products_file.as_deref(),
        app_config.catalog.boxes_file.as_deref(),
    ) {
        Ok(catalog) => catalog,
        Err(err) => {
            error!("could not load catalog: {}", err);
            std::process::exit(1);
        }
    };
    info!(
        products = catalog.products().len(),
        boxes = catalog.boxes().len(),
        "catalog loaded"
    );

    info!("packing service starting");
    if let Err(err) = api::start_api_server(app_config.api, app_config.packing, catalog).await {
        error!("server stopped: {}", err);
        std::process::exit(1);
    }
}
