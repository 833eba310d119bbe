use std::sync::Arc;

use anyhow::{Context, Result};

use conjointd::{
    catalog::AttributeCatalog,
    cli::config_path_from_args,
    config::Config,
    engine::SurveyEngine,
    logging, server,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = config_path_from_args()?;
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    let logging_guard = logging::init_tracing(&config.logging)?;
    tracing::info!(target: "main", run_id = logging_guard.run_id(), "starting");

    let catalog = match &config.catalog_path {
        Some(path) => AttributeCatalog::load(path)
            .with_context(|| format!("failed to load catalog from {}", path.display()))?,
        None => AttributeCatalog::default_job_catalog(),
    };
    tracing::info!(
        target: "main",
        attributes = catalog.attribute_count(),
        combinations = catalog.combination_count(),
        "catalog_loaded"
    );

    let engine = Arc::new(SurveyEngine::new(
        Arc::new(catalog),
        config.strategy,
        config.total_rounds,
    ));

    server::run(config, engine).await
}
