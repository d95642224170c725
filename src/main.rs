use anyhow::Context;
use finance_api::api;
use finance_api::config::AppConfig;
use finance_api::scheduler::RefreshScheduler;
use finance_api::state::AppState;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "finance_api=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Finance API...");

    let config = AppConfig::from_env().context("loading configuration")?;
    let state = Arc::new(AppState::new(&config).context("initializing application state")?);

    state.db.seed_stocks().context("seeding stock reference data")?;

    let mut scheduler = RefreshScheduler::new(
        state.clone(),
        config.refresh_symbols.clone(),
        config.refresh_hour,
    );
    scheduler.start();

    api::run(&config, state).await.context("running HTTP server")?;

    scheduler.stop();
    tracing::info!("Finance API stopped");
    Ok(())
}
