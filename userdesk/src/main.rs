// userdesk - headless entry point
// Loads settings, builds the configured backend and prints the record list as JSON.

use anyhow::Context;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use userdesk::app::AppState;
use userdesk::config::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "userdesk=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting userdesk");

    let settings_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("userdesk.json"));

    let settings = Settings::load(&settings_path)
        .await
        .with_context(|| format!("failed to load settings from {}", settings_path.display()))?
        .apply_env()?;

    let state = AppState::build(settings)
        .await
        .context("failed to initialize backend")?;

    state.controller.load().await;

    let view = state.controller.snapshot();
    println!("{}", serde_json::to_string_pretty(&view.records)?);

    tracing::info!("Listed {} records", view.records.len());
    Ok(())
}
