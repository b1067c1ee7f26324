// src/main.rs
use stack_it_now::api;
use stack_it_now::config::AppConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let dotenv_result = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stack_it_now=info")),
        )
        .init();

    if let Err(err) = dotenv_result {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            tracing::warn!("⚠️ Could not load .env: {}", err);
        }
    }

    let app_config = AppConfig::from_env();
    let engine = app_config.planner.engine();

    tracing::info!(
        "🚀 Load planner starting with {} ({} in grid, snapping {})",
        engine.container().label,
        engine.settings().grid.inches(),
        if engine.settings().snap_to_grid { "on" } else { "off" }
    );
    api::start_api_server(app_config.api, engine).await;
}
