use rust_agentcrew::api::{run_server, AppState};
use rust_agentcrew::config::AppConfig;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();

    // Load Configuration
    let config = AppConfig::load()?;

    // Setup Logging (RUST_LOG wins over the configured level)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let subscriber = tracing_subscriber::FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting Agent Crew...");
    info!("Using Ollama at {}", config.base_url());
    for slot in rust_agentcrew::AgentSlot::ALL {
        info!("Default model for {}: {}", slot, config.default_model(slot));
    }
    if config.search.serper_api_key.is_none() {
        info!("ℹ️ SERPER_API_KEY not set - internet search tool will report itself unavailable");
    }

    let app_state = Arc::new(AppState::new(config));

    // Start API Server
    info!("Initializing API Server...");
    run_server(app_state).await?;

    Ok(())
}
