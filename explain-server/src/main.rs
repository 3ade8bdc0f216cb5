use anyhow::Result;
use poem::{listener::TcpListener, Server};
use std::env;
use tokio::signal;

mod api;
mod config;
mod explainer;

use explainer::Explainer;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    tracing::info!("Loading configuration from: {}", config_path);

    let mut config = config::ConfigFile::load_or_default(&config_path)?;
    config.apply_env(env::var("PORT").ok(), env::var("OPENAI_API_KEY").ok())?;
    config.validate()?;

    let explainer = explainer::select_explainer(config.openai.clone())?;
    if explainer.is_configured() {
        tracing::info!("✅ OpenAI explainer configured (model {})", config.openai.model);
    } else {
        tracing::warn!("OPENAI_API_KEY is not set, serving canned mock explanations");
    }

    let public_url = format!("http://localhost:{}", config.server.port);
    let app = api::build_app(explainer, &public_url);

    tracing::info!(
        "🚀 Starting Explaina API server on {}:{}",
        config.server.host,
        config.server.port
    );
    tracing::info!("   🔗 Extension endpoint: {}/explain", public_url);
    tracing::info!("   📖 Documentation: {}/docs", public_url);

    Server::new(TcpListener::bind(format!(
        "{}:{}",
        config.server.host, config.server.port
    )))
    .run_with_graceful_shutdown(app, shutdown_signal(), None)
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
