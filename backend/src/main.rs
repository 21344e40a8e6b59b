use std::env;
use std::sync::Arc;

use chat_relay_backend::{app, logging, AppState, Config};
use tokio::net::TcpListener;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("chat-relay {}", VERSION);
        return Ok(());
    }

    // Load configuration
    let config = Config::load().map_err(|e| {
        format!(
            "Failed to load configuration: {}. \
             Check config.toml and CHAT_RELAY__SECTION__KEY environment variables.",
            e
        )
    })?;

    logging::init(&config.logging.level);

    tracing::info!("Starting chat-relay {}", VERSION);
    tracing::info!(
        "Upstream: {} (default model {}, timeout {}s)",
        config.provider.base_url,
        config.defaults.model,
        config.provider.timeout_secs
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config));

    if !state.orchestrator.is_configured() {
        tracing::warn!(
            "No upstream API key configured; chat requests will fail until \
             CHAT_RELAY__PROVIDER__API_KEY or OPENAI_API_KEY is set"
        );
    }

    let app = app(state);

    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
