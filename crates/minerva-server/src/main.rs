//! minerva-server: HTTP front for the Minerva assistant.
//!
//! Exposes the Telegram bot webhook and a generic chat endpoint, both
//! backed by the conversation orchestrator in `minerva-ai`.

mod config;
mod error;
mod history;
mod routes;
mod telegram;

use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use minerva_ai::{GeminiClient, GeminiConfig, Orchestrator};

use crate::config::ServerConfig;
use crate::history::{HistoryStore, MemoryHistoryStore};
use crate::routes::AppState;
use crate::telegram::TelegramClient;

#[derive(Parser)]
#[command(name = "minerva-server", about = "AI assistant server with Telegram and HTTP frontends")]
struct Args {
    /// Port to listen on.
    #[arg(short, long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "minerva=info".into()),
        )
        .init();

    let args = Args::parse();
    let config = ServerConfig::from_env().expect("failed to load configuration");

    let mut gemini_config = GeminiConfig::new(&config.gemini_api_key);
    if let Some(ref model) = config.gemini_model {
        gemini_config = gemini_config.with_model(model);
    }
    tracing::info!(config = ?gemini_config, "Configured Gemini backend");

    let registry = minerva_tools::default_registry(config.cloudinary.clone());
    tracing::info!(tools = registry.len(), "Tool registry ready");

    let orchestrator = Arc::new(Orchestrator::new(
        Arc::new(GeminiClient::new(gemini_config)),
        registry,
    ));
    let store: Arc<dyn HistoryStore> = Arc::new(MemoryHistoryStore::new());

    let telegram = config
        .telegram_bot_token
        .as_ref()
        .map(|token| Arc::new(TelegramClient::new(token)));
    if telegram.is_none() {
        tracing::warn!("TELEGRAM_BOT_TOKEN not set; the Telegram webhook is disabled");
    }

    if let (Some(telegram), Some(public_url)) = (&telegram, &config.public_url) {
        let webhook_url = format!("{}/telegram-webhook", public_url.trim_end_matches('/'));
        match telegram.set_webhook(&webhook_url).await {
            Ok(()) => tracing::info!(%webhook_url, "Telegram webhook registered"),
            Err(e) => tracing::error!(error = %e, "Failed to register Telegram webhook"),
        }
    }

    let app = routes::router(AppState {
        orchestrator,
        store,
        telegram,
    });

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = TcpListener::bind(&addr)
        .await
        .expect("failed to bind TCP listener");

    tracing::info!("minerva-server listening on {}", addr);

    axum::serve(listener, app).await.expect("server error");
}
