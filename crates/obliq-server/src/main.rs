//! Binary entry point: wire the in-memory store, the dispatcher with
//! log-only senders, the engine and the HTTP surface.

use obliq_escalation::{EngineConfig, EscalationEngine};
use obliq_notify::{ChannelSender, Dispatcher};
use obliq_server::{router, spawn_ticker, AppState, LogSender, ServerConfig};
use obliq_store::MemoryStore;
use obliq_types::Channel;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = ServerConfig::from_env()?;
    let store = Arc::new(MemoryStore::new());

    let dispatcher = Arc::new(
        Dispatcher::new(store.clone())
            .with_sender(Channel::Chat, Arc::new(LogSender::new(Channel::Chat)) as Arc<dyn ChannelSender>)
            .with_sender(Channel::Sms, Arc::new(LogSender::new(Channel::Sms)) as Arc<dyn ChannelSender>),
    );
    let engine = Arc::new(
        EscalationEngine::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            dispatcher,
        )
        .with_config(EngineConfig {
            batch_size: config.batch_size,
            ..EngineConfig::default()
        }),
    );

    if config.ticker_enabled {
        spawn_ticker(engine.clone(), &config);
        tracing::info!(interval_secs = config.ticker_interval.as_secs(), "ticker enabled");
    }

    let state = AppState {
        engine,
        sweep_token: config.sweep_token.clone(),
    };
    let app = router(state);

    tracing::info!(bind = %config.bind, "obliq server listening");
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await?;
    Ok(())
}
