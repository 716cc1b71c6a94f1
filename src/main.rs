//! console-sync: keeps a local view of the console's server state fresh.
//!
//! Usage: `console-sync [role]` (default role `agent`). Everything else comes
//! from `CONSOLE_SYNC__*` environment variables.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

use console_sync::adapters::{HttpRemoteConfig, HttpRemoteStore, TracingNotifier, TtlCache, WebSocketTransport};
use console_sync::application::{
    AlertRouter, ConnectionManager, DataAccessFacade, FacadeOptions, InvalidationRouter,
    KeepalivePolicy, NotifyingObserver, RetryPolicy, TtlPolicy,
};
use console_sync::config::AppConfig;
use console_sync::domain::cache::Filters;
use console_sync::domain::connection::{tags, InboundEnvelope, InboundMessage};
use console_sync::domain::policy::{Principal, Role};
use console_sync::ports::{BatchHandler, CacheStore, HandlerError, Notifier};
use console_sync::telemetry;

/// Logs throttled transcript batches.
struct TranscriptLogger;

#[async_trait]
impl BatchHandler for TranscriptLogger {
    async fn handle_batch(&self, batch: Vec<InboundEnvelope>) -> Result<(), HandlerError> {
        for envelope in batch {
            if let InboundMessage::SpeechUpdate(update) = envelope.message {
                info!(
                    call_id = %update.call_id,
                    speaker = update.speaker.as_deref().unwrap_or("unknown"),
                    is_final = update.is_final,
                    "{}",
                    update.text
                );
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "TranscriptLogger"
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    config.validate().map_err(|e| {
        error!(error = %e, "Invalid configuration");
        e
    })?;

    let role = std::env::args().nth(1).unwrap_or_else(|| "agent".to_string());
    let principal = Principal::new("console", Role::new(role)?);

    let endpoint = config.connection.endpoint()?;
    info!(endpoint = %endpoint, role = %principal.role.as_str(), "Starting console-sync");

    // Data access
    let cache: Arc<dyn CacheStore<Value>> = Arc::new(TtlCache::<Value>::new());
    let ttl = TtlPolicy::from(&config.cache);

    let mut remote_config =
        HttpRemoteConfig::new(config.remote.base_url()?).with_timeout(config.remote.request_timeout());
    if let Some(token) = &config.connection.auth_token {
        remote_config = remote_config.with_auth_token(token.clone());
    }
    let remote = Arc::new(HttpRemoteStore::new(remote_config)?);

    let facade = DataAccessFacade::new(
        Arc::clone(&cache),
        remote,
        config.policy.evaluator()?,
        ttl.clone(),
        FacadeOptions {
            single_flight: config.cache.single_flight,
        },
    );

    // Live connection
    let mut transport = WebSocketTransport::new();
    if let Some(token) = &config.connection.auth_token {
        transport = transport.with_auth_token(token.clone());
    }

    let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier::new());
    let invalidation = Arc::new(
        InvalidationRouter::new(Arc::clone(&cache), ttl)
            .map_domain("client", ["clients", "dashboard"])
            .map_domain("appointment", ["appointments"])
            .map_domain("alert", ["alerts"]),
    );
    let alerts = Arc::new(AlertRouter::new(Arc::clone(&notifier)));

    let mut builder = ConnectionManager::builder(Arc::new(transport), endpoint)
        .retry(RetryPolicy::from(&config.connection))
        .keepalive(KeepalivePolicy::from(&config.connection))
        .connect_timeout(config.connection.connect_timeout())
        .observer(Arc::new(NotifyingObserver::new(Arc::clone(&notifier))))
        .on_batched(
            tags::SPEECH_UPDATE,
            config.shaping.stream_throttle(),
            config.shaping.stream_buffer_size,
            Arc::new(TranscriptLogger),
        );
    for channel in config.connection.channels_list() {
        builder = builder.subscribe(channel);
    }
    for tag in invalidation.tags() {
        builder = builder.on(tag, invalidation.clone());
    }
    for tag in AlertRouter::TAGS {
        builder = builder.on(tag, alerts.clone());
    }

    let manager = builder.build();
    manager.connect()?;

    match facade.get(&principal, "dashboard", &Filters::new()).await {
        Ok(Some(_)) => info!("Dashboard loaded"),
        Ok(None) => info!("Dashboard is empty"),
        Err(e) => error!(error = %e, "Dashboard load failed"),
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    manager.shutdown().await;

    Ok(())
}
