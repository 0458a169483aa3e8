use std::sync::Arc;
use std::time::Duration;
use anyhow::Context;
use tokio::sync::mpsc;
use funding_alert_bot::COMMAND_QUEUE_CAPACITY;
use funding_alert_bot::alerts::{AlertScheduler, NotificationDispatcher, SchedulerSettings};
use funding_alert_bot::api::{create_router, ApiState};
use funding_alert_bot::cache::SharedRateCache;
use funding_alert_bot::commands::CommandWorker;
use funding_alert_bot::config::AppConfig;
use funding_alert_bot::interfaces::{Messenger, RateSource};
use funding_alert_bot::market_data::MexcRateFetcher;
use funding_alert_bot::observability::{metrics, tracing::init_tracing};
use funding_alert_bot::query::OnDemandQueryHandler;
use funding_alert_bot::telegram::TelegramClient;
use funding_alert_bot::types::ChatId;
use funding_alert_bot::utils::TaskSupervisor;

const HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let json_logs = std::env::var("FUNDING_BOT_LOG_JSON").is_ok_and(|v| v == "1");
    init_tracing(json_logs);

    let env = std::env::var("FUNDING_BOT_ENV").unwrap_or_else(|_| "development".to_string());
    let config = AppConfig::load(&env).context("failed to load configuration")?;
    metrics::register_metrics().context("failed to register metrics")?;

    let fetcher = Arc::new(MexcRateFetcher::new(&config.upstream)?);
    let source: Arc<dyn RateSource> = fetcher;
    let cache = Arc::new(SharedRateCache::new());
    let telegram = Arc::new(TelegramClient::new(&config.telegram)?);
    let messenger: Arc<dyn Messenger> = Arc::clone(&telegram) as Arc<dyn Messenger>;

    tracing::info!(
        "Starting funding rate bot (env={}, source={}, top_k={}, query_mode={:?})",
        env,
        source.source_id(),
        config.ranking.top_k,
        config.query.mode
    );

    let mut supervisor = TaskSupervisor::new();

    let scheduler = if config.alert.enabled {
        let schedule = config.alert.schedule.to_trigger_schedule()?;
        let dispatcher = NotificationDispatcher::new(
            Arc::clone(&messenger),
            ChatId::new(config.telegram.chat_id.clone()),
            config.alert.threshold_percent,
        );
        let scheduler = Arc::new(AlertScheduler::new(
            Arc::clone(&source),
            Arc::clone(&cache),
            dispatcher,
            schedule,
            SchedulerSettings {
                mode: config.ranking.mode,
                top_k: config.ranking.top_k,
                threshold_percent: config.alert.threshold_percent,
                prime_cache_on_start: config.alert.prime_cache_on_start,
            },
        ));
        supervisor.spawn("alert_scheduler", Arc::clone(&scheduler).run());
        Some(scheduler)
    } else {
        tracing::warn!("Scheduled alerts disabled; the cache is only filled by the scheduler");
        None
    };

    let query = Arc::new(OnDemandQueryHandler::new(
        Arc::clone(&cache),
        Some(Arc::clone(&source)),
        config.query.mode,
        config.ranking.mode,
        config.ranking.top_k,
    ));
    let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
    let worker = Arc::new(CommandWorker::new(Arc::clone(&messenger), query));
    supervisor.spawn("command_worker", worker.run(command_rx));

    if let Some(url) = config.telegram.webhook_url.as_deref() {
        if let Err(e) = telegram.set_webhook(url, config.telegram.webhook_secret.as_deref()).await {
            tracing::error!("Webhook registration failed, continuing without it: {}", e);
        }
        if let Err(e) = telegram.set_my_commands().await {
            tracing::warn!("Failed to publish the command list: {}", e);
        }
    }

    let state = Arc::new(ApiState {
        cache,
        scheduler,
        commands: command_tx,
        webhook_secret: config.telegram.webhook_secret.clone(),
    });
    let app = create_router(state, config.server.request_timeout());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(supervisor))
        .await
        .context("HTTP server error")?;

    if config.telegram.webhook_url.is_some() {
        if let Err(e) = telegram.delete_webhook().await {
            tracing::warn!("Failed to remove webhook: {}", e);
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or when a supervised task dies, aborting the rest.
async fn shutdown_signal(mut supervisor: TaskSupervisor) {
    let mut ticker = tokio::time::interval(HEALTH_CHECK_INTERVAL);
    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    tracing::error!("Failed to listen for Ctrl+C: {}", e);
                }
                tracing::info!("Shutdown signal received");
                break;
            }
            _ = ticker.tick() => {
                if supervisor.check_health().is_err() {
                    break;
                }
            }
        }
    }
    supervisor.shutdown_all();
}
