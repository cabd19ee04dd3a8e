//! PadelSense scoring server.
//!
//! Reads configuration from the environment (and `.env`), connects to
//! `PostgreSQL`, runs migrations and serves the HTTP API.

use padelsense_core::environment::SystemClock;
use padelsense_core::notify::Notifier;
use padelsense_postgres::{PostgresMatchStore, PostgresPlayerDirectory};
use padelsense_runtime::metrics::MetricsRecorder;
use padelsense_runtime::{
    CachedPlayerDirectory, InMemoryCache, MatchController, NotificationDispatcher,
};
use padelsense_web::{AppState, BotNotifier, Config, NoopNotifier, build_router};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if present)
    let _ = dotenvy::dotenv();

    init_tracing();

    let config = Config::from_env()?;
    let metrics = MetricsRecorder::install()?;

    info!(
        max_connections = config.postgres.max_connections,
        "Connecting to PostgreSQL"
    );
    let pool = PgPoolOptions::new()
        .max_connections(config.postgres.max_connections)
        .acquire_timeout(config.postgres.connect_timeout)
        .connect(&config.postgres.url)
        .await?;

    let store = PostgresMatchStore::new(pool.clone());
    store.migrate().await?;
    info!("Migrations complete");

    let directory = CachedPlayerDirectory::new(
        Arc::new(PostgresPlayerDirectory::new(pool)),
        Arc::new(InMemoryCache::new(config.cache.capacity)),
        config.cache.ttl,
    );
    let notifier: Arc<dyn Notifier> = match &config.notify.bot_internal_url {
        Some(url) => {
            let bot = BotNotifier::new(url)?;
            info!(endpoint = bot.endpoint(), "Match-end notifications enabled");
            Arc::new(bot)
        }
        None => {
            info!("BOT_INTERNAL_URL not set; skip notifications");
            Arc::new(NoopNotifier)
        }
    };

    let controller = MatchController::new(
        Arc::new(store),
        Arc::new(SystemClock),
        config.controller(),
    )
    .with_notifications(NotificationDispatcher::new(
        Arc::new(directory),
        notifier,
        config.scoring.court_name.clone(),
        config.scoring.club_name.clone(),
    ));

    let app = build_router(AppState::new(controller).with_metrics(metrics));

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(
        address = %address,
        undo_policy = %config.scoring.undo_policy,
        "PadelSense API listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "padelsense=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %error, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}
