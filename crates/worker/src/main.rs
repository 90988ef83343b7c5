use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cartshift_worker::{SessionDispatcher, WorkerConfig};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cartshift_worker=debug,cartshift_pipeline=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WorkerConfig::from_env().expect("Invalid worker configuration");
    tracing::info!(
        poll_interval_ms = config.poll_interval.as_millis() as u64,
        "Loaded worker configuration"
    );

    let pool = cartshift_db::create_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");
    cartshift_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    cartshift_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database ready");

    let cancel = CancellationToken::new();
    let dispatcher = SessionDispatcher::new(pool).with_poll_interval(config.poll_interval);
    let dispatcher_cancel = cancel.clone();
    let handle = tokio::spawn(async move { dispatcher.run(dispatcher_cancel).await });

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
    }
    tracing::info!("Shutdown requested, waiting for the running session to finish");
    cancel.cancel();
    let _ = handle.await;
    tracing::info!("Worker stopped");
}
