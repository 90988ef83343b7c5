//! Session dispatcher.
//!
//! Polls for triggered sessions every `poll_interval` and runs them one at
//! a time. Uses `SELECT FOR UPDATE SKIP LOCKED` via
//! [`MigrationSessionRepo::claim_next`] so two dispatchers never run the
//! same session.

use std::time::Duration;

use cartshift_core::migration::SessionState;
use cartshift_db::repositories::MigrationSessionRepo;
use cartshift_pipeline::pg::run_claimed_session;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

/// Default polling interval for the dispatcher loop.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Single-worker background dispatcher.
///
/// Sessions run serially: later phases depend on the identity mappings of
/// earlier ones, and a session owns its runs exclusively while it executes.
pub struct SessionDispatcher {
    pool: PgPool,
    poll_interval: Duration,
}

impl SessionDispatcher {
    /// Create a new dispatcher with the default 1-second poll interval.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Run the dispatcher loop until the cancellation token is triggered.
    ///
    /// A session already running when cancellation arrives is finished
    /// first; there is no mid-run cancellation.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        tracing::info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "Session dispatcher started",
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Session dispatcher shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.drain().await {
                        tracing::error!(error = %e, "Dispatch cycle failed");
                    }
                }
            }
        }
    }

    /// Run queued sessions until none is left.
    async fn drain(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        while self.try_dispatch().await? {}
        Ok(())
    }

    /// Claim and run one session. Returns `false` when the queue is empty.
    pub async fn try_dispatch(&self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let Some(session) = MigrationSessionRepo::claim_next(&self.pool).await? else {
            return Ok(false);
        };

        tracing::info!(
            session_id = session.id,
            connection_id = session.connection_id,
            "Session claimed",
        );

        match run_claimed_session(&self.pool, &session).await {
            Ok(outcome) => {
                tracing::info!(
                    session_id = session.id,
                    state = %outcome.state,
                    phases = outcome.phases.len(),
                    "Session finished",
                );
            }
            Err(e) => {
                // The snapshot could not be written; make a last attempt to
                // leave the session in a terminal state.
                tracing::error!(session_id = session.id, error = %e, "Session aborted");
                MigrationSessionRepo::append_log(
                    &self.pool,
                    session.id,
                    &format!("\nMigration failed:\n{e}\n"),
                )
                .await?;
                MigrationSessionRepo::finish(&self.pool, session.id, SessionState::Failed, None)
                    .await?;
            }
        }

        Ok(true)
    }
}
