//! Player lookup backed by the `users` table.

use padelsense_core::notify::{NotifyError, PlayerDirectory, Recipient};
use padelsense_core::types::PlayerId;
use sqlx::PgPool;
use std::future::Future;
use std::pin::Pin;

/// Resolves players to the Telegram chat they are notified on.
///
/// Players without a row, or with no `telegram_id`, resolve to `None`.
#[derive(Clone)]
pub struct PostgresPlayerDirectory {
    pool: PgPool,
}

impl PostgresPlayerDirectory {
    /// Create a directory using an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl PlayerDirectory for PostgresPlayerDirectory {
    fn recipient(
        &self,
        player: PlayerId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Recipient>, NotifyError>> + Send + '_>> {
        Box::pin(async move {
            let row: Option<(Option<i64>,)> =
                sqlx::query_as("SELECT telegram_id FROM users WHERE id = $1")
                    .bind(*player.as_uuid())
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(|e| NotifyError::Directory(format!("Failed to look up player: {e}")))?;

            Ok(row.and_then(|(telegram_id,)| telegram_id).map(Recipient::new))
        })
    }
}
