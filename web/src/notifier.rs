//! Match-end notifiers.
//!
//! [`BotNotifier`] asks the Telegram bot's internal API to message the
//! players. [`NoopNotifier`] stands in when no bot is configured.

use padelsense_core::notify::{MatchSummary, Notifier, NotifyError, Recipient};
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Request timeout for the bot call
pub const BOT_TIMEOUT: Duration = Duration::from_secs(10);

/// Body of `POST {bot}/notify-match-end`.
#[derive(Debug, Serialize)]
struct NotifyRequest {
    telegram_ids: Vec<Recipient>,
    text: String,
}

/// Notifier calling the bot's `/notify-match-end` endpoint.
#[derive(Clone, Debug)]
pub struct BotNotifier {
    client: reqwest::Client,
    endpoint: String,
}

impl BotNotifier {
    /// Create a notifier for the bot at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Transport`] if the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(BOT_TIMEOUT)
            .build()
            .map_err(|e| NotifyError::Transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/notify-match-end", base_url.trim_end_matches('/')),
        })
    }

    /// Full URL notifications are posted to
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Notifier for BotNotifier {
    fn notify_match_end(
        &self,
        recipients: Vec<Recipient>,
        summary: MatchSummary,
    ) -> Pin<Box<dyn Future<Output = Result<(), NotifyError>> + Send + '_>> {
        Box::pin(async move {
            let body = NotifyRequest {
                telegram_ids: recipients,
                text: summary.message(),
            };

            let response = self
                .client
                .post(&self.endpoint)
                .json(&body)
                .send()
                .await
                .map_err(|e| NotifyError::Transport(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(NotifyError::Rejected {
                    status: status.as_u16(),
                    body,
                });
            }

            tracing::debug!(
                match_id = %summary.match_id,
                recipients = body.telegram_ids.len(),
                "Bot accepted match-end notification"
            );
            Ok(())
        })
    }
}

/// Notifier used when `BOT_INTERNAL_URL` is unset.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify_match_end(
        &self,
        _recipients: Vec<Recipient>,
        summary: MatchSummary,
    ) -> Pin<Box<dyn Future<Output = Result<(), NotifyError>> + Send + '_>> {
        Box::pin(async move {
            tracing::info!(match_id = %summary.match_id, "BOT_INTERNAL_URL not set; skip notifications");
            Ok(())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can use unwrap
mod tests {
    use super::*;
    use padelsense_testing::fixtures;

    #[test]
    fn endpoint_ignores_trailing_slash() {
        let notifier = BotNotifier::new("http://bot:8080/").unwrap();
        assert_eq!(notifier.endpoint(), "http://bot:8080/notify-match-end");
    }

    #[test]
    fn request_body_has_bot_shape() {
        let summary = MatchSummary::of(&fixtures::started_match(), "Корт 1", "PadelClub");
        let body = NotifyRequest {
            telegram_ids: vec![Recipient::new(1), Recipient::new(2)],
            text: summary.message(),
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["telegram_ids"], serde_json::json!([1, 2]));
        assert!(json["text"].as_str().unwrap().contains("PadelClub, Корт 1"));
    }

    #[tokio::test]
    async fn unreachable_bot_is_a_transport_error() {
        // Port 9 (discard) on localhost is closed in test environments.
        let notifier = BotNotifier::new("http://127.0.0.1:9").unwrap();
        let summary = MatchSummary::of(&fixtures::started_match(), "Корт 1", "PadelClub");

        let result = notifier
            .notify_match_end(vec![Recipient::new(1)], summary)
            .await;
        assert!(matches!(result, Err(NotifyError::Transport(_))));
    }

    #[tokio::test]
    async fn noop_notifier_succeeds() {
        let summary = MatchSummary::of(&fixtures::started_match(), "Корт 1", "PadelClub");
        assert!(NoopNotifier.notify_match_end(vec![], summary).await.is_ok());
    }
}
