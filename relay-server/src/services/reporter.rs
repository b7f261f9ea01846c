//! Outcome reporting
//!
//! Forwards a verified outcome to the platform session layer. Delivery runs in
//! a detached task so the wallet's acknowledgment never waits on platform
//! health; the store's reported flag keeps notifications to at most one per
//! challenge. After the retry budget is spent the failure is logged and the
//! outcome abandoned.

use relay_common::types::SessionCallback;
use relay_common::{RelayError, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};
use verusid_login::ChallengeId;

use crate::store::ChallengeStore;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_ATTEMPTS: u32 = 3;

#[derive(Clone)]
pub struct OutcomeReporter {
    callback_url: String,
    client: reqwest::Client,
    store: Arc<dyn ChallengeStore>,
    retry_delay: Duration,
}

impl OutcomeReporter {
    pub fn new(
        platform_internal_url: &str,
        store: Arc<dyn ChallengeStore>,
        retry_delay: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RelayError::ReportingFailure(format!("client: {e}")))?;
        Ok(Self {
            callback_url: format!(
                "{}/auth/qr/callback",
                platform_internal_url.trim_end_matches('/')
            ),
            client,
            store,
            retry_delay,
        })
    }

    /// Detach delivery from the caller. The verification outcome is already
    /// committed; nothing here can change it.
    pub fn spawn_report(&self, challenge_id: ChallengeId, signing_id: String) {
        let reporter = self.clone();
        tokio::spawn(async move {
            reporter.report(challenge_id, signing_id).await;
        });
    }

    /// Deliver with a bounded retry budget, marking the challenge reported
    /// only after a successful acknowledgment.
    pub async fn report(&self, challenge_id: ChallengeId, signing_id: String) {
        let payload = SessionCallback {
            challenge_id: challenge_id.clone(),
            signing_id,
            verified: true,
        };

        for attempt in 1..=MAX_ATTEMPTS {
            match self.deliver(&payload).await {
                Ok(()) => {
                    if self.store.mark_reported(&challenge_id).await {
                        debug!(challenge_id = %challenge_id, "outcome reported to platform");
                    }
                    return;
                }
                Err(e) => {
                    warn!(
                        challenge_id = %challenge_id,
                        attempt,
                        error = %e,
                        "outcome report attempt failed"
                    );
                }
            }
            if attempt < MAX_ATTEMPTS {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        error!(challenge_id = %challenge_id, "outcome report abandoned after {MAX_ATTEMPTS} attempts");
    }

    async fn deliver(&self, payload: &SessionCallback) -> Result<()> {
        let response = self
            .client
            .post(&self.callback_url)
            .json(payload)
            .send()
            .await
            .map_err(|e| RelayError::ReportingFailure(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RelayError::ReportingFailure(format!(
                "platform returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryChallengeStore;
    use chrono::{Duration as ChronoDuration, Utc};
    use relay_common::types::ChallengeRecord;

    async fn store_with_pending() -> (Arc<MemoryChallengeStore>, ChallengeId) {
        let store = Arc::new(MemoryChallengeStore::new());
        let now = Utc::now();
        let record = ChallengeRecord::pending(
            ChallengeId::generate(),
            now,
            now + ChronoDuration::seconds(300),
        );
        let id = record.id.clone();
        store.put(record).await.unwrap();
        (store, id)
    }

    #[tokio::test]
    async fn test_successful_report_sets_flag() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/auth/qr/callback")
            .with_status(200)
            .create_async()
            .await;

        let (store, id) = store_with_pending().await;
        let reporter =
            OutcomeReporter::new(&server.url(), store.clone(), Duration::from_millis(10)).unwrap();

        reporter.report(id.clone(), "alice@".to_string()).await;

        mock.assert_async().await;
        assert!(store.get(&id).await.unwrap().reported);
    }

    #[tokio::test]
    async fn test_failure_exhausts_retries_without_flag() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/auth/qr/callback")
            .with_status(502)
            .expect(3)
            .create_async()
            .await;

        let (store, id) = store_with_pending().await;
        let reporter =
            OutcomeReporter::new(&server.url(), store.clone(), Duration::from_millis(10)).unwrap();

        reporter.report(id.clone(), "alice@".to_string()).await;

        mock.assert_async().await;
        assert!(!store.get(&id).await.unwrap().reported);
    }

    #[tokio::test]
    async fn test_callback_payload_shape() {
        let mut server = mockito::Server::new_async().await;
        let (store, id) = store_with_pending().await;
        let mock = server
            .mock("POST", "/auth/qr/callback")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "challengeId": id.to_string(),
                "signingId": "alice@",
                "verified": true,
            })))
            .with_status(200)
            .create_async()
            .await;

        let reporter =
            OutcomeReporter::new(&server.url(), store, Duration::from_millis(10)).unwrap();
        reporter.report(id, "alice@".to_string()).await;

        mock.assert_async().await;
    }
}
