use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use serde::Deserialize;

use exam_core::Clock;
use exam_core::model::{SubmissionPayload, TestId};

use crate::error::AttemptApiError;

/// Server acknowledgement of an attempt start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartedAttempt {
    pub started_at_ms: i64,
}

/// Server acknowledgement of a delivered submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub result: String,
}

/// Attempt lifecycle boundary: start and submit.
#[async_trait]
pub trait AttemptApi: Send + Sync {
    /// Register the attempt start and obtain the canonical start timestamp.
    ///
    /// # Errors
    ///
    /// Returns `AttemptApiError` for transport failures.
    async fn start(&self, test_id: &TestId) -> Result<StartedAttempt, AttemptApiError>;

    /// Deliver the submission payload.
    ///
    /// # Errors
    ///
    /// Returns `AttemptApiError` for transport failures; the caller keeps the
    /// payload and retries delivery.
    async fn submit(
        &self,
        test_id: &TestId,
        payload: &SubmissionPayload,
    ) -> Result<SubmissionReceipt, AttemptApiError>;
}

//
// ─── HTTP ──────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartedAttemptDto {
    started_at_ms: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmissionReceiptDto {
    result: String,
}

/// Lifecycle client over the tenant's attempt API.
#[derive(Clone)]
pub struct HttpAttemptApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpAttemptApi {
    #[must_use]
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn check(response: reqwest::Response) -> Result<reqwest::Response, AttemptApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(AttemptApiError::HttpStatus(response.status()))
        }
    }
}

#[async_trait]
impl AttemptApi for HttpAttemptApi {
    async fn start(&self, test_id: &TestId) -> Result<StartedAttempt, AttemptApiError> {
        let url = format!("{}/tests/{}/attempts/start", self.base_url, test_id);
        let response = Self::check(self.http.post(&url).send().await?)?;
        let dto: StartedAttemptDto = response.json().await?;
        Ok(StartedAttempt {
            started_at_ms: dto.started_at_ms,
        })
    }

    async fn submit(
        &self,
        test_id: &TestId,
        payload: &SubmissionPayload,
    ) -> Result<SubmissionReceipt, AttemptApiError> {
        let url = format!("{}/tests/{}/attempts/submit", self.base_url, test_id);
        let response = Self::check(self.http.post(&url).json(payload).send().await?)?;
        let dto: SubmissionReceiptDto = response.json().await?;
        Ok(SubmissionReceipt { result: dto.result })
    }
}

//
// ─── LOCAL ─────────────────────────────────────────────────────────────────────
//

/// Clock-driven lifecycle used for mock runs and tests; counts deliveries so
/// exactly-once behavior can be asserted.
pub struct LocalAttemptApi {
    clock: Clock,
    deliveries: AtomicU32,
}

impl LocalAttemptApi {
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            deliveries: AtomicU32::new(0),
        }
    }

    #[must_use]
    pub fn deliveries(&self) -> u32 {
        self.deliveries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AttemptApi for LocalAttemptApi {
    async fn start(&self, _test_id: &TestId) -> Result<StartedAttempt, AttemptApiError> {
        Ok(StartedAttempt {
            started_at_ms: self.clock.now_ms(),
        })
    }

    async fn submit(
        &self,
        _test_id: &TestId,
        payload: &SubmissionPayload,
    ) -> Result<SubmissionReceipt, AttemptApiError> {
        self.deliveries.fetch_add(1, Ordering::SeqCst);
        Ok(SubmissionReceipt {
            result: format!(
                "recorded {} answers ({})",
                payload.answers.len(),
                payload.reason
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::time::{fixed_clock, fixed_now_ms};

    #[tokio::test]
    async fn local_api_uses_clock_for_start() {
        let api = LocalAttemptApi::new(fixed_clock());
        let started = api.start(&TestId::new("t-1")).await.unwrap();
        assert_eq!(started.started_at_ms, fixed_now_ms());
    }

    #[tokio::test]
    async fn local_api_counts_deliveries() {
        let api = LocalAttemptApi::new(fixed_clock());
        let payload = SubmissionPayload {
            answers: std::collections::BTreeMap::new(),
            violations: 0,
            elapsed_ms: 1_000,
            reason: exam_core::model::SubmitReason::UserSubmitted,
        };

        assert_eq!(api.deliveries(), 0);
        let receipt = api.submit(&TestId::new("t-1"), &payload).await.unwrap();
        assert_eq!(api.deliveries(), 1);
        assert!(receipt.result.contains("user submitted"));
    }
}
