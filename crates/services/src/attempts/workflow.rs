use std::sync::Arc;

use exam_core::Clock;
use exam_core::model::TestId;

use crate::catalog::{MockTestCatalog, TestCatalog, TestSource};
use crate::error::AttemptError;
use super::api::{AttemptApi, SubmissionReceipt};
use super::session::{AttemptConfig, AttemptPhase, AttemptSession};

/// Orchestrates attempt start and submission delivery.
///
/// The session machine stays pure; this service is the only place the
/// catalog and lifecycle collaborators are awaited.
#[derive(Clone)]
pub struct AttemptLoopService {
    clock: Clock,
    catalog: Arc<dyn TestCatalog>,
    mock_catalog: Arc<dyn TestCatalog>,
    api: Arc<dyn AttemptApi>,
    config: AttemptConfig,
}

impl AttemptLoopService {
    #[must_use]
    pub fn new(clock: Clock, catalog: Arc<dyn TestCatalog>, api: Arc<dyn AttemptApi>) -> Self {
        Self {
            clock,
            catalog,
            mock_catalog: Arc::new(MockTestCatalog::new()),
            api,
            config: AttemptConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: AttemptConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Fetch the definition, register the start, and begin the session.
    ///
    /// A fetch or start failure blocks entry into `InProgress`; callers show
    /// a retry screen and call again.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::Catalog` when the definition cannot be loaded
    /// and `AttemptError::Api` when the start call fails.
    pub async fn start_attempt(
        &self,
        test_id: &TestId,
        source: TestSource,
    ) -> Result<AttemptSession, AttemptError> {
        let catalog = match source {
            TestSource::Mock => &self.mock_catalog,
            TestSource::Live => &self.catalog,
        };
        let definition = catalog.load_test(test_id).await?;
        let started = self.api.start(test_id).await?;

        let mut session = AttemptSession::new(definition, self.config);
        session.begin(started.started_at_ms);
        Ok(session)
    }

    /// Deliver the pending payload; `Submitting → Submitted` on success.
    ///
    /// On failure the session stays in `Submitting` and the same payload is
    /// re-delivered on the next call; editing never reopens.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::NothingToDeliver` outside `Submitting` and
    /// `AttemptError::Api` when delivery fails (retryable).
    pub async fn deliver(
        &self,
        session: &mut AttemptSession,
    ) -> Result<SubmissionReceipt, AttemptError> {
        if session.phase() != AttemptPhase::Submitting {
            return Err(AttemptError::NothingToDeliver);
        }
        let payload = session
            .pending_payload()
            .cloned()
            .ok_or(AttemptError::NothingToDeliver)?;

        let receipt = self.api.submit(session.test_id(), &payload).await?;
        session.confirm_submitted();
        Ok(receipt)
    }
}
