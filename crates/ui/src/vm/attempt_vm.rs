use exam_core::TimeDisplay;
use exam_core::model::{OptionId, QuestionId, SubmitReason};
use services::{
    AttemptLoopService, AttemptPhase, AttemptProgress, AttemptSession, PaletteEntry,
};

use crate::views::ViewError;

/// Everything the attempt view can ask the session machine to do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttemptIntent {
    Select(QuestionId, OptionId),
    ClearAnswer(QuestionId),
    ToggleReview(QuestionId),
    Next,
    Previous,
    JumpTo(usize, usize),
    Submit,
    RetrySubmit,
}

/// Wraps the session state machine for the attempt view.
///
/// The view never touches the session directly: navigation and answer
/// intents mutate through here synchronously, and delivery is the one async
/// path (driven by the workflow service).
pub struct AttemptVm {
    session: AttemptSession,
}

impl AttemptVm {
    #[must_use]
    pub fn new(session: AttemptSession) -> Self {
        Self { session }
    }

    #[must_use]
    pub fn session(&self) -> &AttemptSession {
        &self.session
    }

    #[must_use]
    pub fn phase(&self) -> AttemptPhase {
        self.session.phase()
    }

    #[must_use]
    pub fn title(&self) -> &str {
        self.session.definition().title()
    }

    #[must_use]
    pub fn timer_label(&self, now_ms: i64) -> String {
        TimeDisplay::from_ms(self.session.remaining_ms(now_ms)).label()
    }

    #[must_use]
    pub fn progress(&self) -> AttemptProgress {
        self.session.progress()
    }

    #[must_use]
    pub fn palette(&self) -> Vec<PaletteEntry> {
        self.session.palette()
    }

    #[must_use]
    pub fn violations_label(&self) -> String {
        format!(
            "Violations: {} / {}",
            self.session.violations(),
            self.session.max_violations()
        )
    }

    #[must_use]
    pub fn submit_reason(&self) -> Option<SubmitReason> {
        self.session.submit_reason()
    }

    #[must_use]
    pub fn section_name(&self) -> &str {
        self.session.current_section().name()
    }

    /// Apply a synchronous navigation/answer intent. `Submit`/`RetrySubmit`
    /// only move the machine to `Submitting`; delivery happens in
    /// [`AttemptVm::deliver`].
    pub fn apply(&mut self, intent: &AttemptIntent, now_ms: i64) {
        match intent {
            AttemptIntent::Select(question, option) => {
                self.session.select_answer(question, option);
            }
            AttemptIntent::ClearAnswer(question) => self.session.clear_answer(question),
            AttemptIntent::ToggleReview(question) => self.session.toggle_review(question),
            AttemptIntent::Next => self.session.next(),
            AttemptIntent::Previous => self.session.previous(),
            AttemptIntent::JumpTo(section, question) => self.session.go_to(*section, *question),
            AttemptIntent::Submit | AttemptIntent::RetrySubmit => {
                self.session.request_submit(now_ms);
            }
        }
    }

    /// Feed a timer tick through the machine; returns true when the tick
    /// forced the attempt into `Submitting`.
    pub fn observe_tick(&mut self, now_ms: i64) -> bool {
        let before = self.session.phase();
        self.session.observe_tick(now_ms);
        before == AttemptPhase::InProgress && self.session.phase() == AttemptPhase::Submitting
    }

    /// Count a proctoring violation; returns true when it forced submission.
    pub fn record_violation(&mut self, now_ms: i64) -> bool {
        let before = self.session.phase();
        self.session.record_violation(now_ms);
        before == AttemptPhase::InProgress && self.session.phase() == AttemptPhase::Submitting
    }

    #[must_use]
    pub fn needs_delivery(&self) -> bool {
        self.session.phase() == AttemptPhase::Submitting
    }

    /// Deliver the pending payload through the workflow service; returns the
    /// server's result string.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::SubmitFailed` when delivery fails; the session
    /// stays in `Submitting` and the same payload is retried.
    pub async fn deliver(
        &mut self,
        attempt_loop: &AttemptLoopService,
    ) -> Result<String, ViewError> {
        match attempt_loop.deliver(&mut self.session).await {
            Ok(receipt) => Ok(receipt.result),
            Err(services::AttemptError::NothingToDeliver) => Err(ViewError::Unknown),
            Err(_) => Err(ViewError::SubmitFailed),
        }
    }
}
