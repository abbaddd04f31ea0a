use std::fmt;

use exam_core::Countdown;
use exam_core::model::{
    AnswerSheet, OptionId, Question, QuestionId, Section, SubmissionPayload, SubmitReason,
    TestDefinition, TestId,
};

use super::progress::{AttemptProgress, PaletteEntry, QuestionStatus};

/// Threshold configuration for an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptConfig {
    /// Violations at or above this count force submission.
    pub max_violations: u32,
}

impl Default for AttemptConfig {
    fn default() -> Self {
        Self { max_violations: 3 }
    }
}

/// Lifecycle phase of an attempt.
///
/// `Submitted` is terminal: no transition leaves it, and every mutating
/// entry point is a silent no-op once it is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptPhase {
    NotStarted,
    InProgress,
    Submitting,
    Submitted,
}

/// The test session state machine.
///
/// Owns all mutable attempt state; display surfaces read snapshots and feed
/// intents back through these entry points. Calls that are invalid for the
/// current phase (a second `request_submit`, navigation after forced
/// submission) are tolerated as no-ops so duplicate UI events cannot corrupt
/// the attempt.
pub struct AttemptSession {
    definition: TestDefinition,
    config: AttemptConfig,
    countdown: Countdown,
    phase: AttemptPhase,
    started_at_ms: Option<i64>,
    current_section: usize,
    current_question: usize,
    sheet: AnswerSheet,
    violations: u32,
    submit_reason: Option<SubmitReason>,
    payload: Option<SubmissionPayload>,
}

impl AttemptSession {
    #[must_use]
    pub fn new(definition: TestDefinition, config: AttemptConfig) -> Self {
        let countdown = Countdown::new(definition.duration_minutes());
        Self {
            definition,
            config,
            countdown,
            phase: AttemptPhase::NotStarted,
            started_at_ms: None,
            current_section: 0,
            current_question: 0,
            sheet: AnswerSheet::new(),
            violations: 0,
            submit_reason: None,
            payload: None,
        }
    }

    //
    // ─── LIFECYCLE ─────────────────────────────────────────────────────────────
    //

    /// Start the attempt: `NotStarted → InProgress`.
    ///
    /// `started_at_ms` comes from the attempt-start collaborator so client
    /// and server agree on the timeline. Set once; later calls are no-ops.
    pub fn begin(&mut self, started_at_ms: i64) {
        if self.phase != AttemptPhase::NotStarted {
            return;
        }
        self.started_at_ms = Some(started_at_ms);
        self.phase = AttemptPhase::InProgress;
    }

    /// Evaluate forced-submission conditions on a timer tick.
    pub fn observe_tick(&mut self, now_ms: i64) {
        self.evaluate_forced(now_ms);
    }

    /// Count one proctoring violation, then evaluate forced submission.
    pub fn record_violation(&mut self, now_ms: i64) {
        if self.phase != AttemptPhase::InProgress {
            return;
        }
        self.violations = self.violations.saturating_add(1);
        self.evaluate_forced(now_ms);
    }

    /// User-invoked submission: `InProgress → Submitting`.
    ///
    /// A forced condition that already holds takes priority over the user
    /// reason; a duplicate call is a no-op, so a double-click still yields a
    /// single pending payload.
    pub fn request_submit(&mut self, now_ms: i64) {
        self.evaluate_forced(now_ms);
        if self.phase != AttemptPhase::InProgress {
            return;
        }
        self.enter_submitting(SubmitReason::UserSubmitted, now_ms);
    }

    /// Mark the pending payload as delivered: `Submitting → Submitted`.
    pub fn confirm_submitted(&mut self) {
        if self.phase != AttemptPhase::Submitting {
            return;
        }
        self.phase = AttemptPhase::Submitted;
    }

    // Time expiry is checked before the violation limit so a tick where both
    // hold reports "time expired".
    fn evaluate_forced(&mut self, now_ms: i64) {
        if self.phase != AttemptPhase::InProgress {
            return;
        }
        if self.countdown.is_expired(self.started_at_ms, now_ms) {
            self.enter_submitting(SubmitReason::TimeExpired, now_ms);
        } else if self.violations >= self.config.max_violations {
            self.enter_submitting(SubmitReason::ViolationLimit, now_ms);
        }
    }

    fn enter_submitting(&mut self, reason: SubmitReason, now_ms: i64) {
        let elapsed_ms = self
            .started_at_ms
            .map_or(0, |started| (now_ms - started).clamp(0, self.countdown.duration_ms()));

        self.phase = AttemptPhase::Submitting;
        self.submit_reason = Some(reason);
        self.payload = Some(SubmissionPayload {
            answers: self.sheet.answers().clone(),
            violations: self.violations,
            elapsed_ms,
            reason,
        });
    }

    //
    // ─── NAVIGATION ────────────────────────────────────────────────────────────
    //

    /// Jump to a section/question pair, clamping out-of-range indices to the
    /// nearest valid position instead of erroring.
    pub fn go_to(&mut self, section: usize, question: usize) {
        if self.phase != AttemptPhase::InProgress {
            return;
        }
        let section = section.min(self.definition.sections().len() - 1);
        let question_count = self.definition.sections()[section].questions().len();
        self.current_section = section;
        self.current_question = question.min(question_count - 1);
    }

    /// Advance to the next question, walking across section boundaries.
    /// At the very last question this is a no-op.
    pub fn next(&mut self) {
        if self.phase != AttemptPhase::InProgress {
            return;
        }
        let section_len = self.definition.sections()[self.current_section]
            .questions()
            .len();
        if self.current_question + 1 < section_len {
            self.current_question += 1;
        } else if self.current_section + 1 < self.definition.sections().len() {
            self.current_section += 1;
            self.current_question = 0;
        }
    }

    /// Step back to the previous question, walking across section
    /// boundaries. At the very first question this is a no-op.
    pub fn previous(&mut self) {
        if self.phase != AttemptPhase::InProgress {
            return;
        }
        if self.current_question > 0 {
            self.current_question -= 1;
        } else if self.current_section > 0 {
            self.current_section -= 1;
            self.current_question = self.definition.sections()[self.current_section]
                .questions()
                .len()
                - 1;
        }
    }

    //
    // ─── ANSWERS ───────────────────────────────────────────────────────────────
    //

    /// Select an option for a question; re-selecting overwrites.
    ///
    /// Ids must belong to the fetched definition: a mismatch is a
    /// programming error (asserts in debug builds, no-op in release).
    pub fn select_answer(&mut self, question_id: &QuestionId, option_id: &OptionId) {
        if self.phase != AttemptPhase::InProgress {
            return;
        }
        let valid = self.definition.option_belongs(question_id, option_id);
        debug_assert!(valid, "answer ids must belong to the test definition");
        if !valid {
            return;
        }
        self.sheet.select(question_id.clone(), option_id.clone());
    }

    pub fn clear_answer(&mut self, question_id: &QuestionId) {
        if self.phase != AttemptPhase::InProgress {
            return;
        }
        self.sheet.clear(question_id);
    }

    pub fn toggle_review(&mut self, question_id: &QuestionId) {
        if self.phase != AttemptPhase::InProgress {
            return;
        }
        let valid = self.definition.contains_question(question_id);
        debug_assert!(valid, "review ids must belong to the test definition");
        if !valid {
            return;
        }
        self.sheet.toggle_review(question_id);
    }

    //
    // ─── SNAPSHOTS ─────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn phase(&self) -> AttemptPhase {
        self.phase
    }

    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.phase == AttemptPhase::Submitted
    }

    #[must_use]
    pub fn test_id(&self) -> &TestId {
        self.definition.id()
    }

    #[must_use]
    pub fn definition(&self) -> &TestDefinition {
        &self.definition
    }

    #[must_use]
    pub fn started_at_ms(&self) -> Option<i64> {
        self.started_at_ms
    }

    #[must_use]
    pub fn violations(&self) -> u32 {
        self.violations
    }

    #[must_use]
    pub fn max_violations(&self) -> u32 {
        self.config.max_violations
    }

    #[must_use]
    pub fn submit_reason(&self) -> Option<SubmitReason> {
        self.submit_reason
    }

    /// The snapshot awaiting delivery; `Some` only once `Submitting` was
    /// entered. Retries read this same value.
    #[must_use]
    pub fn pending_payload(&self) -> Option<&SubmissionPayload> {
        self.payload.as_ref()
    }

    #[must_use]
    pub fn remaining_ms(&self, now_ms: i64) -> i64 {
        self.countdown.remaining_ms(self.started_at_ms, now_ms)
    }

    #[must_use]
    pub fn current_section_index(&self) -> usize {
        self.current_section
    }

    #[must_use]
    pub fn current_question_index(&self) -> usize {
        self.current_question
    }

    #[must_use]
    pub fn current_section(&self) -> &Section {
        &self.definition.sections()[self.current_section]
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        &self.current_section().questions()[self.current_question]
    }

    #[must_use]
    pub fn sheet(&self) -> &AnswerSheet {
        &self.sheet
    }

    /// Aggregate counts for the header bar.
    #[must_use]
    pub fn progress(&self) -> AttemptProgress {
        let total = self.definition.question_count();
        let answered = self.sheet.answered_count();
        AttemptProgress {
            total,
            answered,
            marked: self.sheet.marked_count(),
            unanswered: total.saturating_sub(answered),
        }
    }

    /// Flat palette snapshot in section order, numbered from 1.
    #[must_use]
    pub fn palette(&self) -> Vec<PaletteEntry> {
        let mut entries = Vec::with_capacity(self.definition.question_count());
        let mut number = 0;
        for (section_index, section) in self.definition.sections().iter().enumerate() {
            for (question_index, question) in section.questions().iter().enumerate() {
                number += 1;
                let answered = self.sheet.is_answered(question.id());
                let marked = self.sheet.is_marked_for_review(question.id());
                let status = match (answered, marked) {
                    (true, true) => QuestionStatus::AnsweredAndMarked,
                    (true, false) => QuestionStatus::Answered,
                    (false, true) => QuestionStatus::Marked,
                    (false, false) => QuestionStatus::Unanswered,
                };
                entries.push(PaletteEntry {
                    number,
                    section: section_index,
                    question: question_index,
                    question_id: question.id().clone(),
                    status,
                    is_current: section_index == self.current_section
                        && question_index == self.current_question,
                });
            }
        }
        entries
    }
}

impl fmt::Debug for AttemptSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttemptSession")
            .field("test_id", self.definition.id())
            .field("phase", &self.phase)
            .field("current_section", &self.current_section)
            .field("current_question", &self.current_question)
            .field("answered", &self.sheet.answered_count())
            .field("violations", &self.violations)
            .field("submit_reason", &self.submit_reason)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::mock_definition;
    use exam_core::model::{ChoiceOption, Question, Section, SectionId, TestDefinition};
    use exam_core::time::fixed_now_ms;

    fn option(id: &str) -> ChoiceOption {
        ChoiceOption::new(OptionId::new(id), format!("Option {id}"), None)
    }

    fn question(id: &str) -> Question {
        Question::multiple_choice(
            QuestionId::new(id),
            format!("Question {id}"),
            None,
            vec![option(&format!("{id}-a")), option(&format!("{id}-b"))],
            4.0,
            1.0,
        )
        .unwrap()
    }

    fn two_section_test() -> TestDefinition {
        TestDefinition::new(
            TestId::new("t-1"),
            "Two Sections",
            10,
            vec![
                Section::new(
                    SectionId::new("s-1"),
                    "One",
                    vec![question("q-1"), question("q-2")],
                ),
                Section::new(SectionId::new("s-2"), "Two", vec![question("q-3")]),
            ],
        )
        .unwrap()
    }

    fn started_session() -> (AttemptSession, i64) {
        let mut session = AttemptSession::new(two_section_test(), AttemptConfig::default());
        let start = fixed_now_ms();
        session.begin(start);
        (session, start)
    }

    #[test]
    fn begin_moves_to_in_progress_once() {
        let mut session = AttemptSession::new(two_section_test(), AttemptConfig::default());
        assert_eq!(session.phase(), AttemptPhase::NotStarted);

        session.begin(1_000);
        assert_eq!(session.phase(), AttemptPhase::InProgress);
        assert_eq!(session.started_at_ms(), Some(1_000));

        session.begin(9_000);
        assert_eq!(session.started_at_ms(), Some(1_000));
    }

    #[test]
    fn navigation_requires_in_progress() {
        let mut session = AttemptSession::new(two_section_test(), AttemptConfig::default());
        session.next();
        assert_eq!(session.current_question_index(), 0);
    }

    #[test]
    fn next_and_previous_walk_across_sections() {
        let (mut session, _) = started_session();

        session.next();
        assert_eq!(session.current_question().id(), &QuestionId::new("q-2"));

        session.next();
        assert_eq!(session.current_section_index(), 1);
        assert_eq!(session.current_question().id(), &QuestionId::new("q-3"));

        // Last question: no-op.
        session.next();
        assert_eq!(session.current_section_index(), 1);

        session.previous();
        assert_eq!(session.current_section_index(), 0);
        assert_eq!(session.current_question().id(), &QuestionId::new("q-2"));

        session.previous();
        session.previous();
        assert_eq!(session.current_question().id(), &QuestionId::new("q-1"));
    }

    #[test]
    fn go_to_clamps_out_of_range() {
        let mut session = AttemptSession::new(mock_definition(&TestId::new("demo")), AttemptConfig::default());
        session.begin(fixed_now_ms());

        session.go_to(5, 0);
        assert_eq!(session.current_section_index(), 2);
        assert_eq!(session.current_question_index(), 0);

        session.go_to(1, 99);
        assert_eq!(session.current_section_index(), 1);
        assert_eq!(session.current_question_index(), 9);
    }

    #[test]
    fn answers_round_trip_through_session() {
        let (mut session, _) = started_session();
        let q = QuestionId::new("q-1");

        session.select_answer(&q, &OptionId::new("q-1-a"));
        assert!(session.sheet().is_answered(&q));

        session.select_answer(&q, &OptionId::new("q-1-b"));
        assert_eq!(session.sheet().selected(&q), Some(&OptionId::new("q-1-b")));

        session.clear_answer(&q);
        assert!(!session.sheet().is_answered(&q));
    }

    #[test]
    fn violation_limit_forces_submission() {
        let (mut session, start) = started_session();
        let now = start + 5_000;

        session.record_violation(now);
        session.record_violation(now);
        assert_eq!(session.phase(), AttemptPhase::InProgress);

        session.record_violation(now);
        assert_eq!(session.phase(), AttemptPhase::Submitting);
        assert_eq!(session.submit_reason(), Some(SubmitReason::ViolationLimit));

        // Navigation is dead after forced submission.
        session.next();
        assert_eq!(session.current_question_index(), 0);

        let payload = session.pending_payload().unwrap();
        assert_eq!(payload.violations, 3);
        assert_eq!(payload.reason, SubmitReason::ViolationLimit);
    }

    #[test]
    fn time_expiry_forces_submission_with_unanswered_questions() {
        let (mut session, start) = started_session();

        session.observe_tick(start + 9 * 60_000);
        assert_eq!(session.phase(), AttemptPhase::InProgress);

        session.observe_tick(start + 10 * 60_000);
        assert_eq!(session.phase(), AttemptPhase::Submitting);
        assert_eq!(session.submit_reason(), Some(SubmitReason::TimeExpired));

        let payload = session.pending_payload().unwrap();
        assert!(payload.answers.is_empty());
        assert_eq!(payload.elapsed_ms, 10 * 60_000);
    }

    #[test]
    fn time_expiry_wins_over_violation_limit() {
        let (mut session, start) = started_session();
        session.record_violation(start + 1_000);
        session.record_violation(start + 2_000);

        // The third violation lands on a tick where time has also run out.
        session.record_violation(start + 10 * 60_000);
        assert_eq!(session.submit_reason(), Some(SubmitReason::TimeExpired));
    }

    #[test]
    fn duplicate_submit_keeps_one_payload() {
        let (mut session, start) = started_session();
        session.select_answer(&QuestionId::new("q-1"), &OptionId::new("q-1-a"));

        session.request_submit(start + 30_000);
        let first = session.pending_payload().cloned().unwrap();

        session.request_submit(start + 31_000);
        assert_eq!(session.pending_payload(), Some(&first));
        assert_eq!(first.reason, SubmitReason::UserSubmitted);
        assert_eq!(first.elapsed_ms, 30_000);
    }

    #[test]
    fn submitted_is_terminal() {
        let (mut session, start) = started_session();
        session.request_submit(start + 1_000);
        session.confirm_submitted();
        assert!(session.is_submitted());

        session.record_violation(start + 2_000);
        session.select_answer(&QuestionId::new("q-1"), &OptionId::new("q-1-a"));
        session.confirm_submitted();

        assert_eq!(session.violations(), 0);
        assert!(!session.sheet().is_answered(&QuestionId::new("q-1")));
        assert!(session.is_submitted());
    }

    #[test]
    fn confirm_requires_submitting_phase() {
        let (mut session, _) = started_session();
        session.confirm_submitted();
        assert_eq!(session.phase(), AttemptPhase::InProgress);
    }

    #[test]
    fn palette_tracks_status_and_position() {
        let (mut session, _) = started_session();
        session.select_answer(&QuestionId::new("q-1"), &OptionId::new("q-1-a"));
        session.toggle_review(&QuestionId::new("q-2"));
        session.next();

        let palette = session.palette();
        assert_eq!(palette.len(), 3);
        assert_eq!(palette[0].status, QuestionStatus::Answered);
        assert_eq!(palette[1].status, QuestionStatus::Marked);
        assert!(palette[1].is_current);
        assert_eq!(palette[2].number, 3);

        let progress = session.progress();
        assert_eq!(progress.answered, 1);
        assert_eq!(progress.marked, 1);
        assert_eq!(progress.unanswered, 2);
    }

    #[test]
    fn remaining_time_derives_from_start() {
        let (session, start) = started_session();
        assert_eq!(session.remaining_ms(start), 10 * 60_000);
        assert_eq!(session.remaining_ms(start + 90_000), 10 * 60_000 - 90_000);
        assert_eq!(session.remaining_ms(start + 11 * 60_000), 0);
    }
}
