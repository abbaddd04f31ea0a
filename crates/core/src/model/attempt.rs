use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::ids::{OptionId, QuestionId};

//
// ─── ANSWER SHEET ──────────────────────────────────────────────────────────────
//

/// Per-question answer and review-flag state across all sections.
///
/// The sheet is a dumb container: every operation is total and infallible.
/// Id validity against the fetched definition is the session machine's job,
/// which is the only mutator of this state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerSheet {
    answers: BTreeMap<QuestionId, OptionId>,
    review_flags: BTreeSet<QuestionId>,
}

impl AnswerSheet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert the selected option; re-answering overwrites the prior choice.
    pub fn select(&mut self, question_id: QuestionId, option_id: OptionId) {
        self.answers.insert(question_id, option_id);
    }

    /// Remove the answer if present.
    pub fn clear(&mut self, question_id: &QuestionId) {
        self.answers.remove(question_id);
    }

    /// Flip review-flag membership for the question.
    pub fn toggle_review(&mut self, question_id: &QuestionId) {
        if !self.review_flags.remove(question_id) {
            self.review_flags.insert(question_id.clone());
        }
    }

    #[must_use]
    pub fn is_answered(&self, question_id: &QuestionId) -> bool {
        self.answers.contains_key(question_id)
    }

    #[must_use]
    pub fn is_marked_for_review(&self, question_id: &QuestionId) -> bool {
        self.review_flags.contains(question_id)
    }

    #[must_use]
    pub fn selected(&self, question_id: &QuestionId) -> Option<&OptionId> {
        self.answers.get(question_id)
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn marked_count(&self) -> usize {
        self.review_flags.len()
    }

    #[must_use]
    pub fn answers(&self) -> &BTreeMap<QuestionId, OptionId> {
        &self.answers
    }
}

//
// ─── SUBMISSION ────────────────────────────────────────────────────────────────
//

/// Why the attempt left `InProgress`.
///
/// The wire form matches the canonical reason strings so client and server
/// report identical text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmitReason {
    #[serde(rename = "time expired")]
    TimeExpired,
    #[serde(rename = "violation limit exceeded")]
    ViolationLimit,
    #[serde(rename = "user submitted")]
    UserSubmitted,
}

impl SubmitReason {
    /// Canonical reason string reported to the backend and the UI.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SubmitReason::TimeExpired => "time expired",
            SubmitReason::ViolationLimit => "violation limit exceeded",
            SubmitReason::UserSubmitted => "user submitted",
        }
    }
}

impl fmt::Display for SubmitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The snapshot handed to the submit collaborator.
///
/// Built exactly once when the session enters `Submitting`; retries deliver
/// this same value rather than rebuilding it, so the answers a student saw
/// at the moment the test ended are the answers that get recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub answers: BTreeMap<QuestionId, OptionId>,
    pub violations: u32,
    pub elapsed_ms: i64,
    pub reason: SubmitReason,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(id: &str) -> QuestionId {
        QuestionId::new(id)
    }

    fn opt(id: &str) -> OptionId {
        OptionId::new(id)
    }

    #[test]
    fn select_then_answered() {
        let mut sheet = AnswerSheet::new();
        assert!(!sheet.is_answered(&q("q-1")));

        sheet.select(q("q-1"), opt("a"));
        assert!(sheet.is_answered(&q("q-1")));
        assert_eq!(sheet.selected(&q("q-1")), Some(&opt("a")));
    }

    #[test]
    fn reanswering_overwrites() {
        let mut sheet = AnswerSheet::new();
        sheet.select(q("q-1"), opt("a"));
        sheet.select(q("q-1"), opt("b"));

        assert_eq!(sheet.selected(&q("q-1")), Some(&opt("b")));
        assert_eq!(sheet.answered_count(), 1);
    }

    #[test]
    fn clear_then_unanswered() {
        let mut sheet = AnswerSheet::new();
        sheet.select(q("q-1"), opt("a"));
        sheet.clear(&q("q-1"));
        assert!(!sheet.is_answered(&q("q-1")));

        // Clearing an absent answer is a no-op.
        sheet.clear(&q("q-2"));
        assert_eq!(sheet.answered_count(), 0);
    }

    #[test]
    fn toggle_review_is_an_involution() {
        let mut sheet = AnswerSheet::new();
        sheet.toggle_review(&q("q-3"));
        assert!(sheet.is_marked_for_review(&q("q-3")));

        sheet.toggle_review(&q("q-3"));
        assert!(!sheet.is_marked_for_review(&q("q-3")));
        assert_eq!(sheet.marked_count(), 0);
    }

    #[test]
    fn payload_serializes_with_wire_names() {
        let mut answers = BTreeMap::new();
        answers.insert(q("q-1-1"), opt("opt-1-1-2"));
        let payload = SubmissionPayload {
            answers,
            violations: 2,
            elapsed_ms: 90_000,
            reason: SubmitReason::UserSubmitted,
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["elapsedMs"], 90_000);
        assert_eq!(json["violations"], 2);
        assert_eq!(json["reason"], "user submitted");
        assert_eq!(json["answers"]["q-1-1"], "opt-1-1-2");
    }
}
