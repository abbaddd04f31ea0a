use std::collections::HashSet;

use thiserror::Error;

use crate::model::ids::{OptionId, QuestionId, SectionId, TestId};
use crate::model::media::MediaUri;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum TestDefinitionError {
    #[error("test title cannot be empty")]
    EmptyTitle,

    #[error("test duration must be > 0 minutes")]
    InvalidDuration,

    #[error("test must contain at least one section")]
    NoSections,

    #[error("section {section} has no questions")]
    EmptySection { section: SectionId },

    #[error("question {question} needs at least two options, has {len}")]
    TooFewOptions { question: QuestionId, len: usize },

    #[error("question {question} has negative marks configuration")]
    InvalidMarks { question: QuestionId },

    #[error("duplicate question id {question}")]
    DuplicateQuestionId { question: QuestionId },

    #[error("duplicate option id {option} in question {question}")]
    DuplicateOptionId {
        question: QuestionId,
        option: OptionId,
    },
}

//
// ─── DEFINITION ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    MultipleChoice,
}

/// One selectable answer within a question.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceOption {
    id: OptionId,
    text: String,
    image: Option<MediaUri>,
}

impl ChoiceOption {
    #[must_use]
    pub fn new(id: OptionId, text: impl Into<String>, image: Option<MediaUri>) -> Self {
        Self {
            id,
            text: text.into(),
            image,
        }
    }

    #[must_use]
    pub fn id(&self) -> &OptionId {
        &self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn image(&self) -> Option<&MediaUri> {
        self.image.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    id: QuestionId,
    text: String,
    kind: QuestionKind,
    image: Option<MediaUri>,
    options: Vec<ChoiceOption>,
    marks: f64,
    negative_marks: f64,
}

impl Question {
    /// Create a multiple-choice question.
    ///
    /// # Errors
    ///
    /// Returns `TestDefinitionError::TooFewOptions` with fewer than two
    /// options, `InvalidMarks` for negative mark values, and
    /// `DuplicateOptionId` for repeated option ids.
    pub fn multiple_choice(
        id: QuestionId,
        text: impl Into<String>,
        image: Option<MediaUri>,
        options: Vec<ChoiceOption>,
        marks: f64,
        negative_marks: f64,
    ) -> Result<Self, TestDefinitionError> {
        if options.len() < 2 {
            return Err(TestDefinitionError::TooFewOptions {
                question: id,
                len: options.len(),
            });
        }
        if marks < 0.0 || negative_marks < 0.0 || !marks.is_finite() || !negative_marks.is_finite()
        {
            return Err(TestDefinitionError::InvalidMarks { question: id });
        }
        let mut seen = HashSet::new();
        for option in &options {
            if !seen.insert(option.id().clone()) {
                return Err(TestDefinitionError::DuplicateOptionId {
                    question: id,
                    option: option.id().clone(),
                });
            }
        }

        Ok(Self {
            id,
            text: text.into(),
            kind: QuestionKind::MultipleChoice,
            image,
            options,
            marks,
            negative_marks,
        })
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    #[must_use]
    pub fn image(&self) -> Option<&MediaUri> {
        self.image.as_ref()
    }

    #[must_use]
    pub fn options(&self) -> &[ChoiceOption] {
        &self.options
    }

    #[must_use]
    pub fn marks(&self) -> f64 {
        self.marks
    }

    /// Marks deducted for a wrong answer, stored as a positive magnitude.
    #[must_use]
    pub fn negative_marks(&self) -> f64 {
        self.negative_marks
    }

    #[must_use]
    pub fn has_option(&self, option_id: &OptionId) -> bool {
        self.options.iter().any(|option| option.id() == option_id)
    }
}

/// Ordered group of questions. Order drives palette numbering and navigation.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    id: SectionId,
    name: String,
    questions: Vec<Question>,
}

impl Section {
    #[must_use]
    pub fn new(id: SectionId, name: impl Into<String>, questions: Vec<Question>) -> Self {
        Self {
            id,
            name: name.into(),
            questions,
        }
    }

    #[must_use]
    pub fn id(&self) -> &SectionId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }
}

/// A fetched test, immutable for the lifetime of an attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct TestDefinition {
    id: TestId,
    title: String,
    duration_minutes: u32,
    sections: Vec<Section>,
}

impl TestDefinition {
    /// Validate and assemble a definition.
    ///
    /// # Errors
    ///
    /// Returns `TestDefinitionError` when the title is empty, the duration is
    /// zero, any section is empty, or a question id repeats across sections.
    pub fn new(
        id: TestId,
        title: impl Into<String>,
        duration_minutes: u32,
        sections: Vec<Section>,
    ) -> Result<Self, TestDefinitionError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(TestDefinitionError::EmptyTitle);
        }
        if duration_minutes == 0 {
            return Err(TestDefinitionError::InvalidDuration);
        }
        if sections.is_empty() {
            return Err(TestDefinitionError::NoSections);
        }

        let mut seen = HashSet::new();
        for section in &sections {
            if section.questions().is_empty() {
                return Err(TestDefinitionError::EmptySection {
                    section: section.id().clone(),
                });
            }
            for question in section.questions() {
                if !seen.insert(question.id().clone()) {
                    return Err(TestDefinitionError::DuplicateQuestionId {
                        question: question.id().clone(),
                    });
                }
            }
        }

        Ok(Self {
            id,
            title,
            duration_minutes,
            sections,
        })
    }

    #[must_use]
    pub fn id(&self) -> &TestId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    #[must_use]
    pub fn section(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }

    /// Total questions across all sections.
    #[must_use]
    pub fn question_count(&self) -> usize {
        self.sections
            .iter()
            .map(|section| section.questions().len())
            .sum()
    }

    #[must_use]
    pub fn find_question(&self, question_id: &QuestionId) -> Option<(&Section, &Question)> {
        self.sections.iter().find_map(|section| {
            section
                .questions()
                .iter()
                .find(|question| question.id() == question_id)
                .map(|question| (section, question))
        })
    }

    #[must_use]
    pub fn contains_question(&self, question_id: &QuestionId) -> bool {
        self.find_question(question_id).is_some()
    }

    /// True when `option_id` is one of the answers offered by `question_id`.
    #[must_use]
    pub fn option_belongs(&self, question_id: &QuestionId, option_id: &OptionId) -> bool {
        self.find_question(question_id)
            .is_some_and(|(_, question)| question.has_option(option_id))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

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

    fn section(id: &str, questions: Vec<Question>) -> Section {
        Section::new(SectionId::new(id), format!("Section {id}"), questions)
    }

    #[test]
    fn builds_valid_definition() {
        let definition = TestDefinition::new(
            TestId::new("t-1"),
            "Algebra Basics",
            30,
            vec![section("s-1", vec![question("q-1"), question("q-2")])],
        )
        .unwrap();

        assert_eq!(definition.question_count(), 2);
        assert!(definition.contains_question(&QuestionId::new("q-2")));
        assert!(definition.option_belongs(&QuestionId::new("q-1"), &OptionId::new("q-1-a")));
        assert!(!definition.option_belongs(&QuestionId::new("q-1"), &OptionId::new("q-2-a")));
    }

    #[test]
    fn rejects_zero_duration() {
        let err = TestDefinition::new(
            TestId::new("t-1"),
            "Test",
            0,
            vec![section("s-1", vec![question("q-1")])],
        )
        .unwrap_err();
        assert_eq!(err, TestDefinitionError::InvalidDuration);
    }

    #[test]
    fn rejects_empty_sections() {
        let err = TestDefinition::new(TestId::new("t-1"), "Test", 30, Vec::new()).unwrap_err();
        assert_eq!(err, TestDefinitionError::NoSections);

        let err =
            TestDefinition::new(TestId::new("t-1"), "Test", 30, vec![section("s-1", vec![])])
                .unwrap_err();
        assert!(matches!(err, TestDefinitionError::EmptySection { .. }));
    }

    #[test]
    fn rejects_duplicate_question_ids_across_sections() {
        let err = TestDefinition::new(
            TestId::new("t-1"),
            "Test",
            30,
            vec![
                section("s-1", vec![question("q-1")]),
                section("s-2", vec![question("q-1")]),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, TestDefinitionError::DuplicateQuestionId { .. }));
    }

    #[test]
    fn question_requires_two_options() {
        let err = Question::multiple_choice(
            QuestionId::new("q-1"),
            "Q",
            None,
            vec![option("only")],
            4.0,
            0.0,
        )
        .unwrap_err();
        assert!(matches!(err, TestDefinitionError::TooFewOptions { len: 1, .. }));
    }

    #[test]
    fn question_rejects_negative_marks() {
        let err = Question::multiple_choice(
            QuestionId::new("q-1"),
            "Q",
            None,
            vec![option("a"), option("b")],
            -4.0,
            1.0,
        )
        .unwrap_err();
        assert!(matches!(err, TestDefinitionError::InvalidMarks { .. }));
    }

    #[test]
    fn question_rejects_duplicate_option_ids() {
        let err = Question::multiple_choice(
            QuestionId::new("q-1"),
            "Q",
            None,
            vec![option("a"), option("a")],
            4.0,
            1.0,
        )
        .unwrap_err();
        assert!(matches!(err, TestDefinitionError::DuplicateOptionId { .. }));
    }
}
