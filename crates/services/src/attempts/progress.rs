use exam_core::model::QuestionId;

/// Aggregate answer counts for the header bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptProgress {
    pub total: usize,
    pub answered: usize,
    pub marked: usize,
    pub unanswered: usize,
}

/// Palette cell state for one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionStatus {
    Answered,
    AnsweredAndMarked,
    Marked,
    Unanswered,
}

/// One palette cell; `number` is the 1-based position across all sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteEntry {
    pub number: usize,
    pub section: usize,
    pub question: usize,
    pub question_id: QuestionId,
    pub status: QuestionStatus,
    pub is_current: bool,
}
