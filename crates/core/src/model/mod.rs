mod attempt;
mod curriculum;
mod ids;
mod media;
mod role;
mod test;

pub use ids::{
    ChapterId, OptionId, ParseIdError, QuestionId, SectionId, TenantId, TestId, TopicId,
};
pub use media::{MediaUri, MediaValidationError};

pub use attempt::{AnswerSheet, SubmissionPayload, SubmitReason};
pub use curriculum::{
    Chapter, ChapterDraft, CurriculumError, Topic, TopicDraft, ValidatedChapter, ValidatedTopic,
};
pub use role::{ParseRoleError, Role};
pub use test::{
    ChoiceOption, Question, QuestionKind, Section, TestDefinition, TestDefinitionError,
};
