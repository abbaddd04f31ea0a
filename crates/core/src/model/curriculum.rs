use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{ChapterId, TopicId};

const MAX_TITLE_LEN: usize = 120;
const MAX_DESCRIPTION_LEN: usize = 2_000;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CurriculumError {
    #[error("title cannot be empty")]
    EmptyTitle,

    #[error("title cannot exceed {MAX_TITLE_LEN} characters ({len})")]
    TitleTooLong { len: usize },

    #[error("description cannot exceed {MAX_DESCRIPTION_LEN} characters ({len})")]
    DescriptionTooLong { len: usize },
}

fn validate_title(raw: &str) -> Result<String, CurriculumError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(CurriculumError::EmptyTitle);
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(CurriculumError::TitleTooLong {
            len: title.chars().count(),
        });
    }
    Ok(title.to_string())
}

fn validate_description(raw: Option<&str>) -> Result<Option<String>, CurriculumError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(description) => {
            let len = description.chars().count();
            if len > MAX_DESCRIPTION_LEN {
                return Err(CurriculumError::DescriptionTooLong { len });
            }
            Ok(Some(description.to_string()))
        }
    }
}

//
// ─── DRAFTS ────────────────────────────────────────────────────────────────────
//

/// Unvalidated chapter input from a form; `validate` produces the fields a
/// create/update call may carry to the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChapterDraft {
    pub title: String,
    pub description: Option<String>,
    pub position: u32,
}

impl ChapterDraft {
    /// # Errors
    ///
    /// Returns `CurriculumError` for an empty or oversized title/description.
    pub fn validate(self) -> Result<ValidatedChapter, CurriculumError> {
        Ok(ValidatedChapter {
            title: validate_title(&self.title)?,
            description: validate_description(self.description.as_deref())?,
            position: self.position,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedChapter {
    pub title: String,
    pub description: Option<String>,
    pub position: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicDraft {
    pub title: String,
    pub position: u32,
}

impl TopicDraft {
    /// # Errors
    ///
    /// Returns `CurriculumError` for an empty or oversized title.
    pub fn validate(self) -> Result<ValidatedTopic, CurriculumError> {
        Ok(ValidatedTopic {
            title: validate_title(&self.title)?,
            position: self.position,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTopic {
    pub title: String,
    pub position: u32,
}

//
// ─── ROWS ──────────────────────────────────────────────────────────────────────
//

/// A curriculum chapter as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    id: ChapterId,
    title: String,
    description: Option<String>,
    position: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Chapter {
    /// Rehydrate a chapter row, re-validating its text fields.
    ///
    /// # Errors
    ///
    /// Returns `CurriculumError` when the stored fields fail validation.
    pub fn from_persisted(
        id: ChapterId,
        title: impl AsRef<str>,
        description: Option<&str>,
        position: u32,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, CurriculumError> {
        Ok(Self {
            id,
            title: validate_title(title.as_ref())?,
            description: validate_description(description)?,
            position,
            created_at,
            updated_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> ChapterId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn position(&self) -> u32 {
        self.position
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// A topic row within a chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    id: TopicId,
    chapter_id: ChapterId,
    title: String,
    position: u32,
}

impl Topic {
    /// # Errors
    ///
    /// Returns `CurriculumError` when the stored title fails validation.
    pub fn from_persisted(
        id: TopicId,
        chapter_id: ChapterId,
        title: impl AsRef<str>,
        position: u32,
    ) -> Result<Self, CurriculumError> {
        Ok(Self {
            id,
            chapter_id,
            title: validate_title(title.as_ref())?,
            position,
        })
    }

    #[must_use]
    pub fn id(&self) -> TopicId {
        self.id
    }

    #[must_use]
    pub fn chapter_id(&self) -> ChapterId {
        self.chapter_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn position(&self) -> u32 {
        self.position
    }
}
