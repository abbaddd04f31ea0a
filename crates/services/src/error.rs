//! Shared error types for the services crate.

use thiserror::Error;

use exam_core::model::{CurriculumError, TestDefinitionError};

/// Errors emitted by test catalog implementations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("test not found")]
    NotFound,
    #[error("catalog request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Definition(#[from] TestDefinitionError),
}

/// Errors emitted by the attempt lifecycle API client.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AttemptApiError {
    #[error("attempt request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by the attempt workflow.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AttemptError {
    #[error("attempt has no pending submission to deliver")]
    NothingToDeliver,
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Api(#[from] AttemptApiError),
}

/// Errors emitted by proctoring capability boundaries.
///
/// Every variant is non-fatal for test-taking: proctoring failures mark the
/// controller inactive and are surfaced inline with a retry affordance.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProctorError {
    #[error("camera/microphone permission denied: {0}")]
    PermissionDenied(String),
    #[error("media devices are unavailable on this platform")]
    MediaUnavailable,
    #[error("fullscreen request rejected: {0}")]
    FullscreenRejected(String),
}

/// Errors emitted by tenant resolution.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TenantError {
    #[error("tenant directory request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by the curriculum service.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CurriculumApiError {
    #[error("chapter not found")]
    ChapterNotFound,
    #[error("topic not found")]
    TopicNotFound,
    #[error(transparent)]
    Validation(#[from] CurriculumError),
    #[error("curriculum request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}
