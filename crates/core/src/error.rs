use thiserror::Error;

use crate::model::{CurriculumError, MediaValidationError, TestDefinitionError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    TestDefinition(#[from] TestDefinitionError),
    #[error(transparent)]
    Curriculum(#[from] CurriculumError),
    #[error(transparent)]
    MediaValidation(#[from] MediaValidationError),
}
