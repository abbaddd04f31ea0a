#![forbid(unsafe_code)]

pub mod attempts;
pub mod catalog;
pub mod curriculum;
pub mod error;
pub mod proctoring;
pub mod tenancy;

pub use exam_core::Clock;

pub use error::{
    AttemptApiError, AttemptError, CatalogError, CurriculumApiError, ProctorError, TenantError,
};

pub use attempts::{
    AttemptApi, AttemptConfig, AttemptLoopService, AttemptPhase, AttemptProgress, AttemptSession,
    HttpAttemptApi, LocalAttemptApi, PaletteEntry, QuestionStatus, StartedAttempt,
    SubmissionReceipt,
};
pub use catalog::{HttpTestCatalog, MockTestCatalog, TestCatalog, TestSource, mock_definition};
pub use curriculum::{
    CurriculumApi, CurriculumService, HttpCurriculumApi, InMemoryCurriculumApi,
};
pub use proctoring::{
    FullscreenSurface, MediaDevices, MediaState, MediaStream, ProctorController, ViewportEvent,
    ViolationKind,
};
pub use tenancy::{
    HttpTenantDirectory, StaticTenantDirectory, TenantDirectory, TenantKey, TenantProfile,
    TenantResolver, tenant_key_for_host,
};
