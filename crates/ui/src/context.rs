use std::sync::Arc;

use exam_core::model::Role;
use services::proctoring::{FullscreenSurface, MediaDevices};
use services::{AttemptLoopService, CurriculumService, TenantProfile, TestSource};

/// Composition-root seam: the binary implements this and the UI reads
/// everything it needs through [`AppContext`].
pub trait UiApp: Send + Sync {
    fn role(&self) -> Role;
    fn tenant(&self) -> Option<TenantProfile>;
    fn test_source(&self) -> TestSource;

    fn attempt_loop(&self) -> Arc<AttemptLoopService>;
    fn curriculum(&self) -> Arc<CurriculumService>;
    fn media_devices(&self) -> Arc<dyn MediaDevices>;
    fn fullscreen(&self) -> Arc<dyn FullscreenSurface>;
}

#[derive(Clone)]
pub struct AppContext {
    role: Role,
    tenant: Option<TenantProfile>,
    test_source: TestSource,

    attempt_loop: Arc<AttemptLoopService>,
    curriculum: Arc<CurriculumService>,
    media_devices: Arc<dyn MediaDevices>,
    fullscreen: Arc<dyn FullscreenSurface>,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        Self {
            role: app.role(),
            tenant: app.tenant(),
            test_source: app.test_source(),
            attempt_loop: app.attempt_loop(),
            curriculum: app.curriculum(),
            media_devices: app.media_devices(),
            fullscreen: app.fullscreen(),
        }
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn tenant(&self) -> Option<&TenantProfile> {
        self.tenant.as_ref()
    }

    /// Display name for the shell header: tenant name or the platform name.
    #[must_use]
    pub fn shell_title(&self) -> String {
        self.tenant
            .as_ref()
            .map_or_else(|| "Examhall".to_string(), |tenant| tenant.name.clone())
    }

    #[must_use]
    pub fn test_source(&self) -> TestSource {
        self.test_source
    }

    #[must_use]
    pub fn attempt_loop(&self) -> Arc<AttemptLoopService> {
        Arc::clone(&self.attempt_loop)
    }

    #[must_use]
    pub fn curriculum(&self) -> Arc<CurriculumService> {
        Arc::clone(&self.curriculum)
    }

    #[must_use]
    pub fn media_devices(&self) -> Arc<dyn MediaDevices> {
        Arc::clone(&self.media_devices)
    }

    #[must_use]
    pub fn fullscreen(&self) -> Arc<dyn FullscreenSurface> {
        Arc::clone(&self.fullscreen)
    }
}

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: &Arc<dyn UiApp>) -> AppContext {
    AppContext::new(app)
}
