use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::error::ProctorError;

/// How long after a counted violation the same kind of event is ignored, so
/// one user action (a single fullscreen exit firing several browser events)
/// cannot be double-counted.
pub const VIOLATION_DEBOUNCE_MS: i64 = 1_000;

/// An acquired camera+microphone stream. Dropping does not release it;
/// `stop` must be called, which the controller guarantees on teardown.
pub trait MediaStream: Send + Sync {
    fn stop(&self);
}

/// Capability boundary over the platform's media devices.
#[async_trait]
pub trait MediaDevices: Send + Sync {
    /// Request camera+microphone access. May suspend on a permission dialog.
    ///
    /// # Errors
    ///
    /// Returns `ProctorError::PermissionDenied` when the user declines.
    async fn acquire(&self) -> Result<Box<dyn MediaStream>, ProctorError>;
}

/// Capability boundary over the viewport's fullscreen mode.
#[async_trait]
pub trait FullscreenSurface: Send + Sync {
    async fn enter(&self) -> Result<(), ProctorError>;
    async fn exit(&self) -> Result<(), ProctorError>;
}

/// Global viewport events the controller observes for violation detection.
///
/// Injected rather than read from a real viewport so the detection logic is
/// testable without one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportEvent {
    FullscreenEntered,
    FullscreenExited,
    VisibilityHidden,
    VisibilityRestored,
}

/// A counted proctoring rule breach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    FullscreenExit,
    TabHidden,
}

impl ViolationKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ViolationKind::FullscreenExit => "fullscreen exited",
            ViolationKind::TabHidden => "tab lost focus",
        }
    }
}

/// Media acquisition state exposed to the proctoring panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaState {
    Inactive,
    Requesting,
    Active,
    Denied,
}

/// Manages camera/microphone and fullscreen for a proctored attempt and
/// turns viewport events into violations.
///
/// The controller is a pure event source for the session machine: `observe`
/// reports whether an event counts, and the caller feeds the result into
/// `AttemptSession::record_violation`. Every failure here is non-fatal —
/// proctoring going inactive never blocks test-taking.
pub struct ProctorController {
    devices: Arc<dyn MediaDevices>,
    fullscreen: Arc<dyn FullscreenSurface>,
    stream: Option<Box<dyn MediaStream>>,
    requesting: bool,
    media_error: Option<String>,
    is_fullscreen: bool,
    last_fullscreen_exit_ms: Option<i64>,
    last_tab_hidden_ms: Option<i64>,
}

impl ProctorController {
    #[must_use]
    pub fn new(devices: Arc<dyn MediaDevices>, fullscreen: Arc<dyn FullscreenSurface>) -> Self {
        Self {
            devices,
            fullscreen,
            stream: None,
            requesting: false,
            media_error: None,
            is_fullscreen: false,
            last_fullscreen_exit_ms: None,
            last_tab_hidden_ms: None,
        }
    }

    //
    // ─── MEDIA ─────────────────────────────────────────────────────────────────
    //

    /// Request camera+microphone access.
    ///
    /// Duplicate requests coalesce: while one acquisition is in flight, or
    /// once a stream is active, further calls return without touching the
    /// devices. Callers that hold the controller behind a signal should
    /// re-check the session phase after this resolves and release
    /// immediately if the attempt already ended.
    ///
    /// # Errors
    ///
    /// Returns the acquisition error after recording it for inline display;
    /// the stream stays absent and test-taking continues.
    pub async fn start_media(&mut self) -> Result<(), ProctorError> {
        if self.requesting || self.stream.is_some() {
            return Ok(());
        }
        self.requesting = true;
        let result = self.devices.acquire().await;
        self.requesting = false;

        match result {
            Ok(stream) => {
                self.stream = Some(stream);
                self.media_error = None;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "proctoring media acquisition failed");
                self.media_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Release all acquired media tracks. Safe to call when nothing is
    /// active.
    pub fn stop_media(&mut self) {
        if let Some(stream) = self.stream.take() {
            stream.stop();
        }
    }

    #[must_use]
    pub fn media_state(&self) -> MediaState {
        if self.requesting {
            MediaState::Requesting
        } else if self.stream.is_some() {
            MediaState::Active
        } else if self.media_error.is_some() {
            MediaState::Denied
        } else {
            MediaState::Inactive
        }
    }

    #[must_use]
    pub fn is_requesting_media(&self) -> bool {
        self.requesting
    }

    #[must_use]
    pub fn media_active(&self) -> bool {
        self.stream.is_some()
    }

    #[must_use]
    pub fn media_error(&self) -> Option<&str> {
        self.media_error.as_deref()
    }

    //
    // ─── FULLSCREEN ────────────────────────────────────────────────────────────
    //

    /// Request fullscreen. Failures are logged and reported as `false`,
    /// never raised: platform restrictions routinely reject the request.
    pub async fn enter_fullscreen(&mut self) -> bool {
        match self.fullscreen.enter().await {
            Ok(()) => {
                self.is_fullscreen = true;
                true
            }
            Err(err) => {
                warn!(error = %err, "fullscreen request rejected");
                false
            }
        }
    }

    pub async fn exit_fullscreen(&mut self) -> bool {
        match self.fullscreen.exit().await {
            Ok(()) => {
                self.is_fullscreen = false;
                true
            }
            Err(err) => {
                warn!(error = %err, "fullscreen exit rejected");
                false
            }
        }
    }

    #[must_use]
    pub fn is_fullscreen(&self) -> bool {
        self.is_fullscreen
    }

    //
    // ─── VIOLATIONS ────────────────────────────────────────────────────────────
    //

    /// Classify a viewport event; `Some` means one violation should be
    /// recorded against the session. Qualifying events are debounced per
    /// kind within [`VIOLATION_DEBOUNCE_MS`].
    pub fn observe(&mut self, event: ViewportEvent, now_ms: i64) -> Option<ViolationKind> {
        match event {
            ViewportEvent::FullscreenEntered => {
                self.is_fullscreen = true;
                None
            }
            ViewportEvent::VisibilityRestored => None,
            ViewportEvent::FullscreenExited => {
                self.is_fullscreen = false;
                Self::debounced(&mut self.last_fullscreen_exit_ms, now_ms)
                    .then_some(ViolationKind::FullscreenExit)
            }
            ViewportEvent::VisibilityHidden => Self::debounced(&mut self.last_tab_hidden_ms, now_ms)
                .then_some(ViolationKind::TabHidden),
        }
    }

    fn debounced(last_ms: &mut Option<i64>, now_ms: i64) -> bool {
        if last_ms.is_some_and(|last| now_ms - last < VIOLATION_DEBOUNCE_MS) {
            return false;
        }
        *last_ms = Some(now_ms);
        true
    }

    //
    // ─── TEARDOWN ──────────────────────────────────────────────────────────────
    //

    /// Unconditional cleanup: release media and leave fullscreen. Runs the
    /// same regardless of session state, so navigation away from the attempt
    /// view can never leak camera access.
    pub async fn teardown(&mut self) {
        self.stop_media();
        if self.is_fullscreen {
            let _ = self.exit_fullscreen().await;
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FakeStream {
        stops: Arc<AtomicU32>,
    }

    impl MediaStream for FakeStream {
        fn stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct FakeDevices {
        deny: bool,
        acquisitions: AtomicU32,
        stops: Arc<AtomicU32>,
    }

    impl FakeDevices {
        fn granting(stops: Arc<AtomicU32>) -> Self {
            Self {
                deny: false,
                acquisitions: AtomicU32::new(0),
                stops,
            }
        }

        fn denying() -> Self {
            Self {
                deny: true,
                acquisitions: AtomicU32::new(0),
                stops: Arc::new(AtomicU32::new(0)),
            }
        }
    }

    #[async_trait]
    impl MediaDevices for FakeDevices {
        async fn acquire(&self) -> Result<Box<dyn MediaStream>, ProctorError> {
            self.acquisitions.fetch_add(1, Ordering::SeqCst);
            if self.deny {
                Err(ProctorError::PermissionDenied(
                    "camera blocked by user".to_string(),
                ))
            } else {
                Ok(Box::new(FakeStream {
                    stops: Arc::clone(&self.stops),
                }))
            }
        }
    }

    struct FakeFullscreen {
        reject: bool,
    }

    #[async_trait]
    impl FullscreenSurface for FakeFullscreen {
        async fn enter(&self) -> Result<(), ProctorError> {
            if self.reject {
                Err(ProctorError::FullscreenRejected("not allowed".to_string()))
            } else {
                Ok(())
            }
        }

        async fn exit(&self) -> Result<(), ProctorError> {
            Ok(())
        }
    }

    fn controller(devices: Arc<FakeDevices>, reject_fullscreen: bool) -> ProctorController {
        ProctorController::new(devices, Arc::new(FakeFullscreen { reject: reject_fullscreen }))
    }

    #[tokio::test]
    async fn media_acquisition_and_idempotent_release() {
        let stops = Arc::new(AtomicU32::new(0));
        let devices = Arc::new(FakeDevices::granting(Arc::clone(&stops)));
        let mut proctor = controller(Arc::clone(&devices), false);

        proctor.start_media().await.unwrap();
        assert_eq!(proctor.media_state(), MediaState::Active);

        // An active stream coalesces further requests.
        proctor.start_media().await.unwrap();
        assert_eq!(devices.acquisitions.load(Ordering::SeqCst), 1);

        proctor.stop_media();
        proctor.stop_media();
        assert_eq!(stops.load(Ordering::SeqCst), 1);
        assert_eq!(proctor.media_state(), MediaState::Inactive);
    }

    #[tokio::test]
    async fn denial_sets_error_and_leaves_stream_absent() {
        let devices = Arc::new(FakeDevices::denying());
        let mut proctor = controller(devices, false);

        let err = proctor.start_media().await.unwrap_err();
        assert!(matches!(err, ProctorError::PermissionDenied(_)));
        assert!(!proctor.media_active());
        assert_eq!(proctor.media_state(), MediaState::Denied);
        assert!(proctor.media_error().unwrap().contains("camera blocked"));

        // Retry after denial goes back to the devices.
        let _ = proctor.start_media().await;
        assert_eq!(proctor.media_state(), MediaState::Denied);
    }

    #[tokio::test]
    async fn fullscreen_failure_is_non_fatal() {
        let devices = Arc::new(FakeDevices::denying());
        let mut proctor = controller(devices, true);

        assert!(!proctor.enter_fullscreen().await);
        assert!(!proctor.is_fullscreen());
    }

    #[test]
    fn observe_debounces_per_kind() {
        let devices = Arc::new(FakeDevices::denying());
        let mut proctor = controller(devices, false);

        assert_eq!(
            proctor.observe(ViewportEvent::FullscreenExited, 10_000),
            Some(ViolationKind::FullscreenExit)
        );
        // Same action re-reported inside the window: not counted again.
        assert_eq!(proctor.observe(ViewportEvent::FullscreenExited, 10_400), None);

        // A different kind has its own window.
        assert_eq!(
            proctor.observe(ViewportEvent::VisibilityHidden, 10_500),
            Some(ViolationKind::TabHidden)
        );

        // Past the window the next exit counts.
        assert_eq!(
            proctor.observe(ViewportEvent::FullscreenExited, 11_200),
            Some(ViolationKind::FullscreenExit)
        );
    }

    #[test]
    fn observe_tracks_fullscreen_state_without_counting_entries() {
        let devices = Arc::new(FakeDevices::denying());
        let mut proctor = controller(devices, false);

        assert_eq!(proctor.observe(ViewportEvent::FullscreenEntered, 1_000), None);
        assert!(proctor.is_fullscreen());
        assert_eq!(proctor.observe(ViewportEvent::VisibilityRestored, 1_100), None);
    }

    #[tokio::test]
    async fn teardown_releases_everything() {
        let stops = Arc::new(AtomicU32::new(0));
        let devices = Arc::new(FakeDevices::granting(Arc::clone(&stops)));
        let mut proctor = controller(devices, false);

        proctor.start_media().await.unwrap();
        let _ = proctor.enter_fullscreen().await;

        proctor.teardown().await;
        assert!(!proctor.media_active());
        assert!(!proctor.is_fullscreen());
        assert_eq!(stops.load(Ordering::SeqCst), 1);

        // Teardown with nothing active is safe.
        proctor.teardown().await;
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }
}
