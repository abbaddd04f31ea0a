use std::sync::Arc;

use async_trait::async_trait;
use exam_core::model::{OptionId, QuestionId, TestId};
use exam_core::time::{fixed_clock, fixed_now_ms};
use services::{
    AttemptLoopService, AttemptPhase, FullscreenSurface, LocalAttemptApi, MediaDevices,
    MediaStream, MockTestCatalog, ProctorController, ProctorError, TestSource, ViewportEvent,
};

struct DenyingDevices;

#[async_trait]
impl MediaDevices for DenyingDevices {
    async fn acquire(&self) -> Result<Box<dyn MediaStream>, ProctorError> {
        Err(ProctorError::PermissionDenied(
            "permission dialog dismissed".to_string(),
        ))
    }
}

struct NoopFullscreen;

#[async_trait]
impl FullscreenSurface for NoopFullscreen {
    async fn enter(&self) -> Result<(), ProctorError> {
        Ok(())
    }

    async fn exit(&self) -> Result<(), ProctorError> {
        Ok(())
    }
}

#[tokio::test]
async fn media_denial_never_blocks_the_attempt() {
    let loop_svc = AttemptLoopService::new(
        fixed_clock(),
        Arc::new(MockTestCatalog::new()),
        Arc::new(LocalAttemptApi::new(fixed_clock())),
    );
    let mut session = loop_svc
        .start_attempt(&TestId::new("demo"), TestSource::Mock)
        .await
        .unwrap();

    let mut proctor = ProctorController::new(Arc::new(DenyingDevices), Arc::new(NoopFullscreen));
    let err = proctor.start_media().await.unwrap_err();
    assert!(matches!(err, ProctorError::PermissionDenied(_)));
    assert!(proctor.media_error().is_some());

    // Proctoring is inactive; answering and navigation keep working.
    session.select_answer(&QuestionId::new("q-1-1"), &OptionId::new("opt-1-1-1"));
    session.next();
    assert_eq!(session.phase(), AttemptPhase::InProgress);
    assert!(session.sheet().is_answered(&QuestionId::new("q-1-1")));
}

#[tokio::test]
async fn viewport_events_drive_forced_submission() {
    let loop_svc = AttemptLoopService::new(
        fixed_clock(),
        Arc::new(MockTestCatalog::new()),
        Arc::new(LocalAttemptApi::new(fixed_clock())),
    );
    let mut session = loop_svc
        .start_attempt(&TestId::new("demo"), TestSource::Mock)
        .await
        .unwrap();
    let mut proctor = ProctorController::new(Arc::new(DenyingDevices), Arc::new(NoopFullscreen));

    let start = fixed_now_ms();
    let events = [
        // One fullscreen exit firing twice in quick succession: one count.
        (ViewportEvent::FullscreenExited, start + 1_000),
        (ViewportEvent::FullscreenExited, start + 1_200),
        (ViewportEvent::VisibilityHidden, start + 30_000),
        (ViewportEvent::VisibilityRestored, start + 31_000),
        (ViewportEvent::FullscreenExited, start + 60_000),
    ];

    for (event, at) in events {
        if proctor.observe(event, at).is_some() {
            session.record_violation(at);
        }
    }

    assert_eq!(session.violations(), 3);
    assert_eq!(session.phase(), AttemptPhase::Submitting);
}
