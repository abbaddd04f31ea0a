use services::ViewportEvent;

/// Listener script for the proctoring event channel.
///
/// Runs inside the webview and forwards visibility/fullscreen changes over
/// the eval channel as short tag strings; the Rust side owns all counting
/// and debouncing, the script only reports.
pub(super) fn proctor_watch_script() -> &'static str {
    r#"(function() {
        document.addEventListener("visibilitychange", () => {
            dioxus.send(document.hidden ? "visibility-hidden" : "visibility-restored");
        });
        document.addEventListener("fullscreenchange", () => {
            dioxus.send(document.fullscreenElement ? "fullscreen-entered" : "fullscreen-exited");
        });
    })();"#
}

pub(super) fn parse_viewport_event(tag: &str) -> Option<ViewportEvent> {
    match tag {
        "visibility-hidden" => Some(ViewportEvent::VisibilityHidden),
        "visibility-restored" => Some(ViewportEvent::VisibilityRestored),
        "fullscreen-entered" => Some(ViewportEvent::FullscreenEntered),
        "fullscreen-exited" => Some(ViewportEvent::FullscreenExited),
        _ => None,
    }
}
