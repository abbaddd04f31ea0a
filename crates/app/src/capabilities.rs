use async_trait::async_trait;
use tracing::info;

use services::{FullscreenSurface, MediaDevices, MediaStream, ProctorError};

/// Desktop stand-in for browser media capture: grants a no-op stream so the
/// proctoring panel can be exercised without real camera plumbing.
pub struct SimulatedMediaDevices {
    deny: bool,
}

impl SimulatedMediaDevices {
    #[must_use]
    pub fn new(deny: bool) -> Self {
        Self { deny }
    }
}

struct SimulatedStream;

impl MediaStream for SimulatedStream {
    fn stop(&self) {
        info!("simulated media stream released");
    }
}

#[async_trait]
impl MediaDevices for SimulatedMediaDevices {
    async fn acquire(&self) -> Result<Box<dyn MediaStream>, ProctorError> {
        if self.deny {
            return Err(ProctorError::PermissionDenied(
                "camera access denied (simulated)".to_string(),
            ));
        }
        info!("simulated media stream acquired");
        Ok(Box::new(SimulatedStream))
    }
}

/// Desktop stand-in for the fullscreen capability. The webview window is
/// managed by the OS here, so enter/exit only log.
pub struct SimulatedFullscreen;

#[async_trait]
impl FullscreenSurface for SimulatedFullscreen {
    async fn enter(&self) -> Result<(), ProctorError> {
        info!("simulated fullscreen entered");
        Ok(())
    }

    async fn exit(&self) -> Result<(), ProctorError> {
        info!("simulated fullscreen exited");
        Ok(())
    }
}
