pub mod camera;
pub mod diagnostics;
pub mod display;
pub mod sampler;
pub mod session;
pub mod settings;
pub mod transport;

use std::future::Future;

use async_trait::async_trait;
use tokio::sync::mpsc;

use camera::backend::{CaptureHandle, CaptureSource};
use camera::dummy::DummyCamera;
use camera::error::CameraError;
use camera::still::StillImageCamera;
use camera::types::CaptureRequest;
use diagnostics::stats::StatsSnapshot;
use display::TerminalSurface;
use session::{commands, event_loop, SessionController, UiCommand};
use settings::types::CaptureSourceSettings;
use settings::ClientConfig;
use transport::endpoint::endpoint_from_origin;
use transport::error::TransportError;
use transport::SessionTransport;

/// How a client run begins and ends.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Start a session as soon as the loop is running.
    pub autostart: bool,
    /// Read commands from stdin.
    pub interactive: bool,
}

/// Create the capture source described by the configuration.
pub fn create_capture_source(settings: &CaptureSourceSettings) -> Box<dyn CaptureSource> {
    match settings {
        CaptureSourceSettings::Dummy {
            native_resolution,
            fps,
        } => {
            let camera = DummyCamera::new().with_fps(*fps);
            match native_resolution {
                Some(resolution) => Box::new(camera.with_native_resolution(*resolution)),
                None => Box::new(camera),
            }
        }
        CaptureSourceSettings::Still { path } => Box::new(StillImageCamera::new(path.clone())),
        CaptureSourceSettings::None => Box::new(NullCamera),
    }
}

/// Capture source for machines without a usable device.
struct NullCamera;

#[async_trait]
impl CaptureSource for NullCamera {
    fn name(&self) -> &str {
        "no camera"
    }

    async fn acquire(
        &self,
        _request: &CaptureRequest,
    ) -> camera::error::Result<Box<dyn CaptureHandle>> {
        Err(CameraError::DeviceUnavailable(
            "no capture device is configured".to_string(),
        ))
    }
}

/// Connect to the configured origin and run the session loop until
/// `shutdown` resolves or the user quits.
pub async fn run(
    config: &ClientConfig,
    options: RunOptions,
    shutdown: impl Future<Output = ()>,
) -> Result<StatsSnapshot, TransportError> {
    let endpoint = endpoint_from_origin(&config.origin)?;
    let transport = SessionTransport::connect(endpoint);
    let camera = create_capture_source(&config.capture.source);
    let surface = TerminalSurface::new(config.output_dir.clone());
    let controller = SessionController::new(config, camera, transport, Box::new(surface));

    let (tx, rx) = mpsc::unbounded_channel();
    if options.autostart {
        let _ = tx.send(UiCommand::Start);
    }
    if options.interactive {
        if let Err(e) = commands::spawn_stdin_reader(tx) {
            tracing::warn!("stdin commands unavailable: {e}");
        }
    } else {
        drop(tx);
    }

    Ok(event_loop::run(controller, rx, shutdown).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use camera::types::Resolution;

    #[tokio::test]
    async fn null_camera_is_unavailable() {
        let camera = create_capture_source(&CaptureSourceSettings::None);
        let err = camera.acquire(&CaptureRequest::default()).await.err();
        assert!(matches!(err, Some(CameraError::DeviceUnavailable(_))));
    }

    #[tokio::test]
    async fn dummy_source_honours_native_resolution() {
        let camera = create_capture_source(&CaptureSourceSettings::Dummy {
            native_resolution: Some(Resolution::new(1280, 720)),
            fps: 15.0,
        });
        let mut stream = camera.acquire(&CaptureRequest::default()).await.unwrap();
        assert_eq!(stream.resolution(), Resolution::new(1280, 720));
        stream.stop();
    }

    #[tokio::test]
    async fn run_rejects_an_unusable_origin() {
        let config = ClientConfig {
            origin: "ftp://example.com".to_string(),
            ..ClientConfig::default()
        };
        let result = run(&config, RunOptions::default(), std::future::ready(())).await;
        assert!(matches!(result, Err(TransportError::UnsupportedScheme(_))));
    }

    #[tokio::test]
    async fn run_against_an_unreachable_server_ends_cleanly() {
        let config = ClientConfig {
            origin: "http://127.0.0.1:9".to_string(),
            ..ClientConfig::default()
        };
        let options = RunOptions {
            autostart: true,
            interactive: false,
        };
        let stats = run(
            &config,
            options,
            tokio::time::sleep(std::time::Duration::from_millis(300)),
        )
        .await
        .unwrap();
        assert_eq!(stats.frames_sent, 0);
    }
}
