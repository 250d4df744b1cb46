use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::camera::dummy::{MAX_FPS, MIN_FPS};
use crate::camera::types::{CaptureRequest, Resolution};
use crate::sampler::compress::{FrameEncoding, DEFAULT_JPEG_QUALITY};
use crate::settings::error::SettingsError;

pub const DEFAULT_ORIGIN: &str = "http://127.0.0.1:8000";
pub const DEFAULT_SAMPLING_INTERVAL_MS: u64 = 100;

fn default_fps() -> f32 {
    30.0
}

/// Which local device backs the capture source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CaptureSourceSettings {
    /// Synthetic test pattern. `native_resolution` makes the device ignore
    /// the requested size.
    Dummy {
        #[serde(default)]
        native_resolution: Option<Resolution>,
        #[serde(default = "default_fps")]
        fps: f32,
    },
    /// A still image file served as the live frame.
    Still { path: PathBuf },
    /// No device at all; every start attempt fails.
    None,
}

impl Default for CaptureSourceSettings {
    fn default() -> Self {
        Self::Dummy {
            native_resolution: None,
            fps: default_fps(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Resolution requested from the device.
    pub resolution: Resolution,
    pub source: CaptureSourceSettings,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            resolution: Resolution::new(640, 480),
            source: CaptureSourceSettings::default(),
        }
    }
}

impl CaptureSettings {
    pub fn request(&self) -> CaptureRequest {
        CaptureRequest {
            resolution: self.resolution,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingSettings {
    pub interval_ms: u64,
    pub encoding: FrameEncoding,
    pub jpeg_quality: u8,
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_SAMPLING_INTERVAL_MS,
            encoding: FrameEncoding::Jpeg,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl SamplingSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Top-level client configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Origin of the processing server; the WebSocket endpoint is derived
    /// from it.
    pub origin: String,
    pub sampling: SamplingSettings,
    pub capture: CaptureSettings,
    /// Exercise kinds offered by the selector. Opaque to the client.
    pub exercises: Vec<String>,
    pub default_exercise: String,
    /// Where the terminal display writes the latest rendered frame.
    pub output_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            sampling: SamplingSettings::default(),
            capture: CaptureSettings::default(),
            exercises: vec![
                "bicep_curl".to_string(),
                "squat".to_string(),
                "push_up".to_string(),
            ],
            default_exercise: "bicep_curl".to_string(),
            output_dir: None,
        }
    }
}

impl ClientConfig {
    /// Reject values the session cannot run with.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.sampling.interval_ms == 0 {
            return Err(SettingsError::Invalid(
                "sampling.interval_ms must be greater than zero".to_string(),
            ));
        }
        if !(1..=100).contains(&self.sampling.jpeg_quality) {
            return Err(SettingsError::Invalid(format!(
                "sampling.jpeg_quality must be 1-100, got {}",
                self.sampling.jpeg_quality
            )));
        }
        if let CaptureSourceSettings::Dummy { fps, .. } = self.capture.source {
            if !(MIN_FPS..=MAX_FPS).contains(&fps) {
                return Err(SettingsError::Invalid(format!(
                    "capture.source.fps must be {MIN_FPS}-{MAX_FPS}, got {fps}"
                )));
            }
        }
        if self.exercises.is_empty() {
            return Err(SettingsError::Invalid(
                "at least one exercise must be configured".to_string(),
            ));
        }
        if !self.exercises.contains(&self.default_exercise) {
            return Err(SettingsError::Invalid(format!(
                "default_exercise {:?} is not in the exercise list",
                self.default_exercise
            )));
        }
        Ok(())
    }

    /// Apply `REP_COACH_ORIGIN` and `DUMMY_CAMERA` from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(origin) = lookup("REP_COACH_ORIGIN").filter(|v| !v.is_empty()) {
            self.origin = origin;
        }
        let dummy = lookup("DUMMY_CAMERA").is_some_and(|v| v == "1" || v == "true");
        if dummy && !matches!(self.capture.source, CaptureSourceSettings::Dummy { .. }) {
            self.capture.source = CaptureSourceSettings::default();
        }
    }
}
