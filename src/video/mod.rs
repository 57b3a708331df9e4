//! # Video I/O
//!
//! Frame sources and sinks for the encode and decode paths. Two backends are
//! available: the `cli` backend drives the `ffmpeg` / `ffprobe` executables and
//! needs nothing at build time; the `native` backend links libav in process and
//! is compiled with the `ffmpeg` cargo feature.

pub mod cli_backend;
pub mod memory;
pub mod traits;
pub mod types;

#[cfg(feature = "ffmpeg")]
pub mod native_backend;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

pub use cli_backend::{CliSink, CliSinkOpener, CliSource, CliTools};
pub use memory::{MemorySinkOpener, MemorySource, RecordedVideo};
pub use traits::{FrameSink, FrameSource, OutputFormat, SinkOpener};
pub use types::{is_supported_video, Frame, Resolution, SUPPORTED_VIDEO_EXTENSIONS};

/// Which codec backend opens sources and sinks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoBackend {
    Cli,
    Native,
}

impl Default for VideoBackend {
    fn default() -> Self {
        Self::Cli
    }
}

impl std::str::FromStr for VideoBackend {
    type Err = crate::error::OooError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "cli" => Ok(Self::Cli),
            "native" => Ok(Self::Native),
            other => Err(ConfigError::InvalidValue {
                key: "video.backend".to_string(),
                value: other.to_string(),
            }
            .into()),
        }
    }
}

#[cfg(not(feature = "ffmpeg"))]
fn native_unavailable() -> crate::error::OooError {
    ConfigError::InvalidValue {
        key: "video.backend".to_string(),
        value: "native (rebuild with --features ffmpeg)".to_string(),
    }
    .into()
}

/// Open a source video with the selected backend
pub fn open_source(
    path: &Path,
    backend: VideoBackend,
    tools: &CliTools,
) -> Result<Box<dyn FrameSource>> {
    match backend {
        VideoBackend::Cli => Ok(Box::new(CliSource::open(path, tools)?)),
        #[cfg(feature = "ffmpeg")]
        VideoBackend::Native => Ok(Box::new(native_backend::NativeSource::open(path)?)),
        #[cfg(not(feature = "ffmpeg"))]
        VideoBackend::Native => Err(native_unavailable()),
    }
}

/// Sink opener for the selected backend
pub fn sink_opener(backend: VideoBackend, tools: &CliTools) -> Result<Box<dyn SinkOpener>> {
    match backend {
        VideoBackend::Cli => Ok(Box::new(CliSinkOpener::new(tools.clone()))),
        #[cfg(feature = "ffmpeg")]
        VideoBackend::Native => Ok(Box::new(native_backend::NativeSinkOpener)),
        #[cfg(not(feature = "ffmpeg"))]
        VideoBackend::Native => Err(native_unavailable()),
    }
}

/// Parse an ffmpeg-style rate such as `30000/1001` or `25`
pub fn parse_frame_rate(rate: &str) -> Option<f64> {
    let value = match rate.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => rate.trim().parse().ok()?,
    };
    (value.is_finite() && value > 0.0).then_some(value)
}

/// Slowest frame rate a sink can be opened at
pub const MIN_FPS: f64 = 0.001;

/// Approximate a frame rate as `numerator / denominator`
///
/// Whole rates map to `n/1`, NTSC-style rates to `n/1001`, anything else to
/// millihertz. Non-positive or non-finite rates fall back to 30/1, and rates
/// below one millihertz are raised to 1/1000 so the numerator is never zero.
pub fn fps_to_rational(fps: f64) -> (i32, i32) {
    if !fps.is_finite() || fps <= 0.0 {
        return (30, 1);
    }
    if fps < MIN_FPS {
        return (1, 1000);
    }
    if (fps - fps.round()).abs() < 1e-6 {
        return (fps.round() as i32, 1);
    }
    let ntsc = fps * 1001.0;
    if (ntsc - ntsc.round()).abs() < 1e-3 {
        return (ntsc.round() as i32, 1001);
    }

    let num = (fps * 1000.0).round() as i32;
    let divisor = gcd(num, 1000);
    (num / divisor, 1000 / divisor)
}

fn gcd(mut a: i32, mut b: i32) -> i32 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a.abs().max(1)
}
