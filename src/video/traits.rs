use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{OutputError, Result};
use crate::video::types::{Frame, Resolution};

/// A decoded video stream read strictly front to back
///
/// Implementations own whatever decoder state they need; the only cursor is
/// the implicit "next frame" position, there is no seeking.
pub trait FrameSource {
    /// Declared frame rate of the stream
    fn frame_rate(&self) -> f64;

    /// Frame count reported by the container, 0 when unknown
    fn frame_count_hint(&self) -> u64;

    /// Decode the next frame, `None` at end of stream
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

/// An open output video stream
pub trait FrameSink {
    /// Append one frame. Its geometry must match the geometry the sink was opened with.
    fn write_frame(&mut self, frame: &Frame) -> Result<()>;

    /// Flush and close the stream. The output is only complete after this returns `Ok`.
    fn finish(self: Box<Self>) -> Result<()>;
}

/// Opens output streams once the geometry of the first frame is known
pub trait SinkOpener {
    fn open(
        &self,
        path: &Path,
        resolution: Resolution,
        fps: f64,
        format: OutputFormat,
    ) -> Result<Box<dyn FrameSink>>;
}

/// Output video container, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Mp4,
    Avi,
    Mov,
    Mkv,
    Webm,
}

impl OutputFormat {
    pub fn from_extension(extension: &str) -> Result<Self> {
        extension.parse()
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Avi => "avi",
            Self::Mov => "mov",
            Self::Mkv => "mkv",
            Self::Webm => "webm",
        }
    }

    /// Encoder name understood by the ffmpeg executable
    pub fn ffmpeg_codec(&self) -> &'static str {
        match self {
            Self::Webm => "libvpx-vp9",
            _ => "mpeg4",
        }
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Mp4
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = crate::error::OooError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim_start_matches('.').to_lowercase().as_str() {
            "mp4" => Ok(Self::Mp4),
            "avi" => Ok(Self::Avi),
            "mov" => Ok(Self::Mov),
            "mkv" => Ok(Self::Mkv),
            "webm" => Ok(Self::Webm),
            other => Err(OutputError::UnsupportedFormat { format: other.to_string() }.into()),
        }
    }
}
