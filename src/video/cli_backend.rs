//! Frame I/O through the `ffmpeg` / `ffprobe` executables.
//!
//! Frames cross the process boundary as raw `rgb24`, one `width * height * 3`
//! chunk per frame, so no libav linking is needed at build time.

use std::io::{self, BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{OutputError, Result, SourceError};
use crate::video::traits::{FrameSink, FrameSource, OutputFormat, SinkOpener};
use crate::video::types::{Frame, Resolution};
use crate::video::parse_frame_rate;

/// Locations of the ffmpeg executables
#[derive(Debug, Clone)]
pub struct CliTools {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Default for CliTools {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

impl CliTools {
    pub fn new<P: Into<PathBuf>>(ffmpeg: P, ffprobe: P) -> Self {
        Self { ffmpeg: ffmpeg.into(), ffprobe: ffprobe.into() }
    }

    /// Check that both executables can be spawned
    pub fn is_available(&self) -> bool {
        [&self.ffmpeg, &self.ffprobe].iter().all(|tool| {
            Command::new(tool)
                .arg("-version")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .map(|status| status.success())
                .unwrap_or(false)
        })
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    nb_frames: Option<String>,
}

/// Video stream decoded by a child `ffmpeg` process
pub struct CliSource {
    child: Child,
    stdout: BufReader<ChildStdout>,
    path: String,
    resolution: Resolution,
    fps: f64,
    frame_count_hint: u64,
    frames_read: u64,
    exhausted: bool,
}

impl CliSource {
    pub fn open<P: AsRef<Path>>(path: P, tools: &CliTools) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();
        let open_failed = |reason: String| SourceError::OpenFailed {
            path: path_str.clone(),
            reason,
        };

        if !path.is_file() {
            return Err(open_failed("file does not exist".to_string()).into());
        }

        let output = Command::new(&tools.ffprobe)
            .args(["-v", "error", "-print_format", "json", "-show_streams", "-select_streams", "v:0"])
            .arg(path)
            .stderr(Stdio::null())
            .output()
            .map_err(|e| open_failed(format!("cannot run {}: {}", tools.ffprobe.display(), e)))?;

        if !output.status.success() {
            return Err(open_failed(format!("ffprobe exited with {}", output.status)).into());
        }

        let probe: ProbeOutput = serde_json::from_slice(&output.stdout)
            .map_err(|e| open_failed(format!("unreadable ffprobe output: {}", e)))?;
        let stream = probe
            .streams
            .into_iter()
            .next()
            .ok_or_else(|| open_failed("no video stream".to_string()))?;

        let (width, height) = match (stream.width, stream.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
            _ => return Err(open_failed("video stream has no dimensions".to_string()).into()),
        };

        let fps = stream
            .avg_frame_rate
            .as_deref()
            .and_then(parse_frame_rate)
            .or_else(|| stream.r_frame_rate.as_deref().and_then(parse_frame_rate))
            .unwrap_or(0.0);
        let frame_count_hint = stream
            .nb_frames
            .as_deref()
            .and_then(|n| n.parse().ok())
            .unwrap_or(0);

        info!(
            "Video properties: {}x{}, {} frames, {:.2} FPS",
            width, height, frame_count_hint, fps
        );

        let mut child = Command::new(&tools.ffmpeg)
            .args(["-nostdin", "-v", "error", "-noautorotate", "-i"])
            .arg(path)
            .args(["-map", "0:v:0", "-f", "rawvideo", "-pix_fmt", "rgb24", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| open_failed(format!("cannot run {}: {}", tools.ffmpeg.display(), e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| open_failed("ffmpeg stdout unavailable".to_string()))?;

        Ok(Self {
            child,
            stdout: BufReader::new(stdout),
            path: path_str,
            resolution: Resolution::new(width, height),
            fps,
            frame_count_hint,
            frames_read: 0,
            exhausted: false,
        })
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn finish_decoder(&mut self) -> Result<()> {
        self.exhausted = true;
        let status = self.child.wait()?;
        if !status.success() && self.frames_read == 0 {
            return Err(SourceError::OpenFailed {
                path: self.path.clone(),
                reason: format!("ffmpeg exited with {}", status),
            }
            .into());
        }
        if !status.success() {
            warn!("ffmpeg exited with {} after {} frames", status, self.frames_read);
        }
        Ok(())
    }
}

/// Fill `buf` as far as the reader allows; returns the number of bytes read
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

impl FrameSource for CliSource {
    fn frame_rate(&self) -> f64 {
        self.fps
    }

    fn frame_count_hint(&self) -> u64 {
        self.frame_count_hint
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.exhausted {
            return Ok(None);
        }

        let frame_size = self.resolution.width as usize * self.resolution.height as usize * 3;
        let mut buf = vec![0u8; frame_size];
        let filled = read_full(&mut self.stdout, &mut buf).map_err(|e| SourceError::ReadFailed {
            index: self.frames_read,
            reason: e.to_string(),
        })?;

        if filled < frame_size {
            if filled > 0 {
                warn!("Discarding truncated trailing frame ({} of {} bytes)", filled, frame_size);
            }
            self.finish_decoder()?;
            return Ok(None);
        }

        let frame = Frame::from_rgb_bytes(self.resolution.width, self.resolution.height, buf)
            .ok_or_else(|| SourceError::ReadFailed {
                index: self.frames_read,
                reason: "frame buffer size mismatch".to_string(),
            })?;
        self.frames_read += 1;
        Ok(Some(frame))
    }
}

impl Drop for CliSource {
    fn drop(&mut self) {
        if !self.exhausted {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// Output stream encoded by a child `ffmpeg` process
pub struct CliSink {
    child: Child,
    stdin: Option<BufWriter<ChildStdin>>,
    path: PathBuf,
    resolution: Resolution,
    frames_written: u64,
}

impl CliSink {
    pub fn open(
        path: &Path,
        resolution: Resolution,
        fps: f64,
        format: OutputFormat,
        tools: &CliTools,
    ) -> Result<Self> {
        let open_failed = |reason: String| OutputError::OpenFailed {
            path: path.display().to_string(),
            reason,
        };

        if resolution.width == 0 || resolution.height == 0 {
            return Err(open_failed(format!("invalid geometry {}", resolution)).into());
        }

        let mut cmd = Command::new(&tools.ffmpeg);
        cmd.args(["-nostdin", "-y", "-v", "error", "-f", "rawvideo", "-pix_fmt", "rgb24"])
            .args(["-s", &resolution.to_string()])
            .args(["-r", &format_rate(fps)])
            .args(["-i", "-"]);

        cmd.args(["-c:v", format.ffmpeg_codec()]);
        match format {
            OutputFormat::Webm => cmd.args(["-crf", "32", "-b:v", "0"]),
            _ => cmd.args(["-q:v", "2"]),
        };
        cmd.args(["-pix_fmt", "yuv420p"]).arg(path);

        debug!("Spawning encoder: {:?}", cmd);

        let mut child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| open_failed(format!("cannot run {}: {}", tools.ffmpeg.display(), e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| open_failed("ffmpeg stdin unavailable".to_string()))?;

        Ok(Self {
            child,
            stdin: Some(BufWriter::new(stdin)),
            path: path.to_path_buf(),
            resolution,
            frames_written: 0,
        })
    }
}

fn format_rate(fps: f64) -> String {
    let (num, den) = crate::video::fps_to_rational(fps);
    format!("{}/{}", num, den)
}

impl FrameSink for CliSink {
    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        if frame.resolution() != self.resolution {
            return Err(OutputError::EncodingFailed {
                reason: format!(
                    "frame is {} but the stream was opened at {}",
                    frame.resolution(),
                    self.resolution
                ),
            }
            .into());
        }

        let stdin = self.stdin.as_mut().ok_or_else(|| OutputError::EncodingFailed {
            reason: "stream already closed".to_string(),
        })?;

        stdin
            .write_all(frame.as_rgb_bytes())
            .map_err(|e| OutputError::EncodingFailed {
                reason: format!("ffmpeg rejected frame {}: {}", self.frames_written, e),
            })?;
        self.frames_written += 1;
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<()> {
        if let Some(mut stdin) = self.stdin.take() {
            stdin.flush().map_err(|e| OutputError::EncodingFailed {
                reason: format!("flushing frames to ffmpeg: {}", e),
            })?;
        }

        let status = self.child.wait()?;
        if !status.success() {
            return Err(OutputError::EncodingFailed {
                reason: format!("ffmpeg exited with {} writing {}", status, self.path.display()),
            }
            .into());
        }

        debug!("Closed {} after {} frames", self.path.display(), self.frames_written);
        Ok(())
    }
}

impl Drop for CliSink {
    fn drop(&mut self) {
        // finish() takes stdin; anything still holding it was abandoned mid-stream
        if self.stdin.take().is_some() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// [`SinkOpener`] producing [`CliSink`]s
#[derive(Debug, Clone, Default)]
pub struct CliSinkOpener {
    tools: CliTools,
}

impl CliSinkOpener {
    pub fn new(tools: CliTools) -> Self {
        Self { tools }
    }
}

impl SinkOpener for CliSinkOpener {
    fn open(
        &self,
        path: &Path,
        resolution: Resolution,
        fps: f64,
        format: OutputFormat,
    ) -> Result<Box<dyn FrameSink>> {
        Ok(Box::new(CliSink::open(path, resolution, fps, format, &self.tools)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_read_full_short_reader() {
        let data = [1u8, 2, 3];
        let mut buf = [0u8; 5];
        let n = read_full(&mut &data[..], &mut buf).unwrap();
        assert_eq!(n, 3);
        assert_eq!(&buf[..3], &data);
    }

    #[test]
    fn test_probe_output_parsing() {
        let json = r#"{"streams":[{"width":64,"height":48,"r_frame_rate":"2/1","avg_frame_rate":"0/0","nb_frames":"3","codec_name":"mpeg4"}]}"#;
        let probe: ProbeOutput = serde_json::from_str(json).unwrap();
        let stream = &probe.streams[0];
        assert_eq!(stream.width, Some(64));
        assert_eq!(stream.nb_frames.as_deref(), Some("3"));
        assert_eq!(stream.r_frame_rate.as_deref().and_then(parse_frame_rate), Some(2.0));
    }

    #[test]
    fn test_open_missing_file_fails_before_spawning() {
        let dir = tempdir().unwrap();
        let result = CliSource::open(dir.path().join("absent.mp4"), &CliTools::default());
        assert!(matches!(
            result,
            Err(crate::error::OooError::Source(SourceError::OpenFailed { .. }))
        ));
    }

    #[test]
    fn test_cli_roundtrip_when_ffmpeg_installed() {
        let tools = CliTools::default();
        if !tools.is_available() {
            eprintln!("ffmpeg not installed, skipping");
            return;
        }

        let dir = tempdir().unwrap();
        let path = dir.path().join("probe.mp4");
        let mut sink = CliSinkOpener::new(tools.clone())
            .open(&path, Resolution::new(64, 48), 2.0, OutputFormat::Mp4)
            .unwrap();
        for shade in [40u8, 120, 200] {
            sink.write_frame(&Frame::new_filled(64, 48, [shade, shade, shade])).unwrap();
        }
        sink.finish().unwrap();

        let mut source = CliSource::open(&path, &tools).unwrap();
        assert_eq!(source.resolution(), Resolution::new(64, 48));
        assert!((source.frame_rate() - 2.0).abs() < 1e-6);

        let mut count = 0;
        while let Some(frame) = source.next_frame().unwrap() {
            assert_eq!(frame.width(), 64);
            count += 1;
        }
        assert_eq!(count, 3);
    }

    #[test]
    fn test_odd_geometry_is_kept_when_ffmpeg_installed() {
        let tools = CliTools::default();
        if !tools.is_available() {
            eprintln!("ffmpeg not installed, skipping");
            return;
        }

        let dir = tempdir().unwrap();
        let path = dir.path().join("odd.mp4");
        let mut sink = CliSinkOpener::new(tools.clone())
            .open(&path, Resolution::new(15, 9), 5.0, OutputFormat::Mp4)
            .unwrap();
        for shade in [30u8, 90] {
            sink.write_frame(&Frame::new_filled(15, 9, [shade, shade, shade])).unwrap();
        }
        sink.finish().unwrap();

        let mut source = CliSource::open(&path, &tools).unwrap();
        assert_eq!(source.resolution(), Resolution::new(15, 9));
        let frame = source.next_frame().unwrap().unwrap();
        assert_eq!(frame.resolution(), Resolution::new(15, 9));
    }
}
