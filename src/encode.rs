use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::{
    codec,
    config::Config,
    container::{self, ContainerDocument, EncodedFrame},
    error::{Result, SourceError},
    naming,
    progress::{LogProgress, Operation, ProgressCallback, ProgressTracker},
    video::{self, is_supported_video, FrameSource, Resolution},
};

/// Frame rate recorded when the source does not report a usable one
pub const FALLBACK_FPS: f64 = 30.0;

/// Statistics of a finished encode
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeReport {
    /// Where the container was written
    pub container_path: PathBuf,
    /// Frame records stored
    pub frames: u64,
    /// Frames the source yielded that could not be compressed
    pub skipped: u64,
    /// Frame rate recorded in the metadata
    pub fps: f64,
    /// Geometry of the first frame
    pub resolution: Resolution,
    /// Size of the container file on disk
    pub size_bytes: u64,
}

impl EncodeReport {
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Turns a source video into a `.ooo` container
///
/// The encoder follows a short pipeline:
/// 1. Extraction - pull frames from the source in decode order
/// 2. Compression - JPEG each frame and collect the records
/// 3. Serialization - write the container document in one go
pub struct Encoder {
    config: Config,
    progress: Box<dyn ProgressCallback>,
}

impl Encoder {
    /// Create an encoder that logs progress through `tracing`
    pub fn new(config: Config) -> Self {
        Self { config, progress: Box::new(LogProgress) }
    }

    /// Replace the progress callback
    pub fn with_progress(mut self, progress: Box<dyn ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    /// Encode a video file into `<output_dir>/<stem>.ooo`
    ///
    /// The extension is checked before anything is opened, and nothing is
    /// written when the source cannot be read.
    pub fn encode_file<P: AsRef<Path>>(&self, video_path: P) -> Result<EncodeReport> {
        let video_path = video_path.as_ref();

        info!("🎬 Processing: {}", video_path.display());

        if !video_path.is_file() {
            return Err(SourceError::OpenFailed {
                path: video_path.display().to_string(),
                reason: "file does not exist".to_string(),
            }
            .into());
        }

        if !is_supported_video(video_path) {
            let extension = video_path
                .extension()
                .map(|ext| ext.to_string_lossy().into_owned())
                .unwrap_or_default();
            return Err(SourceError::UnsupportedFormat { extension }.into());
        }

        let mut source =
            video::open_source(video_path, self.config.video.backend, &self.config.cli_tools())?;

        let output_dir = &self.config.video.output_dir;
        std::fs::create_dir_all(output_dir)?;
        let container_path = naming::container_path_for(video_path, output_dir);

        self.encode_from_source(source.as_mut(), &video_path.display().to_string(), &container_path)
    }

    /// Encode every frame of an already opened source into `output`
    ///
    /// `source_name` only labels log lines and errors.
    pub fn encode_from_source(
        &self,
        source: &mut dyn FrameSource,
        source_name: &str,
        output: &Path,
    ) -> Result<EncodeReport> {
        let fps = match source.frame_rate() {
            fps if fps.is_finite() && fps > 0.0 => fps,
            other => {
                warn!("Source reports frame rate {}, recording {} instead", other, FALLBACK_FPS);
                FALLBACK_FPS
            }
        };
        let hint = source.frame_count_hint();
        info!("   Video properties: {} frames, {:.2} FPS", hint, fps);

        // Steps 1 and 2: extraction and compression
        let (frames, skipped) = self.extract_frames(source, hint)?;
        if frames.is_empty() {
            return Err(SourceError::NoFrames { path: source_name.to_string() }.into());
        }
        info!("   Frames extracted: {}", frames.len());

        let resolution = frames[0].resolution;
        let frame_count = frames.len() as u64;

        // Step 3: serialization
        let document = ContainerDocument::from_encoded(frames, fps);
        container::write_with(&document, output, self.config.container.pretty)?;

        let size_bytes = std::fs::metadata(output).map(|m| m.len()).unwrap_or(0);
        let report = EncodeReport {
            container_path: output.to_path_buf(),
            frames: frame_count,
            skipped,
            fps,
            resolution,
            size_bytes,
        };

        info!("✅ Encoding completed!");
        info!("   File: {}", output.display());
        info!("   Size: {:.2} MB", report.size_mb());
        info!("   Frames: {}", report.frames);
        info!("   Original FPS: {:.2}", report.fps);

        Ok(report)
    }

    fn extract_frames(&self, source: &mut dyn FrameSource, hint: u64) -> Result<(Vec<EncodedFrame>, u64)> {
        let total = (hint > 0).then_some(hint);
        let mut tracker = ProgressTracker::new(
            self.progress.as_ref(),
            Operation::Encoding,
            total,
            self.config.progress.interval,
        );

        let mut frames = Vec::new();
        let mut skipped = 0u64;

        loop {
            let frame = match source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) if frames.is_empty() && skipped == 0 => return Err(e),
                Err(e) => {
                    warn!("Stopping extraction after {} frames: {}", frames.len(), e);
                    break;
                }
            };

            match codec::encode_frame(&frame) {
                Ok(bytes) => frames.push(EncodedFrame {
                    index: frames.len() as u64,
                    bytes,
                    resolution: frame.resolution(),
                }),
                Err(e) => {
                    warn!("Skipping frame {}: {}", tracker.current(), e);
                    skipped += 1;
                }
            }
            tracker.advance();
        }
        tracker.finish();

        debug!("Extraction finished: {} stored, {} skipped", frames.len(), skipped);
        Ok((frames, skipped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{load, FORMAT_TAG};
    use crate::error::OooError;
    use crate::video::{Frame, MemorySource};
    use tempfile::tempdir;

    fn encoder_for(dir: &Path) -> Encoder {
        let mut config = Config::default();
        config.video.output_dir = dir.to_path_buf();
        Encoder::new(config)
    }

    #[test]
    fn test_three_frames_at_two_fps() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("clip.ooo");
        let frames = vec![
            Frame::new_filled(16, 8, [255, 0, 0]),
            Frame::new_filled(16, 8, [0, 255, 0]),
            Frame::new_filled(16, 8, [0, 0, 255]),
        ];
        let mut source = MemorySource::new(frames, 2.0);

        let report = encoder_for(dir.path()).encode_from_source(&mut source, "memory", &output).unwrap();
        assert_eq!(report.frames, 3);
        assert_eq!(report.resolution, Resolution::new(16, 8));
        assert!(report.size_bytes > 0);

        let document = load(&output).unwrap();
        assert_eq!(document.metadata.total_frames, 3);
        assert_eq!(document.metadata.fps, 2.0);
        assert_eq!(document.metadata.format, FORMAT_TAG);
        assert_eq!(document.metadata.resolution, "16x8");
        let numbers: Vec<u64> = document.frames.iter().map(|r| r.frame_number).collect();
        assert_eq!(numbers, vec![0, 1, 2]);
    }

    #[test]
    fn test_empty_source_writes_nothing() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("empty.ooo");
        let mut source = MemorySource::new(Vec::new(), 25.0);

        let err = encoder_for(dir.path()).encode_from_source(&mut source, "memory", &output).unwrap_err();
        assert!(matches!(err, OooError::Source(SourceError::NoFrames { .. })));
        assert!(!output.exists());
    }

    #[test]
    fn test_bad_frame_rate_falls_back() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("norate.ooo");
        let mut source = MemorySource::new(vec![Frame::new_filled(4, 4, [9, 9, 9])], 0.0);

        let report = encoder_for(dir.path()).encode_from_source(&mut source, "memory", &output).unwrap();
        assert_eq!(report.fps, FALLBACK_FPS);
    }

    #[test]
    fn test_unsupported_extension_is_rejected_before_opening() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("notes.txt");
        std::fs::write(&input, b"hello").unwrap();

        let err = encoder_for(dir.path()).encode_file(&input).unwrap_err();
        assert!(matches!(err, OooError::Source(SourceError::UnsupportedFormat { .. })));
        assert!(!dir.path().join("notes.ooo").exists());
    }

    #[test]
    fn test_missing_file_is_rejected() {
        let dir = tempdir().unwrap();
        let err = encoder_for(dir.path()).encode_file(dir.path().join("gone.mp4")).unwrap_err();
        assert!(matches!(err, OooError::Source(SourceError::OpenFailed { .. })));
    }
}
