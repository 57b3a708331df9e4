use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::{
    config::Config,
    container::{self, ContainerDocument},
    enhance::Pipeline,
    error::Result,
    naming,
    presets::{Preset, PresetRegistry},
    progress::{LogProgress, Operation, ProgressCallback, ProgressTracker},
    video::{self, Frame, FrameSink, OutputFormat, Resolution, SinkOpener},
};

/// Outcome of rebuilding a video from a container
#[derive(Debug, Clone, PartialEq)]
pub struct ReconstructionReport {
    /// The video path that was (or would have been) written
    pub output_path: PathBuf,
    /// Preset the frames went through
    pub preset: &'static str,
    /// `metadata.total_frames` as found in the file
    pub declared_frames: u64,
    /// Frame records actually present
    pub records: u64,
    /// Frames appended to the output video
    pub written: u64,
    /// Records that failed to decode
    pub skipped: u64,
    /// Frames resized to the stream geometry before writing
    pub resized: u64,
    /// Geometry of the output stream, once opened
    pub resolution: Option<Resolution>,
    /// Frame rate of the output stream
    pub fps: f64,
}

impl ReconstructionReport {
    /// True when the output video exists on disk
    pub fn success(&self) -> bool {
        self.output_path.exists()
    }

    /// True when declared, present and written counts all agree
    pub fn counts_agree(&self) -> bool {
        self.declared_frames == self.records && self.records == self.written
    }
}

/// Output stream that is opened by the first frame that reaches it
enum WriterState {
    Pending,
    Open {
        sink: Box<dyn FrameSink>,
        resolution: Resolution,
    },
}

impl WriterState {
    /// Append a frame, opening the stream at this frame's geometry if needed
    ///
    /// Returns whether the frame had to be resized to fit an open stream.
    fn write(
        &mut self,
        frame: Frame,
        opener: &dyn SinkOpener,
        path: &Path,
        fps: f64,
        format: OutputFormat,
    ) -> Result<bool> {
        if let WriterState::Pending = self {
            let resolution = frame.resolution();
            info!("   Opening output stream {} at {} fps", resolution, fps);
            let sink = opener.open(path, resolution, fps, format)?;
            *self = WriterState::Open { sink, resolution };
        }

        match self {
            WriterState::Open { sink, resolution } => {
                if frame.resolution() == *resolution {
                    sink.write_frame(&frame)?;
                    Ok(false)
                } else {
                    debug!("Resizing {} frame to {}", frame.resolution(), resolution);
                    sink.write_frame(&frame.resized(resolution.width, resolution.height))?;
                    Ok(true)
                }
            }
            WriterState::Pending => Ok(false),
        }
    }

    fn resolution(&self) -> Option<Resolution> {
        match self {
            WriterState::Open { resolution, .. } => Some(*resolution),
            WriterState::Pending => None,
        }
    }

    /// Flush and close the stream; a stream that never opened is a no-op
    fn finish(self) -> Result<()> {
        match self {
            WriterState::Open { sink, .. } => sink.finish(),
            WriterState::Pending => Ok(()),
        }
    }
}

/// Rebuilds videos from containers, enhancing each frame on the way
pub struct Reconstructor {
    sinks: Box<dyn SinkOpener>,
    pipeline: Pipeline,
    progress: Box<dyn ProgressCallback>,
    interval: u64,
}

impl Reconstructor {
    /// Create a reconstructor writing through `sinks`
    pub fn new(sinks: Box<dyn SinkOpener>) -> Self {
        Self {
            sinks,
            pipeline: Pipeline::standard(),
            progress: Box::new(LogProgress),
            interval: crate::progress::DEFAULT_INTERVAL,
        }
    }

    /// Create a reconstructor for the backend and cadence in `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        let sinks = video::sink_opener(config.video.backend, &config.cli_tools())?;
        Ok(Self::new(sinks).with_interval(config.progress.interval))
    }

    pub fn with_progress(mut self, progress: Box<dyn ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_interval(mut self, interval: u64) -> Self {
        self.interval = interval.max(1);
        self
    }

    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Load `container_path`, pick a free output name and rebuild the video
    pub fn decode_file<P: AsRef<Path>>(
        &self,
        container_path: P,
        preset_name: &str,
        registry: &PresetRegistry,
        output_dir: &Path,
        format: OutputFormat,
    ) -> Result<ReconstructionReport> {
        let container_path = container_path.as_ref();
        let document = container::load(container_path)?;
        let preset = registry.resolve(preset_name);

        let stem = naming::stem_of(container_path);
        let output = naming::name_for(&stem, &preset, format, output_dir)?;

        info!("🎬 Decoding {}", container_path.display());
        info!("   Preset: {}", preset.name);
        info!("   Output: {}", output.display());

        self.reconstruct(&document, &preset, &output, format)
    }

    /// Decode, enhance and write every record of `document` in order
    ///
    /// Records that fail to decode are logged and skipped. The output stream
    /// is opened at the first produced frame's geometry; when no frame can be
    /// produced nothing is written and the report's `success()` is false.
    pub fn reconstruct(
        &self,
        document: &ContainerDocument,
        preset: &Preset,
        output: &Path,
        format: OutputFormat,
    ) -> Result<ReconstructionReport> {
        let fps = document.metadata.fps;
        let records = document.frame_count() as u64;

        let mut report = ReconstructionReport {
            output_path: output.to_path_buf(),
            preset: preset.name,
            declared_frames: document.metadata.total_frames,
            records,
            written: 0,
            skipped: 0,
            resized: 0,
            resolution: None,
            fps,
        };

        let mut tracker =
            ProgressTracker::new(self.progress.as_ref(), Operation::Decoding, Some(records), self.interval);
        let mut state = WriterState::Pending;

        for (index, record) in document.frames.iter().enumerate() {
            match record.decode(index) {
                Ok(frame) => {
                    let frame = self.pipeline.run(frame, preset);
                    if state.write(frame, self.sinks.as_ref(), output, fps, format)? {
                        report.resized += 1;
                    }
                    report.written += 1;
                }
                Err(e) => {
                    warn!("Skipping frame {}: {}", index, e);
                    report.skipped += 1;
                }
            }
            tracker.advance();
        }
        tracker.finish();

        report.resolution = state.resolution();
        if report.resolution.is_none() {
            warn!("No frame could be decoded from the container; nothing was written");
        }
        state.finish()?;

        if !report.counts_agree() {
            warn!(
                "Frame counts differ: declared {}, present {}, written {}, skipped {}",
                report.declared_frames, report.records, report.written, report.skipped
            );
        }

        if report.success() {
            info!("✅ Video processed successfully: {}", output.display());
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use crate::container::EncodedFrame;
    use crate::presets::IDENTITY;
    use crate::video::MemorySinkOpener;
    use tempfile::tempdir;

    fn document(frames: &[Frame], fps: f64) -> ContainerDocument {
        let encoded = frames.iter().enumerate().map(|(i, frame)| EncodedFrame {
            index: i as u64,
            bytes: codec::encode_frame(frame).unwrap(),
            resolution: frame.resolution(),
        });
        ContainerDocument::from_encoded(encoded, fps)
    }

    fn reconstructor(opener: &MemorySinkOpener) -> Reconstructor {
        Reconstructor::new(Box::new(opener.clone()))
    }

    #[test]
    fn test_stream_opens_at_first_frame_geometry() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("out.mp4");
        let doc = document(
            &[Frame::new_filled(16, 8, [10, 20, 30]), Frame::new_filled(32, 32, [40, 50, 60])],
            2.0,
        );

        let opener = MemorySinkOpener::touching_files();
        let report = reconstructor(&opener).reconstruct(&doc, &IDENTITY, &output, OutputFormat::Mp4).unwrap();

        let recorded = opener.recorded();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].resolution, Some(Resolution::new(16, 8)));
        assert_eq!(recorded[0].fps, 2.0);
        assert_eq!(recorded[0].frames.len(), 2);
        assert!(recorded[0].frames.iter().all(|f| f.resolution() == Resolution::new(16, 8)));
        assert!(recorded[0].finished);

        assert_eq!(report.resized, 1);
        assert!(report.success());
        assert!(report.counts_agree());
    }

    #[test]
    fn test_corrupted_record_is_skipped() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("out.mp4");
        let frames: Vec<Frame> = (0..4).map(|i| Frame::new_filled(8, 8, [i * 50, 0, 0])).collect();
        let mut doc = document(&frames, 10.0);
        doc.frames[2].data = "%%% definitely not base64 %%%".to_string();

        let opener = MemorySinkOpener::touching_files();
        let report = reconstructor(&opener).reconstruct(&doc, &IDENTITY, &output, OutputFormat::Mp4).unwrap();

        assert_eq!(report.written, 3);
        assert_eq!(report.skipped, 1);
        assert!(!report.counts_agree());
        assert_eq!(opener.recorded()[0].frames.len(), 3);
    }

    #[test]
    fn test_nothing_decodable_writes_nothing() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("out.mp4");
        let mut doc = document(&[Frame::new_filled(8, 8, [1, 2, 3])], 10.0);
        doc.frames[0].data.clear();

        let opener = MemorySinkOpener::touching_files();
        let report = reconstructor(&opener).reconstruct(&doc, &IDENTITY, &output, OutputFormat::Mp4).unwrap();

        assert!(opener.recorded().is_empty());
        assert_eq!(report.resolution, None);
        assert!(!report.success());
    }

    #[test]
    fn test_decode_file_names_output_after_preset() {
        let dir = tempdir().unwrap();
        let container_path = dir.path().join("clip.ooo");
        container::write(&document(&[Frame::new_filled(8, 8, [90, 90, 90])], 5.0), &container_path).unwrap();

        let opener = MemorySinkOpener::touching_files();
        let out_dir = dir.path().join("videos");
        let report = reconstructor(&opener)
            .decode_file(&container_path, "crisp", &PresetRegistry::new(), &out_dir, OutputFormat::Mkv)
            .unwrap();

        assert_eq!(report.output_path, out_dir.join("clip_crisp.mkv"));
        assert_eq!(report.preset, "crisp");
        assert!(report.success());
    }
}
