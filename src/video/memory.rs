//! In-memory frame source and sink.
//!
//! Useful when frames come from (or go to) somewhere other than a file, and
//! for exercising the encode/decode pipelines without an external codec.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::{OutputError, Result};
use crate::video::traits::{FrameSink, FrameSource, OutputFormat, SinkOpener};
use crate::video::types::{Frame, Resolution};

/// Frame source backed by a queue of already decoded frames
#[derive(Debug, Clone)]
pub struct MemorySource {
    frames: VecDeque<Frame>,
    fps: f64,
    frame_count_hint: u64,
}

impl MemorySource {
    pub fn new(frames: Vec<Frame>, fps: f64) -> Self {
        let frame_count_hint = frames.len() as u64;
        Self { frames: frames.into(), fps, frame_count_hint }
    }

    /// Override the reported frame count, e.g. 0 to mimic containers that omit it
    pub fn with_frame_count_hint(mut self, hint: u64) -> Self {
        self.frame_count_hint = hint;
        self
    }
}

impl FrameSource for MemorySource {
    fn frame_rate(&self) -> f64 {
        self.fps
    }

    fn frame_count_hint(&self) -> u64 {
        self.frame_count_hint
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        Ok(self.frames.pop_front())
    }
}

/// Everything a [`MemorySinkOpener`] recorded for one output stream
#[derive(Debug, Clone, Default)]
pub struct RecordedVideo {
    pub path: PathBuf,
    pub resolution: Option<Resolution>,
    pub fps: f64,
    pub format: Option<OutputFormat>,
    pub frames: Vec<Frame>,
    pub finished: bool,
}

/// Sink opener that keeps written frames in memory
///
/// Clones share the same recording, so a caller can hand one clone to the
/// reconstructor and inspect the other afterwards. When `touch_files` is set
/// an empty file is created at the output path on finish, standing in for the
/// video a real encoder would leave behind.
#[derive(Debug, Clone, Default)]
pub struct MemorySinkOpener {
    recorded: Rc<RefCell<Vec<RecordedVideo>>>,
    touch_files: bool,
}

impl MemorySinkOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn touching_files() -> Self {
        Self { touch_files: true, ..Self::default() }
    }

    /// Snapshot of every stream opened so far
    pub fn recorded(&self) -> Vec<RecordedVideo> {
        self.recorded.borrow().clone()
    }
}

struct MemorySink {
    recorded: Rc<RefCell<Vec<RecordedVideo>>>,
    slot: usize,
    resolution: Resolution,
    touch_files: bool,
}

impl SinkOpener for MemorySinkOpener {
    fn open(
        &self,
        path: &Path,
        resolution: Resolution,
        fps: f64,
        format: OutputFormat,
    ) -> Result<Box<dyn FrameSink>> {
        let mut recorded = self.recorded.borrow_mut();
        recorded.push(RecordedVideo {
            path: path.to_path_buf(),
            resolution: Some(resolution),
            fps,
            format: Some(format),
            frames: Vec::new(),
            finished: false,
        });

        Ok(Box::new(MemorySink {
            recorded: Rc::clone(&self.recorded),
            slot: recorded.len() - 1,
            resolution,
            touch_files: self.touch_files,
        }))
    }
}

impl FrameSink for MemorySink {
    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        if frame.resolution() != self.resolution {
            return Err(OutputError::EncodingFailed {
                reason: format!("frame is {} but stream is {}", frame.resolution(), self.resolution),
            }
            .into());
        }
        self.recorded.borrow_mut()[self.slot].frames.push(frame.clone());
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<()> {
        let mut recorded = self.recorded.borrow_mut();
        let video = &mut recorded[self.slot];
        video.finished = true;
        if self.touch_files {
            std::fs::write(&video.path, b"")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_source_drains_in_order() {
        let frames = vec![Frame::new_filled(2, 2, [1, 1, 1]), Frame::new_filled(2, 2, [2, 2, 2])];
        let mut source = MemorySource::new(frames, 2.0);
        assert_eq!(source.frame_count_hint(), 2);
        assert_eq!(source.next_frame().unwrap().unwrap().get_pixel(0, 0), [1, 1, 1]);
        assert_eq!(source.next_frame().unwrap().unwrap().get_pixel(0, 0), [2, 2, 2]);
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_memory_sink_rejects_geometry_change() {
        let opener = MemorySinkOpener::new();
        let mut sink = opener
            .open(Path::new("out.mp4"), Resolution::new(4, 4), 30.0, OutputFormat::Mp4)
            .unwrap();
        sink.write_frame(&Frame::new_black(4, 4)).unwrap();
        assert!(sink.write_frame(&Frame::new_black(2, 2)).is_err());
        sink.finish().unwrap();

        let recorded = opener.recorded();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].frames.len(), 1);
        assert!(recorded[0].finished);
    }
}
