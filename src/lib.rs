//! # ooo-codec
//!
//! Convert videos into portable `.ooo` frame containers and back, with an
//! optional enhancement pipeline applied while rebuilding the video.
//!
//! A container is a single JSON document: a metadata block (frame count,
//! resolution, frame rate, format tag) followed by every frame as a base64
//! JPEG. Decoding streams the frames through a chain of image operators
//! chosen by a named preset and re-encodes them with ffmpeg.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use ooo_codec::{Config, Encoder, Reconstructor};
//!
//! # fn main() -> ooo_codec::Result<()> {
//! let config = Config::default();
//!
//! let encoded = Encoder::new(config.clone()).encode_file("clip.mp4")?;
//! println!("{} frames -> {}", encoded.frames, encoded.container_path.display());
//!
//! let decoded = Reconstructor::from_config(&config)?.decode_file(
//!     &encoded.container_path,
//!     "vivid",
//!     &config.preset_registry(),
//!     Path::new("output"),
//!     config.video.output_format,
//! )?;
//! assert!(decoded.success());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`video`] - Frame sources and sinks (ffmpeg CLI, libav, in-memory)
//! - [`codec`] - Per-frame JPEG and base64 payloads
//! - [`container`] - The `.ooo` document, writer, loader and validator
//! - [`presets`] - Named enhancement parameter sets
//! - [`enhance`] - The enhancement operators and pipeline
//! - [`encode`] / [`reconstruct`] - The two end-to-end paths
//! - [`naming`] - Collision-safe output names
//! - [`progress`] - Progress snapshots and callbacks
//! - [`config`] - Configuration management
//!
//! ## Custom Operators
//!
//! The pipeline accepts any type implementing [`Operator`](enhance::Operator):
//!
//! ```rust
//! use std::borrow::Cow;
//!
//! use ooo_codec::enhance::{Operator, Pipeline, Tone};
//! use ooo_codec::error::EnhanceError;
//! use ooo_codec::presets::PresetParams;
//! use ooo_codec::video::Frame;
//!
//! struct Invert;
//!
//! impl Operator for Invert {
//!     fn name(&self) -> &'static str {
//!         "invert"
//!     }
//!
//!     fn description(&self) -> &'static str {
//!         "Photographic negative"
//!     }
//!
//!     fn apply<'a>(&self, frame: &'a Frame, _params: &PresetParams) -> Result<Cow<'a, Frame>, EnhanceError> {
//!         let mut image = frame.as_image().clone();
//!         image.iter_mut().for_each(|v| *v = 255 - *v);
//!         Ok(Cow::Owned(Frame::new(image)))
//!     }
//! }
//!
//! let pipeline = Pipeline::with_stages(vec![Box::new(Invert), Box::new(Tone::new())]);
//! assert_eq!(pipeline.stage_names(), vec!["invert", "tone"]);
//! ```

pub mod codec;
pub mod config;
pub mod container;
pub mod encode;
pub mod enhance;
pub mod error;
pub mod naming;
pub mod presets;
pub mod progress;
pub mod reconstruct;
pub mod video;

// Re-export commonly used types for convenience
pub use crate::{
    config::Config,
    container::{ContainerDocument, Validation},
    encode::{EncodeReport, Encoder},
    enhance::{enhance, Operator, Pipeline},
    error::{OooError, Result},
    presets::{Preset, PresetParams, PresetRegistry},
    reconstruct::{ReconstructionReport, Reconstructor},
    video::{Frame, OutputFormat, VideoBackend},
};
