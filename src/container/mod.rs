//! # Container Format
//!
//! The `.ooo` container is a single UTF-8 JSON object with two required
//! blocks: `metadata` (frame count, first-frame resolution, frame rate and the
//! format tag) and `frames`, an ordered array of base64 JPEG records. Unknown
//! keys are ignored on load.
//!
//! ```rust,no_run
//! use ooo_codec::container;
//!
//! let check = container::validate("clip.ooo");
//! if check.valid {
//!     let document = container::load("clip.ooo")?;
//!     println!("{} frames at {} fps", document.frame_count(), document.metadata.fps);
//! }
//! # Ok::<(), ooo_codec::OooError>(())
//! ```

pub mod document;
pub mod loader;
pub mod writer;

pub use document::{
    ContainerDocument, EncodedFrame, FrameRecord, Metadata, CONTAINER_EXTENSION, FORMAT_TAG,
};
pub use loader::{find_containers, load, validate, Validation};
pub use writer::{to_json, write, write_with};
