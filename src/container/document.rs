use serde::{Deserialize, Serialize};

use crate::codec;
use crate::error::Result;
use crate::video::types::{Frame, Resolution};

/// Format tag written into every container
pub const FORMAT_TAG: &str = "ooo_encoded_v1.0";

/// Format tags this version can read
pub const KNOWN_FORMAT_TAGS: [&str; 1] = [FORMAT_TAG];

/// Conventional container file extension
pub const CONTAINER_EXTENSION: &str = "ooo";

/// Whole-file container: metadata block plus ordered frame records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerDocument {
    pub metadata: Metadata,
    pub frames: Vec<FrameRecord>,
}

/// The `metadata` block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Number of frame records at write time
    pub total_frames: u64,

    /// Geometry of the first frame, `<width>x<height>`
    pub resolution: String,

    /// Frame rate declared by the source video
    pub fps: f64,

    /// Format tag and version, see [`FORMAT_TAG`]
    pub format: String,
}

/// One still-image-compressed frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    /// Advisory; equals the record's position when written by this crate
    pub frame_number: u64,

    /// Base64 of the JPEG bytes
    pub data: String,

    /// Geometry of this frame, `<width>x<height>`
    pub resolution: String,
}

/// A frame already compressed by [`codec::encode_frame`], not yet text encoded
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    pub index: u64,
    pub bytes: Vec<u8>,
    pub resolution: Resolution,
}

impl ContainerDocument {
    /// Build a document from compressed frames in presentation order
    pub fn from_encoded<I>(frames: I, fps: f64) -> Self
    where
        I: IntoIterator<Item = EncodedFrame>,
    {
        let frames: Vec<FrameRecord> = frames
            .into_iter()
            .map(|frame| FrameRecord {
                frame_number: frame.index,
                data: codec::to_text(&frame.bytes),
                resolution: frame.resolution.to_string(),
            })
            .collect();

        let resolution = frames
            .first()
            .map(|record| record.resolution.clone())
            .unwrap_or_else(|| Resolution::new(0, 0).to_string());

        Self {
            metadata: Metadata {
                total_frames: frames.len() as u64,
                resolution,
                fps,
                format: FORMAT_TAG.to_string(),
            },
            frames,
        }
    }

    /// Number of records actually present, regardless of what the metadata claims
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// True when the declared total disagrees with the record count
    pub fn has_count_mismatch(&self) -> bool {
        self.metadata.total_frames != self.frames.len() as u64
    }
}

impl FrameRecord {
    /// Decode this record to a raster; `index` is its position in the document
    pub fn decode(&self, index: usize) -> Result<Frame> {
        let bytes = codec::from_text(index, &self.data)?;
        codec::decode_frame(index, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(index: u64, width: u32, height: u32) -> EncodedFrame {
        let frame = Frame::new_filled(width, height, [200, 40, 40]);
        EncodedFrame {
            index,
            bytes: codec::encode_frame(&frame).unwrap(),
            resolution: frame.resolution(),
        }
    }

    #[test]
    fn test_from_encoded_fills_metadata() {
        let doc = ContainerDocument::from_encoded(vec![encoded(0, 16, 8), encoded(1, 16, 8)], 2.0);
        assert_eq!(doc.metadata.total_frames, 2);
        assert_eq!(doc.metadata.resolution, "16x8");
        assert_eq!(doc.metadata.fps, 2.0);
        assert_eq!(doc.metadata.format, FORMAT_TAG);
        assert_eq!(doc.frames[1].frame_number, 1);
        assert!(!doc.has_count_mismatch());
    }

    #[test]
    fn test_empty_document_resolution() {
        let doc = ContainerDocument::from_encoded(Vec::new(), 30.0);
        assert_eq!(doc.metadata.resolution, "0x0");
        assert_eq!(doc.frame_count(), 0);
    }

    #[test]
    fn test_record_decodes_back() {
        let doc = ContainerDocument::from_encoded(vec![encoded(0, 16, 8)], 2.0);
        let frame = doc.frames[0].decode(0).unwrap();
        assert_eq!(frame.resolution(), Resolution::new(16, 8));
    }
}
