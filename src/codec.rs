//! Still-image codec for individual frames and the text-safe payload encoding.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, ImageFormat};

use crate::error::{FrameError, Result};
use crate::video::types::Frame;

/// JPEG quality used for every stored frame
pub const JPEG_QUALITY: u8 = 90;

/// Compress one frame to JPEG at [`JPEG_QUALITY`]
pub fn encode_frame(frame: &Frame) -> Result<Vec<u8>> {
    if frame.is_empty() {
        return Err(FrameError::EncodeFailed { reason: "frame has no pixels".to_string() }.into());
    }

    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY)
        .encode(frame.as_rgb_bytes(), frame.width(), frame.height(), ColorType::Rgb8)
        .map_err(|e| FrameError::EncodeFailed { reason: e.to_string() })?;
    Ok(bytes)
}

/// Decode still-image bytes back into an RGB frame
///
/// The format is sniffed from the bytes, so PNG payloads written by other
/// tools decode as well as our own JPEGs.
pub fn decode_frame(index: usize, bytes: &[u8]) -> Result<Frame> {
    let format = image::guess_format(bytes).unwrap_or(ImageFormat::Jpeg);
    let image = image::load(Cursor::new(bytes), format).map_err(|e| FrameError::DecodeFailed {
        index,
        reason: e.to_string(),
    })?;
    Ok(Frame::new(image.to_rgb8()))
}

/// Text-safe (printable ASCII) form of a frame payload
pub fn to_text(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Reverse of [`to_text`]
pub fn from_text(index: usize, text: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(text.trim())
        .map_err(|e| FrameError::InvalidPayload { index, reason: e.to_string() }.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> Frame {
        let mut frame = Frame::new_black(width, height);
        for y in 0..height {
            for x in 0..width {
                frame.set_pixel(x, y, [(x * 255 / width) as u8, (y * 255 / height) as u8, 96]);
            }
        }
        frame
    }

    #[test]
    fn test_jpeg_is_lossy_but_close() {
        let frame = gradient(32, 24);
        let bytes = encode_frame(&frame).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);

        let decoded = decode_frame(0, &bytes).unwrap();
        assert_eq!(decoded.resolution(), frame.resolution());

        let total: u64 = frame
            .as_rgb_bytes()
            .iter()
            .zip(decoded.as_rgb_bytes())
            .map(|(a, b)| (*a as i32 - *b as i32).unsigned_abs() as u64)
            .sum();
        let mean_error = total as f64 / frame.as_rgb_bytes().len() as f64;
        assert!(mean_error < 4.0, "mean error {}", mean_error);
    }

    #[test]
    fn test_payload_text_is_printable_ascii() {
        let bytes = encode_frame(&gradient(8, 8)).unwrap();
        let text = to_text(&bytes);
        assert!(text.bytes().all(|b| (0x20..0x7F).contains(&b)));
        assert_eq!(from_text(0, &text).unwrap(), bytes);
    }

    #[test]
    fn test_garbage_payloads_fail() {
        assert!(from_text(4, "not base64 !!").is_err());
        assert!(decode_frame(4, b"definitely not a jpeg").is_err());
    }

    #[test]
    fn test_empty_frame_cannot_be_encoded() {
        assert!(encode_frame(&Frame::new_black(0, 0)).is_err());
    }
}
