use std::fmt;
use std::path::Path;
use std::str::FromStr;

use image::{ImageBuffer, Rgb, RgbImage};

/// Source video extensions accepted by the encoder front end
pub const SUPPORTED_VIDEO_EXTENSIONS: [&str; 5] = ["mp4", "avi", "mov", "mkv", "webm"];

/// Represents a single decoded video frame
///
/// This is a simple wrapper around an RGB image buffer that provides
/// convenient methods for the pixel manipulation done by the enhancement
/// operators.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    buffer: RgbImage,
}

impl Frame {
    /// Create a new frame from an RGB image buffer
    pub fn new(buffer: RgbImage) -> Self {
        Self { buffer }
    }

    /// Create a new frame with the given dimensions filled with black
    pub fn new_black(width: u32, height: u32) -> Self {
        Self { buffer: ImageBuffer::new(width, height) }
    }

    /// Create a new frame with the given dimensions filled with the specified color
    pub fn new_filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        let buffer = ImageBuffer::from_fn(width, height, |_, _| Rgb(color));
        Self { buffer }
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    /// True when the frame has no pixels at all
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width(), self.height())
    }

    /// Get a pixel at the given coordinates (returns RGB array)
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.buffer.get_pixel(x, y).0
    }

    /// Set a pixel at the given coordinates
    pub fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 3]) {
        self.buffer.put_pixel(x, y, Rgb(color));
    }

    /// Get the underlying image buffer
    pub fn as_image(&self) -> &RgbImage {
        &self.buffer
    }

    /// Raw interleaved RGB bytes, row major
    pub fn as_rgb_bytes(&self) -> &[u8] {
        self.buffer.as_raw()
    }

    /// Create a frame from raw RGB bytes
    pub fn from_rgb_bytes(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        ImageBuffer::from_raw(width, height, data).map(|buffer| Self { buffer })
    }

    /// Resize to exactly the given geometry
    pub fn resized(&self, width: u32, height: u32) -> Self {
        use image::imageops::FilterType;

        let buffer = image::imageops::resize(&self.buffer, width, height, FilterType::Lanczos3);
        Self { buffer }
    }
}

impl From<RgbImage> for Frame {
    fn from(buffer: RgbImage) -> Self {
        Self::new(buffer)
    }
}

/// Pixel geometry, rendered as `<width>x<height>` in containers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once('x')
            .ok_or_else(|| format!("expected <width>x<height>, got '{}'", s))?;
        let width = w.trim().parse().map_err(|_| format!("bad width in '{}'", s))?;
        let height = h.trim().parse().map_err(|_| format!("bad height in '{}'", s))?;
        Ok(Self { width, height })
    }
}

/// Check whether a path carries one of the supported source video extensions
pub fn is_supported_video<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_display_and_parse() {
        let res = Resolution::new(1920, 1080);
        assert_eq!(res.to_string(), "1920x1080");
        assert_eq!("1920x1080".parse::<Resolution>().unwrap(), res);
        assert!("Unknown".parse::<Resolution>().is_err());
    }

    #[test]
    fn test_frame_bytes_roundtrip() {
        let frame = Frame::new_filled(4, 2, [10, 20, 30]);
        let bytes = frame.as_rgb_bytes().to_vec();
        assert_eq!(bytes.len(), 4 * 2 * 3);

        let rebuilt = Frame::from_rgb_bytes(4, 2, bytes).unwrap();
        assert_eq!(rebuilt, frame);
        assert!(Frame::from_rgb_bytes(4, 2, vec![0; 5]).is_none());
    }

    #[test]
    fn test_supported_extensions() {
        assert!(is_supported_video("clip.mp4"));
        assert!(is_supported_video("CLIP.MKV"));
        assert!(!is_supported_video("notes.txt"));
        assert!(!is_supported_video("no_extension"));
    }
}
