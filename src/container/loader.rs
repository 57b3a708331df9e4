use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::container::document::{
    ContainerDocument, FrameRecord, Metadata, CONTAINER_EXTENSION, KNOWN_FORMAT_TAGS,
};
use crate::error::{FormatError, Result};

/// Frame rate assumed when a container omits `metadata.fps`
pub const DEFAULT_FPS: f64 = 30.0;

/// Outcome of a pre-flight [`validate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub valid: bool,
    pub reason: String,
}

impl Validation {
    fn ok() -> Self {
        Self { valid: true, reason: "Valid file".to_string() }
    }

    fn failed(error: FormatError) -> Self {
        Self { valid: false, reason: error.to_string() }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawMetadata {
    total_frames: Option<u64>,
    resolution: Option<String>,
    fps: Option<f64>,
    format: Option<String>,
}

/// Advisory check of a container file
///
/// Never fails; every problem is folded into the returned reason. The decode
/// path calls [`load`], which repeats these checks on its own.
pub fn validate<P: AsRef<Path>>(path: P) -> Validation {
    match check(path.as_ref()) {
        Ok(()) => Validation::ok(),
        Err(e) => Validation::failed(e),
    }
}

fn check(path: &Path) -> std::result::Result<(), FormatError> {
    ensure_exists(path)?;

    let has_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(CONTAINER_EXTENSION))
        .unwrap_or(false);
    if !has_extension {
        return Err(FormatError::WrongExtension { path: path.display().to_string() });
    }

    let root = parse(path)?;
    split_blocks(root).map(|_| ())
}

/// Parse and check a container file
pub fn load<P: AsRef<Path>>(path: P) -> Result<ContainerDocument> {
    let path = path.as_ref();
    ensure_exists(path)?;

    let root = parse(path)?;
    let (metadata, frames) = split_blocks(root)?;
    let metadata = read_metadata(metadata)?;
    let frames = read_frames(frames);

    let document = ContainerDocument {
        metadata: Metadata {
            total_frames: metadata.total_frames.unwrap_or(frames.len() as u64),
            resolution: metadata.resolution.unwrap_or_else(|| "Unknown".to_string()),
            fps: metadata.fps.filter(|fps| fps.is_finite() && *fps > 0.0).unwrap_or(DEFAULT_FPS),
            format: metadata.format.unwrap_or_default(),
        },
        frames,
    };

    if document.has_count_mismatch() {
        warn!(
            "Metadata declares {} frames but the file holds {}; using the actual count",
            document.metadata.total_frames,
            document.frame_count()
        );
    }

    info!(".ooo file loaded successfully: {}", path.display());
    Ok(document)
}

fn ensure_exists(path: &Path) -> std::result::Result<(), FormatError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(FormatError::NotFound { path: path.display().to_string() })
    }
}

fn parse(path: &Path) -> std::result::Result<Value, FormatError> {
    let bytes = std::fs::read(path).map_err(|e| FormatError::Malformed { reason: e.to_string() })?;
    serde_json::from_slice(&bytes).map_err(|e| FormatError::Malformed { reason: e.to_string() })
}

/// Check the top-level shape and the format tag, handing back both blocks
fn split_blocks(root: Value) -> std::result::Result<(Map<String, Value>, Vec<Value>), FormatError> {
    let mut root = match root {
        Value::Object(map) => map,
        _ => return Err(FormatError::NotAContainer),
    };

    let metadata = root.remove("metadata").ok_or(FormatError::MissingBlock { block: "metadata" })?;
    let frames = root.remove("frames").ok_or(FormatError::MissingBlock { block: "frames" })?;

    let metadata = match metadata {
        Value::Object(map) => map,
        other => {
            return Err(FormatError::InvalidField {
                field: "metadata",
                reason: format!("expected an object, found {}", kind_of(&other)),
            })
        }
    };
    let frames = match frames {
        Value::Array(items) => items,
        other => {
            return Err(FormatError::InvalidField {
                field: "frames",
                reason: format!("expected an array, found {}", kind_of(&other)),
            })
        }
    };

    match metadata.get("format") {
        None => return Err(FormatError::MissingField { field: "metadata.format" }),
        Some(Value::String(tag)) if KNOWN_FORMAT_TAGS.contains(&tag.as_str()) => {}
        Some(Value::String(tag)) => return Err(FormatError::UnknownFormatTag { tag: tag.clone() }),
        Some(other) => return Err(FormatError::UnknownFormatTag { tag: other.to_string() }),
    }

    Ok((metadata, frames))
}

fn read_metadata(metadata: Map<String, Value>) -> std::result::Result<RawMetadata, FormatError> {
    serde_json::from_value(Value::Object(metadata)).map_err(|e| FormatError::InvalidField {
        field: "metadata",
        reason: e.to_string(),
    })
}

/// Records that fail to deserialize keep their slot with an empty payload,
/// so they are skipped (and counted) like any other undecodable frame.
fn read_frames(frames: Vec<Value>) -> Vec<FrameRecord> {
    frames
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            serde_json::from_value::<FrameRecord>(value).unwrap_or_else(|e| {
                warn!("Frame record {} is malformed: {}", index, e);
                FrameRecord { frame_number: index as u64, ..FrameRecord::default() }
            })
        })
        .collect()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// List the `.ooo` files directly inside `dir`, sorted by path
pub fn find_containers<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_container = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(CONTAINER_EXTENSION))
            .unwrap_or(false);
        if path.is_file() && is_container {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}
