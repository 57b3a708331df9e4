use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::container::document::ContainerDocument;
use crate::error::{OutputError, Result};

/// Serialize a document to JSON text
///
/// Field order follows the struct definitions, so identical documents always
/// produce identical bytes.
pub fn to_json(document: &ContainerDocument, pretty: bool) -> Result<String> {
    let text = if pretty {
        serde_json::to_string_pretty(document)
    } else {
        serde_json::to_string(document)
    };
    text.map_err(|e| OutputError::WriteFailed {
        path: "<memory>".to_string(),
        reason: e.to_string(),
    }
    .into())
}

/// Write a document to `path` as pretty-printed JSON
pub fn write<P: AsRef<Path>>(document: &ContainerDocument, path: P) -> Result<()> {
    write_with(document, path, true)
}

/// Write a document to `path`, choosing pretty or compact JSON
pub fn write_with<P: AsRef<Path>>(document: &ContainerDocument, path: P, pretty: bool) -> Result<()> {
    let path = path.as_ref();
    let write_failed = |reason: String| OutputError::WriteFailed {
        path: path.display().to_string(),
        reason,
    };

    let file = File::create(path).map_err(|e| write_failed(e.to_string()))?;
    let mut writer = BufWriter::new(file);

    let result = if pretty {
        serde_json::to_writer_pretty(&mut writer, document)
    } else {
        serde_json::to_writer(&mut writer, document)
    };
    result.map_err(|e| write_failed(e.to_string()))?;
    writer.flush().map_err(|e| write_failed(e.to_string()))?;

    info!("Encoded data saved to: {}", path.display());
    Ok(())
}
