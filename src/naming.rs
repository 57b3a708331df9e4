//! Output file naming.
//!
//! Decoded videos are named `<stem>_decoded` (identity preset) or
//! `<stem>_<preset>`; when that file exists a two-digit counter is appended
//! (`_01`, `_02`, ...). Names are only ever chosen, never written, so a later
//! caller may still lose a race for the same path.

use std::path::{Path, PathBuf};

use crate::container::CONTAINER_EXTENSION;
use crate::error::Result;
use crate::presets::Preset;
use crate::video::OutputFormat;

/// Longest stem kept by [`sanitize_stem`], in characters
pub const MAX_STEM_LEN: usize = 100;

const RESERVED: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Replace characters that are not allowed in file names and cap the length
pub fn sanitize_stem(stem: &str) -> String {
    stem.chars()
        .map(|c| if RESERVED.contains(&c) { '_' } else { c })
        .take(MAX_STEM_LEN)
        .collect()
}

/// The file stem of `path`, or `"video"` when it has none
pub fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "video".to_string())
}

/// Container path for an encoded source video: `<dir>/<sanitized stem>.ooo`
pub fn container_path_for(source: &Path, directory: &Path) -> PathBuf {
    directory.join(format!("{}.{}", sanitize_stem(&stem_of(source)), CONTAINER_EXTENSION))
}

/// First free output path for decoding `stem` with `preset`
///
/// Creates `directory` if it does not exist.
pub fn name_for(stem: &str, preset: &Preset, format: OutputFormat, directory: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(directory)?;

    let base = if preset.is_identity() {
        format!("{}_decoded", stem)
    } else {
        format!("{}_{}", stem, preset.name)
    };
    let extension = format.extension();

    let candidate = directory.join(format!("{}.{}", base, extension));
    if !candidate.exists() {
        return Ok(candidate);
    }

    let mut counter = 1u32;
    loop {
        let candidate = directory.join(format!("{}_{:02}.{}", base, counter, extension));
        if !candidate.exists() {
            return Ok(candidate);
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::{PresetRegistry, IDENTITY};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_identity_collisions_count_up() {
        let dir = tempdir().unwrap();
        let first = name_for("clip", &IDENTITY, OutputFormat::Mp4, dir.path()).unwrap();
        assert_eq!(first, dir.path().join("clip_decoded.mp4"));

        fs::write(&first, b"").unwrap();
        let second = name_for("clip", &IDENTITY, OutputFormat::Mp4, dir.path()).unwrap();
        assert_eq!(second, dir.path().join("clip_decoded_01.mp4"));

        fs::write(&second, b"").unwrap();
        let third = name_for("clip", &IDENTITY, OutputFormat::Mp4, dir.path()).unwrap();
        assert_eq!(third, dir.path().join("clip_decoded_02.mp4"));
    }

    #[test]
    fn test_preset_name_in_base() {
        let dir = tempdir().unwrap();
        let vivid = PresetRegistry::new().resolve("vivid");
        let path = name_for("clip", &vivid, OutputFormat::Webm, dir.path()).unwrap();
        assert_eq!(path, dir.path().join("clip_vivid.webm"));
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        name_for("clip", &IDENTITY, OutputFormat::Mkv, &nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn test_sanitize_stem() {
        assert_eq!(sanitize_stem(r#"a<b>c:d"e/f\g|h?i*j"#), "a_b_c_d_e_f_g_h_i_j");
        assert_eq!(sanitize_stem(&"x".repeat(150)).chars().count(), MAX_STEM_LEN);
        assert_eq!(sanitize_stem("plain name"), "plain name");
    }

    #[test]
    fn test_container_path_for() {
        let path = container_path_for(Path::new("/videos/my clip.mp4"), Path::new("out"));
        assert_eq!(path, Path::new("out").join("my clip.ooo"));
        assert_eq!(stem_of(Path::new("")), "video");
    }
}
