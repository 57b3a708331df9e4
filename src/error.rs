use thiserror::Error;

/// Main error type for the ooo codec library
#[derive(Error, Debug)]
pub enum OooError {
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("Container format error: {0}")]
    Format(#[from] FormatError),

    #[error("Enhancement error: {0}")]
    Enhance(#[from] EnhanceError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while acquiring frames from the source video
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Cannot open video: {path} ({reason})")]
    OpenFailed { path: String, reason: String },

    #[error("Unsupported video format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("Failed to read frame {index}: {reason}")]
    ReadFailed { index: u64, reason: String },

    #[error("No frames could be extracted from {path}")]
    NoFrames { path: String },
}

/// Per-frame still-image errors
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Frame {index} payload is not valid base64: {reason}")]
    InvalidPayload { index: usize, reason: String },

    #[error("Frame {index} could not be decoded: {reason}")]
    DecodeFailed { index: usize, reason: String },

    #[error("Frame could not be encoded: {reason}")]
    EncodeFailed { reason: String },
}

/// Container loading and validation errors
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("File does not exist: {path}")]
    NotFound { path: String },

    #[error("File must have .ooo extension: {path}")]
    WrongExtension { path: String },

    #[error("File is not valid JSON: {reason}")]
    Malformed { reason: String },

    #[error("File is not an .ooo container: top level must be an object")]
    NotAContainer,

    #[error("Invalid .ooo file structure: missing '{block}' block")]
    MissingBlock { block: &'static str },

    #[error("Invalid .ooo file structure: missing field '{field}'")]
    MissingField { field: &'static str },

    #[error("Invalid .ooo file structure: field '{field}' has the wrong type ({reason})")]
    InvalidField { field: &'static str, reason: String },

    #[error("Unknown container format tag: {tag}")]
    UnknownFormatTag { tag: String },
}

/// Enhancement operator failures, always recovered per stage
#[derive(Error, Debug)]
pub enum EnhanceError {
    #[error("{operator}: frame has no pixels")]
    EmptyFrame { operator: &'static str },

    #[error("{operator}: parameter {parameter} is not finite")]
    NonFiniteParameter {
        operator: &'static str,
        parameter: &'static str,
    },

    #[error("{operator}: {reason}")]
    Failed {
        operator: &'static str,
        reason: String,
    },
}

/// Errors writing the container file or the output video
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write {path}: {reason}")]
    WriteFailed { path: String, reason: String },

    #[error("Cannot open output video {path}: {reason}")]
    OpenFailed { path: String, reason: String },

    #[error("Unsupported output format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Video encoding failed: {reason}")]
    EncodingFailed { reason: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path} ({reason})")]
    ParseFailed { path: String, reason: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using OooError
pub type Result<T> = std::result::Result<T, OooError>;

impl OooError {
    /// Whether the error only affects a single frame or stage.
    ///
    /// Frame and enhancement errors are contained by the pipelines; everything
    /// else aborts the current encode or decode.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Frame(_) | Self::Enhance(_))
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Source(SourceError::OpenFailed { path, .. }) => {
                format!("Could not open video '{}'. Please check the file exists and is a supported format.", path)
            }
            Self::Source(SourceError::UnsupportedFormat { extension }) => {
                format!("Unsupported video format '{}'. Supported formats: mp4, avi, mov, mkv, webm", extension)
            }
            Self::Format(FormatError::NotFound { path }) => {
                format!("Container file '{}' not found.", path)
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            Self::Output(OutputError::UnsupportedFormat { format }) => {
                format!("Cannot write '{}' videos. Supported formats: mp4, avi, mov, mkv, webm", format)
            }
            Self::Format(e) => e.to_string(),
            _ => self.to_string(),
        }
    }
}
