//! Error types for annotation format operations.

use thiserror::Error;

/// Errors that can occur during annotation format operations.
///
/// Malformed records inside an otherwise readable input (a short YOLO
/// line, an edge pointing at an unknown keypoint) are not errors; they are
/// skipped and reported as warnings.
#[derive(Error, Debug)]
pub enum FormatError {
    /// I/O error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid format structure or content
    #[error("Invalid format: {message}")]
    InvalidFormat {
        /// Description of the format error
        message: String,
    },

    /// Export requested before an image was loaded
    #[error("No image loaded")]
    NoImage,

    /// The session has nothing this format can write
    #[error("Nothing to export for format '{format}'")]
    NothingToExport {
        /// The format that was asked to export
        format: String,
    },
}

impl FormatError {
    /// Create an invalid format error with a message.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Create a nothing-to-export error.
    pub fn nothing_to_export(format: impl Into<String>) -> Self {
        Self::NothingToExport {
            format: format.into(),
        }
    }
}
