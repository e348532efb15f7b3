//! Trait definitions for annotation format implementations.

use std::path::Path;

use chrono::Datelike;

use crate::format::error::FormatError;
use crate::geometry::CanvasSize;

/// Trait for annotation export formats.
///
/// Each format (YOLO keypoints, COCO-like JSON, simple box JSON) turns one
/// image's worth of annotations into a single downloadable file.
pub trait AnnotationFormat {
    /// The annotation entity this format writes.
    type Item;

    /// Unique identifier for this format (e.g., "yolo", "coco").
    fn id(&self) -> &'static str;

    /// Human-readable name for UI display.
    fn display_name(&self) -> &'static str;

    /// File extension of the exported file, without the dot.
    fn extension(&self) -> &'static str;

    /// Text inserted between the image base name and the extension.
    fn file_suffix(&self) -> &'static str {
        ""
    }

    /// Output file name for an image called `image_name`.
    fn file_name(&self, image_name: &str) -> String {
        format!(
            "{}{}.{}",
            base_name(image_name),
            self.file_suffix(),
            self.extension()
        )
    }

    /// Encode the annotations of one image.
    fn export(
        &self,
        source: &ExportSource<'_, Self::Item>,
        options: &ExportOptions,
    ) -> Result<ExportResult, FormatError>;
}

/// One image's annotations, as handed to a format.
#[derive(Debug, Clone, Copy)]
pub struct ExportSource<'a, T> {
    /// Name of the uploaded image file.
    pub image_name: &'a str,
    /// Canvas the annotations were drawn on.
    pub canvas: CanvasSize,
    /// The annotations.
    pub items: &'a [T],
}

impl<'a, T> ExportSource<'a, T> {
    /// Create a new export source.
    pub fn new(image_name: &'a str, canvas: CanvasSize, items: &'a [T]) -> Self {
        Self {
            image_name,
            canvas,
            items,
        }
    }
}

/// Options for export operations.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Year written into COCO `info`.
    pub year: i32,

    /// Dataset version written into COCO `info`.
    pub version: String,

    /// Free-form description written into COCO `info`.
    pub description: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            year: chrono::Local::now().year(),
            version: "1.0".to_string(),
            description: "Exported from PixelSuite".to_string(),
        }
    }
}

impl ExportOptions {
    /// Create new export options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the year.
    pub fn year(mut self, year: i32) -> Self {
        self.year = year;
        self
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Result of an export operation.
#[derive(Debug, Default)]
pub struct ExportResult {
    /// Suggested download name.
    pub file_name: String,

    /// Encoded file contents.
    pub contents: String,

    /// Number of annotations exported.
    pub annotations_exported: usize,

    /// Warnings generated during export (e.g., skipped shapes).
    pub warnings: Vec<FormatWarning>,
}

impl ExportResult {
    /// Create a new export result.
    pub fn new(file_name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            contents: contents.into(),
            ..Default::default()
        }
    }

    /// Add a warning to the result.
    pub fn add_warning(&mut self, warning: FormatWarning) {
        self.warnings.push(warning);
    }

    /// Check if there were any warnings.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Warning generated during format conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatWarning {
    /// 1-based input line this warning relates to (if applicable).
    pub line: Option<usize>,

    /// Human-readable warning message.
    pub message: String,

    /// Severity level of the warning.
    pub severity: WarningSeverity,
}

impl FormatWarning {
    /// Create a new warning.
    pub fn new(message: impl Into<String>, severity: WarningSeverity) -> Self {
        Self {
            line: None,
            message: message.into(),
            severity,
        }
    }

    /// Create an info-level warning.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, WarningSeverity::Info)
    }

    /// Create a warning-level warning.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, WarningSeverity::Warning)
    }

    /// Set the input line this warning relates to.
    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

/// Severity level for format warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningSeverity {
    /// Informational message, not a problem.
    Info,
    /// Warning that something was skipped or modified.
    Warning,
}

/// File name with its last extension stripped.
///
/// `photo.jpg -> photo`, `scan.v2.png -> scan.v2`, `README -> README`.
pub fn base_name(file_name: &str) -> &str {
    let name = Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(file_name);
    match name.rfind('.') {
        Some(0) | None => name,
        Some(idx) => &name[..idx],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("photo.jpg"), "photo");
        assert_eq!(base_name("scan.v2.png"), "scan.v2");
        assert_eq!(base_name("README"), "README");
        assert_eq!(base_name(".hidden"), ".hidden");
        assert_eq!(base_name("dir/shot.jpeg"), "shot");
    }

    #[test]
    fn test_export_options_builder() {
        let options = ExportOptions::new().year(2024).description("test");
        assert_eq!(options.year, 2024);
        assert_eq!(options.version, "1.0");
        assert_eq!(options.description, "test");
    }

    #[test]
    fn test_warning_builder() {
        let w = FormatWarning::warning("short line").with_line(3);
        assert_eq!(w.line, Some(3));
        assert_eq!(w.severity, WarningSeverity::Warning);
    }
}
