//! Editor sessions.
//!
//! Each session owns the full mutable state of one editor page (entities,
//! gesture state machines, undo history) and is mutated in place by the
//! caller in response to discrete input events.

mod boxes;
mod error;
mod keypoint;
mod polygon;
mod skeleton_editor;

pub use boxes::{BoxSession, DEFAULT_BOX_MAX_WIDTH, DragState};
pub use error::EditError;
pub use keypoint::{
    DEFAULT_KEYPOINT_MAX_WIDTH, ImportReport, KeypointGraph, KeypointSession, PickOutcome,
};
pub use polygon::{ClickOutcome, DEFAULT_POLYGON_MAX_WIDTH, DraftState, PolygonSession};
pub use skeleton_editor::{AUTHORING_CANVAS_SIZE, SkeletonEditor, TemplateDraft};

/// An image opened in an editor, by file name and natural pixel size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    pub file_name: String,
    pub width: u32,
    pub height: u32,
}

impl ImageInfo {
    /// Create image info.
    pub fn new(file_name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            file_name: file_name.into(),
            width,
            height,
        }
    }
}
