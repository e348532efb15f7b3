//! Annotation export/import codecs.
//!
//! Each export format implements [`AnnotationFormat`] over one entity
//! type and produces a single named file for one image. Decoders are plain
//! functions: they skip malformed records and report them as warnings
//! rather than failing the whole import.
//!
//! ## Supported Formats
//!
//! - **YOLO TXT**: keypoint (pose) lines, plus segmentation lines on import
//! - **YOLO meta JSON**: keypoint names and skeleton index pairs for pose lines
//! - **COCO JSON**: polygon segmentations with area and bbox
//! - **Box JSON**: the box editor's label/x/y/w/h list
//!
//! Skeleton templates are materialized onto a canvas by [`instantiate`].

mod error;
pub mod formats;
mod skeleton;
mod traits;

pub use error::FormatError;
pub use skeleton::{Instantiated, instantiate};
pub use traits::{
    AnnotationFormat, ExportOptions, ExportResult, ExportSource, FormatWarning, WarningSeverity,
    base_name,
};
