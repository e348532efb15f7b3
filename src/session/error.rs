//! Error type for editor operations.

use thiserror::Error;

use crate::model::EntityId;

/// Errors raised by editor sessions.
///
/// Every variant leaves the session unchanged.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EditError {
    #[error("No image loaded")]
    NoImage,

    #[error("Unknown keypoint: {0}")]
    UnknownKeypoint(EntityId),

    #[error("Unknown shape: {0}")]
    UnknownShape(EntityId),

    #[error("Box too small: {width}x{height}")]
    BoxTooSmall { width: f64, height: f64 },
}
