//! PixelSuite - image annotation core
//!
//! Editor sessions for keypoint skeletons, polygons and bounding boxes,
//! with YOLO and COCO-style codecs and a persistent skeleton template
//! library. Rendering is left to the embedding UI.

pub mod color_utils;
pub mod config;
pub mod format;
pub mod geometry;
pub mod history;
pub mod link;
pub mod model;
pub mod session;
pub mod store;

pub use config::{AppConfig, ConfigError};
pub use format::FormatError;
pub use session::{
    BoxSession, EditError, ImageInfo, KeypointSession, PolygonSession, SkeletonEditor,
};
pub use store::{SkeletonLibrary, StoreError};
