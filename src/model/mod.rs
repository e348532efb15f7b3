//! Annotation entities: keypoints, connections, shapes and skeleton templates.

mod connection;
mod id;
mod keypoint;
mod shape;
mod skeleton;

pub use connection::{AddOutcome, Connection, ConnectionSet};
pub use id::{EntityId, IdSource, SequentialIds, UuidIds};
pub use keypoint::{Keypoint, Visibility, keypoint_label};
pub use shape::{
    BoundingBox, DEFAULT_POLYGON_COLOR, MIN_BBOX_SIZE, MIN_POLYGON_VERTICES,
    POLYGON_CLOSE_THRESHOLD, Polygon,
};
pub use skeleton::{SkeletonTemplate, TemplateKeypoint};
