//! Annotation format implementations.

mod box_json;
mod coco;
mod yolo;
mod yolo_meta;

#[cfg(test)]
mod tests;

pub use box_json::{BoxDocument, BoxJsonFormat, BoxRecord, decode_boxes};
pub use coco::{
    CocoAnnotation, CocoCategory, CocoDataset, CocoFormat, CocoImage, CocoInfo, CocoRegion,
    DEFAULT_CATEGORY_NAME, decode_coco,
};
pub use yolo::{
    KEYPOINT_CLASS_INDEX, YoloBox, YoloImport, YoloKeypoint, YoloKeypointFormat, YoloObject,
    YoloSegment, decode_keypoint_line, decode_keypoints, decode_segmentation,
    decode_segmentation_line, encode_keypoint_line,
};
pub use yolo_meta::{LabeledPose, YoloMeta, apply_meta, decode_meta};
