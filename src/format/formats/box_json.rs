//! Simple bounding-box JSON format.
//!
//! ```json
//! { "image": "photo.jpg", "boxes": [{ "label": "Box 1", "x": 10, "y": 10, "w": 40, "h": 20 }] }
//! ```

use serde::{Deserialize, Serialize};

use crate::format::error::FormatError;
use crate::format::traits::{AnnotationFormat, ExportOptions, ExportResult, ExportSource};
use crate::model::BoundingBox;

/// Box list keyed by label, the box editor's native export.
pub struct BoxJsonFormat;

impl AnnotationFormat for BoxJsonFormat {
    type Item = BoundingBox;

    fn id(&self) -> &'static str {
        "bbox-json"
    }

    fn display_name(&self) -> &'static str {
        "Bounding boxes (JSON)"
    }

    fn extension(&self) -> &'static str {
        "json"
    }

    fn file_suffix(&self) -> &'static str {
        "_bbox"
    }

    fn export(
        &self,
        source: &ExportSource<'_, BoundingBox>,
        _options: &ExportOptions,
    ) -> Result<ExportResult, FormatError> {
        if source.items.is_empty() {
            return Err(FormatError::nothing_to_export(self.id()));
        }

        let doc = BoxDocument {
            image: source.image_name.to_string(),
            boxes: source.items.iter().map(BoxRecord::from).collect(),
        };

        let mut result = ExportResult::new(
            self.file_name(source.image_name),
            serde_json::to_string_pretty(&doc)?,
        );
        result.annotations_exported = doc.boxes.len();

        log::info!(
            "Exported {} boxes to {}",
            result.annotations_exported,
            result.file_name
        );
        Ok(result)
    }
}

/// Parse a box document.
pub fn decode_boxes(json: &str) -> Result<BoxDocument, FormatError> {
    Ok(serde_json::from_str(json)?)
}

/// Document written by [`BoxJsonFormat`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxDocument {
    pub image: String,
    pub boxes: Vec<BoxRecord>,
}

/// One exported box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxRecord {
    pub label: String,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl From<&BoundingBox> for BoxRecord {
    fn from(b: &BoundingBox) -> Self {
        Self {
            label: b.name.clone(),
            x: b.x,
            y: b.y,
            w: b.w,
            h: b.h,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{CanvasSize, Point};
    use crate::model::EntityId;

    #[test]
    fn test_export_boxes() {
        let boxes = vec![
            BoundingBox::from_corners(
                EntityId::new("b1"),
                Point::new(10.0, 10.0),
                Point::new(50.0, 30.0),
                "cat",
                "#ff0000",
            )
            .unwrap(),
        ];
        let source = ExportSource::new("pets.png", CanvasSize::new(100.0, 100.0), &boxes);
        let result = BoxJsonFormat.export(&source, &ExportOptions::new()).unwrap();

        assert_eq!(result.file_name, "pets_bbox.json");
        assert_eq!(result.annotations_exported, 1);

        let doc = decode_boxes(&result.contents).unwrap();
        assert_eq!(doc.image, "pets.png");
        assert_eq!(
            doc.boxes[0],
            BoxRecord {
                label: "cat".into(),
                x: 10.0,
                y: 10.0,
                w: 40.0,
                h: 20.0
            }
        );
    }

    #[test]
    fn test_export_without_boxes_fails() {
        let source = ExportSource::new("pets.png", CanvasSize::new(100.0, 100.0), &[]);
        let err = BoxJsonFormat
            .export(&source, &ExportOptions::new())
            .unwrap_err();
        assert!(matches!(err, FormatError::NothingToExport { .. }));
    }
}
