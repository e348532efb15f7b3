//! COCO-like JSON format implementation.
//!
//! Writes a single-image dataset mirroring the COCO detection layout
//! (`info`, `images`, `categories`, `annotations`), one annotation per
//! closed polygon. It is not guaranteed to satisfy the full official
//! schema.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::format::error::FormatError;
use crate::format::traits::{
    AnnotationFormat, ExportOptions, ExportResult, ExportSource, FormatWarning,
};
use crate::geometry::{self, Bounds, Point};
use crate::model::Polygon;

/// The single category every exported polygon belongs to.
pub const DEFAULT_CATEGORY_NAME: &str = "object";

/// COCO JSON format.
///
/// Supports:
/// - Polygons (segmentation, area, bbox)
///
/// Does not support:
/// - Multiple images or categories (everything is image 1, category 1)
/// - Polygon names and colors
pub struct CocoFormat;

impl AnnotationFormat for CocoFormat {
    type Item = Polygon;

    fn id(&self) -> &'static str {
        "coco"
    }

    fn display_name(&self) -> &'static str {
        "COCO (JSON)"
    }

    fn extension(&self) -> &'static str {
        "json"
    }

    fn file_suffix(&self) -> &'static str {
        "_coco"
    }

    fn export(
        &self,
        source: &ExportSource<'_, Polygon>,
        options: &ExportOptions,
    ) -> Result<ExportResult, FormatError> {
        let mut result = ExportResult::new(self.file_name(source.image_name), String::new());

        let mut coco = CocoDataset::new(options);
        coco.images.push(CocoImage {
            id: 1,
            file_name: source.image_name.to_string(),
            width: source.canvas.width.round() as u32,
            height: source.canvas.height.round() as u32,
        });
        coco.categories.push(CocoCategory {
            id: 1,
            name: DEFAULT_CATEGORY_NAME.to_string(),
        });

        for polygon in source.items {
            match convert_polygon(polygon, coco.annotations.len() as u64 + 1) {
                Some(ann) => coco.annotations.push(ann),
                None => result.add_warning(FormatWarning::warning(format!(
                    "Skipped polygon '{}' with fewer than three vertices",
                    polygon.name
                ))),
            }
        }

        result.annotations_exported = coco.annotations.len();
        result.contents = serde_json::to_string_pretty(&coco)?;

        log::info!(
            "Exported {} polygons to {} ({} warnings)",
            result.annotations_exported,
            result.file_name,
            result.warnings.len()
        );
        Ok(result)
    }
}

/// Build the COCO annotation for one polygon.
fn convert_polygon(polygon: &Polygon, id: u64) -> Option<CocoAnnotation> {
    let bounds = polygon.bounds()?;
    if polygon.vertices.len() < crate::model::MIN_POLYGON_VERTICES {
        return None;
    }
    let segmentation = polygon.closed_flat();
    Some(CocoAnnotation {
        id,
        image_id: 1,
        category_id: 1,
        area: geometry::polygon_area(&segmentation),
        segmentation: vec![segmentation],
        bbox: Some(bounds.to_xywh()),
        iscrowd: 0,
    })
}

/// A region read back from a COCO file.
#[derive(Debug, Clone, PartialEq)]
pub struct CocoRegion {
    /// Category name, or `class_<id>` for unknown categories.
    pub label: String,
    /// Outline from the first segmentation, without the closing vertex.
    pub polygon: Option<Vec<Point>>,
    /// Bounding box, from `bbox` or derived from the outline.
    pub bbox: Option<Bounds>,
}

/// Read every annotation of a COCO file into displayable regions.
///
/// Annotations with neither a usable segmentation nor a bbox are skipped.
pub fn decode_coco(json: &str) -> Result<Vec<CocoRegion>, FormatError> {
    let coco: CocoDataset = serde_json::from_str(json)?;

    let names: HashMap<u32, &str> = coco
        .categories
        .iter()
        .map(|c| (c.id, c.name.as_str()))
        .collect();

    let mut regions = Vec::new();
    for ann in &coco.annotations {
        let polygon = ann
            .segmentation
            .first()
            .filter(|seg| seg.len() >= 4)
            .map(|seg| open_outline(seg));

        let bbox = match ann.bbox {
            Some([x, y, w, h]) => Some(Bounds {
                min_x: x,
                min_y: y,
                max_x: x + w,
                max_y: y + h,
            }),
            None => polygon.as_deref().and_then(geometry::bounding_box_of),
        };

        if polygon.is_none() && bbox.is_none() {
            log::warn!("Skipping COCO annotation {} without geometry", ann.id);
            continue;
        }

        let label = names
            .get(&ann.category_id)
            .map(|name| name.to_string())
            .unwrap_or_else(|| format!("class_{}", ann.category_id));
        regions.push(CocoRegion {
            label,
            polygon,
            bbox,
        });
    }

    log::info!("Decoded {} COCO annotations", regions.len());
    Ok(regions)
}

/// Vertices of a flat segmentation with a repeated closing vertex removed.
fn open_outline(flat: &[f64]) -> Vec<Point> {
    let mut points = geometry::unflatten(flat);
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points
}

// COCO format structures

/// Top-level COCO document.
#[derive(Debug, Serialize, Deserialize)]
pub struct CocoDataset {
    #[serde(default)]
    pub info: CocoInfo,
    #[serde(default)]
    pub licenses: Vec<serde_json::Value>,
    #[serde(default)]
    pub images: Vec<CocoImage>,
    #[serde(default)]
    pub categories: Vec<CocoCategory>,
    #[serde(default)]
    pub annotations: Vec<CocoAnnotation>,
}

impl CocoDataset {
    fn new(options: &ExportOptions) -> Self {
        Self {
            info: CocoInfo {
                year: options.year,
                version: options.version.clone(),
                description: options.description.clone(),
            },
            licenses: Vec::new(),
            images: Vec::new(),
            categories: Vec::new(),
            annotations: Vec::new(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CocoInfo {
    #[serde(default)]
    pub year: i32,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CocoImage {
    pub id: u64,
    pub width: u32,
    pub height: u32,
    pub file_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CocoCategory {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CocoAnnotation {
    pub id: u64,
    pub image_id: u64,
    pub category_id: u32,
    #[serde(default)]
    pub segmentation: Vec<Vec<f64>>,
    #[serde(default)]
    pub area: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<[f64; 4]>,
    #[serde(default)]
    pub iscrowd: u8,
}
