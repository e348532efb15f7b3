//! YOLO TXT format implementation.
//!
//! One object per line, every spatial value normalized to `[0, 1]` by the
//! canvas size:
//!
//! ```text
//! <class> <cx> <cy> <w> <h> [<x> <y> <v>]...     keypoint (pose) records
//! <class> <x> <y> [<x> <y>]...                   segmentation records
//! ```
//!
//! Decoding denormalizes against the canvas given at decode time, which
//! may differ from the one the file was written on.

use crate::format::error::FormatError;
use crate::format::traits::{
    AnnotationFormat, ExportOptions, ExportResult, ExportSource, FormatWarning,
};
use crate::geometry::{self, Bounds, CanvasSize, Point, format_normalized};
use crate::model::{Keypoint, Visibility};

/// Class index written for keypoint records.
pub const KEYPOINT_CLASS_INDEX: u32 = 0;

/// Number of leading fields in a keypoint record (class + box).
const KEYPOINT_HEADER_FIELDS: usize = 5;

/// Minimum number of fields in a segmentation record.
const SEGMENTATION_MIN_FIELDS: usize = 3;

/// YOLO pose format: one line holding a keypoint set and its bounding box.
///
/// Supports:
/// - Keypoints with visibility flags, ordered by name
/// - The enclosing box of the keypoints
///
/// Does not support:
/// - Keypoint names or connections (topology is not stored)
/// - Multiple classes (the class index is always 0)
pub struct YoloKeypointFormat;

impl AnnotationFormat for YoloKeypointFormat {
    type Item = Keypoint;

    fn id(&self) -> &'static str {
        "yolo"
    }

    fn display_name(&self) -> &'static str {
        "YOLO Keypoints (TXT)"
    }

    fn extension(&self) -> &'static str {
        "txt"
    }

    fn export(
        &self,
        source: &ExportSource<'_, Keypoint>,
        _options: &ExportOptions,
    ) -> Result<ExportResult, FormatError> {
        if !source.canvas.is_valid() {
            return Err(FormatError::invalid_format(format!(
                "canvas size {}x{} cannot normalize coordinates",
                source.canvas.width, source.canvas.height
            )));
        }

        let line = encode_keypoint_line(source.items, source.canvas)
            .ok_or_else(|| FormatError::nothing_to_export(self.id()))?;

        let mut result = ExportResult::new(self.file_name(source.image_name), line);
        result.annotations_exported = 1;

        log::info!(
            "Exported {} keypoints to {}",
            source.items.len(),
            result.file_name
        );
        Ok(result)
    }
}

/// Encode a keypoint set as a single YOLO pose line.
///
/// Keypoints are written in name order. Returns `None` when there are no
/// keypoints.
pub fn encode_keypoint_line(keypoints: &[Keypoint], canvas: CanvasSize) -> Option<String> {
    let mut ordered: Vec<&Keypoint> = keypoints.iter().collect();
    ordered.sort_by(|a, b| a.name.cmp(&b.name));

    let positions: Vec<Point> = ordered.iter().map(|kp| kp.position()).collect();
    let bounds = geometry::bounding_box_of(&positions)?;
    let center = bounds.center();

    let nx = |v: f64| format_normalized(geometry::normalize(v, canvas.width));
    let ny = |v: f64| format_normalized(geometry::normalize(v, canvas.height));

    let mut parts = vec![
        KEYPOINT_CLASS_INDEX.to_string(),
        nx(center.x),
        ny(center.y),
        nx(bounds.width()),
        ny(bounds.height()),
    ];
    for kp in &ordered {
        parts.push(nx(kp.x));
        parts.push(ny(kp.y));
        parts.push(kp.visibility.code().to_string());
    }
    Some(parts.join(" "))
}

/// Bounding box of a decoded record, in canvas pixels (center + extent).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YoloBox {
    pub cx: f64,
    pub cy: f64,
    pub width: f64,
    pub height: f64,
}

impl YoloBox {
    /// Top-left corner.
    pub fn top_left(&self) -> Point {
        Point::new(self.cx - self.width / 2.0, self.cy - self.height / 2.0)
    }

    /// Extents as bounds.
    pub fn bounds(&self) -> Bounds {
        let tl = self.top_left();
        Bounds {
            min_x: tl.x,
            min_y: tl.y,
            max_x: tl.x + self.width,
            max_y: tl.y + self.height,
        }
    }
}

/// A decoded keypoint, in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YoloKeypoint {
    pub x: f64,
    pub y: f64,
    pub visibility: Visibility,
}

/// One decoded pose record.
#[derive(Debug, Clone, PartialEq)]
pub struct YoloObject {
    /// Class field as written. Producers may emit non-integral classes.
    pub class_id: f64,
    pub bbox: YoloBox,
    pub keypoints: Vec<YoloKeypoint>,
}

/// One decoded segmentation record.
#[derive(Debug, Clone, PartialEq)]
pub struct YoloSegment {
    pub class_id: f64,
    /// Display label, `class_<id>`.
    pub label: String,
    pub polygon: Vec<Point>,
    pub bounds: Bounds,
}

/// Records decoded from a YOLO file plus what was skipped on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct YoloImport<T> {
    pub objects: Vec<T>,
    pub warnings: Vec<FormatWarning>,
}

impl<T> YoloImport<T> {
    /// Whether no record could be decoded.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// Decode one pose line against `canvas`.
///
/// Needs at least five numeric fields. Fields after the box are read in
/// `(x, y, v)` triples; an incomplete trailing triple is dropped.
pub fn decode_keypoint_line(line: &str, canvas: CanvasSize) -> Option<YoloObject> {
    decode_keypoint_record(line, canvas).map(|(object, _)| object)
}

/// Decode every pose line of a file. Malformed lines are skipped.
pub fn decode_keypoints(text: &str, canvas: CanvasSize) -> YoloImport<YoloObject> {
    let mut objects = Vec::new();
    let mut warnings = Vec::new();

    for (idx, line) in non_empty_lines(text) {
        match decode_keypoint_record(line, canvas) {
            Some((object, bad_codes)) => {
                if bad_codes > 0 {
                    warnings.push(
                        FormatWarning::warning(format!(
                            "{} keypoint(s) with unknown visibility treated as visible",
                            bad_codes
                        ))
                        .with_line(idx + 1),
                    );
                }
                objects.push(object);
            }
            None => {
                log::warn!("Skipping malformed YOLO keypoint line {}", idx + 1);
                warnings.push(
                    FormatWarning::warning("Skipped line without five numeric fields")
                        .with_line(idx + 1),
                );
            }
        }
    }

    log::info!(
        "Decoded {} YOLO keypoint records ({} warnings)",
        objects.len(),
        warnings.len()
    );
    YoloImport { objects, warnings }
}

/// Decode one segmentation line (`class x y x y ...`) against `canvas`.
pub fn decode_segmentation_line(line: &str, canvas: CanvasSize) -> Option<YoloSegment> {
    let fields = parse_fields(line)?;
    if fields.len() < SEGMENTATION_MIN_FIELDS {
        return None;
    }
    let class_id = fields[0];

    let polygon: Vec<Point> = geometry::unflatten(&fields[1..])
        .into_iter()
        .map(|p| canvas.denormalize_point(p))
        .collect();
    let bounds = geometry::bounding_box_of(&polygon)?;

    Some(YoloSegment {
        class_id,
        label: format!("class_{}", class_id),
        polygon,
        bounds,
    })
}

/// Decode every segmentation line of a file. Malformed lines are skipped.
pub fn decode_segmentation(text: &str, canvas: CanvasSize) -> YoloImport<YoloSegment> {
    let mut objects = Vec::new();
    let mut warnings = Vec::new();

    for (idx, line) in non_empty_lines(text) {
        match decode_segmentation_line(line, canvas) {
            Some(segment) => objects.push(segment),
            None => {
                log::warn!("Skipping malformed YOLO segmentation line {}", idx + 1);
                warnings.push(
                    FormatWarning::warning("Skipped line without three numeric fields")
                        .with_line(idx + 1),
                );
            }
        }
    }

    log::info!("Decoded {} YOLO segmentation records", objects.len());
    YoloImport { objects, warnings }
}

/// Decode a pose record, also counting triples whose visibility code was
/// not 0, 1 or 2.
fn decode_keypoint_record(line: &str, canvas: CanvasSize) -> Option<(YoloObject, usize)> {
    let fields = parse_fields(line)?;
    if fields.len() < KEYPOINT_HEADER_FIELDS {
        return None;
    }
    let class_id = fields[0];

    let bbox = YoloBox {
        cx: geometry::denormalize(fields[1], canvas.width),
        cy: geometry::denormalize(fields[2], canvas.height),
        width: geometry::denormalize(fields[3], canvas.width),
        height: geometry::denormalize(fields[4], canvas.height),
    };

    let mut bad_codes = 0;
    let keypoints: Vec<YoloKeypoint> = fields[KEYPOINT_HEADER_FIELDS..]
        .chunks_exact(3)
        .map(|triple| {
            let visibility = Visibility::from_code(triple[2]).unwrap_or_else(|| {
                bad_codes += 1;
                Visibility::Visible
            });
            YoloKeypoint {
                x: geometry::denormalize(triple[0], canvas.width),
                y: geometry::denormalize(triple[1], canvas.height),
                visibility,
            }
        })
        .collect();

    Some((
        YoloObject {
            class_id,
            bbox,
            keypoints,
        },
        bad_codes,
    ))
}

/// Parse all whitespace-separated fields as finite numbers.
fn parse_fields(line: &str) -> Option<Vec<f64>> {
    line.split_whitespace()
        .map(|field| field.parse::<f64>().ok().filter(|v| v.is_finite()))
        .collect()
}

fn non_empty_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .map(str::trim)
        .enumerate()
        .filter(|(_, line)| !line.is_empty())
}
