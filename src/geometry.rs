//! Geometry kernel for annotation shapes.
//!
//! Pure functions over canvas-pixel coordinates: polygon area, bounding
//! extents, normalization against a canvas size and the proximity tests
//! used by the drawing gestures. Point sequences are passed either as
//! `Point` slices or as flat `[x0, y0, x1, y1, ...]` arrays, the layout
//! COCO segmentations use.

use serde::{Deserialize, Serialize};

/// Number of decimal places used for normalized values in text exports.
pub const NORMALIZED_PRECISION: usize = 6;

/// A position in canvas-pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a new point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: Point) -> f64 {
        distance(*self, other)
    }
}

/// Axis-aligned extents of a point set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Width of the extents.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the extents.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Center point of the extents.
    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// COCO-style `[x, y, width, height]` array.
    pub fn to_xywh(&self) -> [f64; 4] {
        [self.min_x, self.min_y, self.width(), self.height()]
    }

    fn include(&mut self, p: Point) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }
}

/// Size of the drawing surface in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

impl CanvasSize {
    /// Create a new canvas size.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Fit an image of the given natural size into `max_width`.
    ///
    /// Images are only ever scaled down: the display scale is
    /// `min(max_width / natural_width, 1)` and the derived size is rounded
    /// to whole pixels.
    pub fn fit(natural_width: u32, natural_height: u32, max_width: f64) -> Self {
        let scale = display_scale(natural_width, max_width);
        Self {
            width: (natural_width as f64 * scale).round(),
            height: (natural_height as f64 * scale).round(),
        }
    }

    /// Clamp a point into `[0, width] x [0, height]`.
    pub fn clamp_point(&self, p: Point) -> Point {
        Point::new(
            clamp(p.x, 0.0, self.width),
            clamp(p.y, 0.0, self.height),
        )
    }

    /// Convert a pixel position into `[0, 1]` relative coordinates.
    pub fn normalize_point(&self, p: Point) -> Point {
        Point::new(normalize(p.x, self.width), normalize(p.y, self.height))
    }

    /// Convert relative coordinates back into pixels on this canvas.
    pub fn denormalize_point(&self, p: Point) -> Point {
        Point::new(denormalize(p.x, self.width), denormalize(p.y, self.height))
    }

    /// Whether both dimensions are positive.
    pub fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Scale factor applied to an image so it fits `max_width`.
pub fn display_scale(natural_width: u32, max_width: f64) -> f64 {
    if natural_width == 0 {
        return 1.0;
    }
    (max_width / natural_width as f64).min(1.0)
}

/// Area of a polygon given as a flat coordinate array (shoelace formula).
///
/// The sequence is treated as closed: the last vertex pairs with the
/// first. A trailing odd scalar is ignored. Fewer than three vertices
/// yields zero.
pub fn polygon_area(flat: &[f64]) -> f64 {
    let n = flat.len() / 2;
    if n < 3 {
        return 0.0;
    }

    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        let (x1, y1) = (flat[2 * i], flat[2 * i + 1]);
        let (x2, y2) = (flat[2 * j], flat[2 * j + 1]);
        sum += x1 * y2 - x2 * y1;
    }
    sum.abs() / 2.0
}

/// Extents of a point set, `None` when it is empty.
pub fn bounding_box_of(points: &[Point]) -> Option<Bounds> {
    let (first, rest) = points.split_first()?;
    let mut bounds = Bounds {
        min_x: first.x,
        min_y: first.y,
        max_x: first.x,
        max_y: first.y,
    };
    for p in rest {
        bounds.include(*p);
    }
    Some(bounds)
}

/// Extents of a flat coordinate array, `None` when it has no full pair.
pub fn bounding_box_of_flat(flat: &[f64]) -> Option<Bounds> {
    bounding_box_of(&unflatten(flat))
}

/// Flatten points into `[x0, y0, x1, y1, ...]`.
pub fn flatten(points: &[Point]) -> Vec<f64> {
    points.iter().flat_map(|p| [p.x, p.y]).collect()
}

/// Pair up a flat coordinate array, dropping a trailing odd scalar.
pub fn unflatten(flat: &[f64]) -> Vec<Point> {
    flat.chunks_exact(2)
        .map(|pair| Point::new(pair[0], pair[1]))
        .collect()
}

/// Express `value` as a fraction of `extent`.
pub fn normalize(value: f64, extent: f64) -> f64 {
    if extent == 0.0 {
        return 0.0;
    }
    value / extent
}

/// Inverse of [`normalize`].
pub fn denormalize(normalized: f64, extent: f64) -> f64 {
    normalized * extent
}

/// Format a normalized value with the fixed export precision.
pub fn format_normalized(value: f64) -> String {
    format!("{:.*}", NORMALIZED_PRECISION, value)
}

/// Clamp `value` into `[lo, hi]`.
pub fn clamp(value: f64, lo: f64, hi: f64) -> f64 {
    value.max(lo).min(hi)
}

/// Euclidean distance between two points.
pub fn distance(a: Point, b: Point) -> f64 {
    (b.x - a.x).hypot(b.y - a.y)
}

/// Whether `p` lies strictly within `radius` of `center`.
pub fn within_radius(p: Point, center: Point, radius: f64) -> bool {
    distance(p, center) < radius
}
