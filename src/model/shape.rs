//! Polygon and bounding-box shapes.

use serde::{Deserialize, Serialize};

use super::EntityId;
use crate::geometry::{self, Bounds, Point};

/// Minimum width/height for a bounding box, in canvas pixels.
pub const MIN_BBOX_SIZE: f64 = 5.0;

/// Minimum number of vertices required for a valid polygon.
pub const MIN_POLYGON_VERTICES: usize = 3;

/// Distance threshold for closing a polygon by clicking near the first vertex.
pub const POLYGON_CLOSE_THRESHOLD: f64 = 10.0;

/// Display color for newly closed polygons.
pub const DEFAULT_POLYGON_COLOR: &str = "#00FF00";

/// A closed polygon.
///
/// Vertices are stored without repeating the first one; the closing
/// vertex is added when the polygon is exported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub id: EntityId,
    pub vertices: Vec<Point>,
    pub name: String,
    pub color: String,
}

impl Polygon {
    /// Create a polygon, `None` if it has fewer than three vertices.
    pub fn new(id: EntityId, vertices: Vec<Point>, name: impl Into<String>) -> Option<Self> {
        if vertices.len() < MIN_POLYGON_VERTICES {
            return None;
        }
        Some(Self {
            id,
            vertices,
            name: name.into(),
            color: DEFAULT_POLYGON_COLOR.to_string(),
        })
    }

    /// Flat coordinates with the first vertex repeated at the end.
    pub fn closed_flat(&self) -> Vec<f64> {
        let mut flat = geometry::flatten(&self.vertices);
        if let Some(first) = self.vertices.first() {
            flat.push(first.x);
            flat.push(first.y);
        }
        flat
    }

    /// Enclosed area.
    pub fn area(&self) -> f64 {
        geometry::polygon_area(&geometry::flatten(&self.vertices))
    }

    /// Extents of the vertices.
    pub fn bounds(&self) -> Option<Bounds> {
        geometry::bounding_box_of(&self.vertices)
    }
}

/// An axis-aligned box given by its top-left corner and extent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub id: EntityId,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub name: String,
    pub color: String,
}

impl BoundingBox {
    /// Build a box from two drag corners.
    ///
    /// The corners may be given in any order. Returns `None` unless both
    /// extents exceed [`MIN_BBOX_SIZE`].
    pub fn from_corners(
        id: EntityId,
        start: Point,
        end: Point,
        name: impl Into<String>,
        color: impl Into<String>,
    ) -> Option<Self> {
        Self::from_corners_min(id, start, end, MIN_BBOX_SIZE, name, color)
    }

    /// Like [`BoundingBox::from_corners`] with a custom minimum extent.
    pub fn from_corners_min(
        id: EntityId,
        start: Point,
        end: Point,
        min_size: f64,
        name: impl Into<String>,
        color: impl Into<String>,
    ) -> Option<Self> {
        let w = (end.x - start.x).abs();
        let h = (end.y - start.y).abs();
        if w <= min_size || h <= min_size {
            return None;
        }
        Some(Self {
            id,
            x: start.x.min(end.x),
            y: start.y.min(end.y),
            w,
            h,
            name: name.into(),
            color: color.into(),
        })
    }

    /// Whether `(w, h)` satisfies the minimum box size.
    pub fn is_valid_size(w: f64, h: f64) -> bool {
        w >= MIN_BBOX_SIZE && h >= MIN_BBOX_SIZE
    }

    /// Check if a point is inside this box.
    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.w && p.y >= self.y && p.y <= self.y + self.h
    }

    /// Extents as bounds.
    pub fn bounds(&self) -> Bounds {
        Bounds {
            min_x: self.x,
            min_y: self.y,
            max_x: self.x + self.w,
            max_y: self.y + self.h,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polygon_needs_three_vertices() {
        let two = vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)];
        assert!(Polygon::new(EntityId::new("p"), two, "p").is_none());
    }

    #[test]
    fn test_polygon_closed_flat_repeats_first_vertex() {
        let poly = Polygon::new(
            EntityId::new("p"),
            vec![
                Point::new(0.0, 0.0),
                Point::new(4.0, 0.0),
                Point::new(0.0, 3.0),
            ],
            "tri",
        )
        .unwrap();
        assert_eq!(
            poly.closed_flat(),
            vec![0.0, 0.0, 4.0, 0.0, 0.0, 3.0, 0.0, 0.0]
        );
        assert_eq!(poly.area(), 6.0);
        assert_eq!(poly.color, DEFAULT_POLYGON_COLOR);
    }

    #[test]
    fn test_box_minimum_size() {
        let id = EntityId::new("b");
        let tiny = BoundingBox::from_corners(
            id.clone(),
            Point::new(10.0, 10.0),
            Point::new(12.0, 11.0),
            "Box 1",
            "#fff",
        );
        assert!(tiny.is_none());

        let ok = BoundingBox::from_corners(
            id,
            Point::new(10.0, 10.0),
            Point::new(20.0, 30.0),
            "Box 1",
            "#fff",
        )
        .unwrap();
        assert_eq!((ok.x, ok.y, ok.w, ok.h), (10.0, 10.0, 10.0, 20.0));
    }

    #[test]
    fn test_box_from_reversed_corners() {
        let b = BoundingBox::from_corners(
            EntityId::new("b"),
            Point::new(50.0, 40.0),
            Point::new(20.0, 10.0),
            "Box 1",
            "#fff",
        )
        .unwrap();
        assert_eq!((b.x, b.y, b.w, b.h), (20.0, 10.0, 30.0, 30.0));
        assert!(b.contains_point(Point::new(25.0, 15.0)));
        assert!(!b.contains_point(Point::new(55.0, 15.0)));
    }

    #[test]
    fn test_exactly_min_size_drag_is_rejected() {
        let b = BoundingBox::from_corners(
            EntityId::new("b"),
            Point::new(0.0, 0.0),
            Point::new(5.0, 50.0),
            "Box 1",
            "#fff",
        );
        assert!(b.is_none());
        assert!(BoundingBox::is_valid_size(5.0, 5.0));
        assert!(!BoundingBox::is_valid_size(4.9, 50.0));
    }
}
