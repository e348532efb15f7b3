//! Polygon annotation session.

use crate::format::formats::CocoFormat;
use crate::format::{AnnotationFormat, ExportOptions, ExportResult, ExportSource, FormatError};
use crate::geometry::{self, CanvasSize, Point};
use crate::history::{UndoConfig, UndoPolicy, UndoStack};
use crate::model::{EntityId, IdSource, MIN_POLYGON_VERTICES, POLYGON_CLOSE_THRESHOLD, Polygon, UuidIds};

use super::{EditError, ImageInfo};

/// Default display-fit width of the polygon canvas.
pub const DEFAULT_POLYGON_MAX_WIDTH: f64 = 1000.0;

/// Progress of the polygon being drawn.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DraftState {
    #[default]
    Idle,
    Drawing { vertices: Vec<Point> },
}

impl DraftState {
    pub fn vertices(&self) -> &[Point] {
        match self {
            DraftState::Idle => &[],
            DraftState::Drawing { vertices } => vertices,
        }
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self, DraftState::Drawing { .. })
    }
}

/// Result of a canvas click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// A vertex was appended; `count` is the draft length.
    VertexAdded { count: usize },
    /// The click landed on the start vertex and closed the polygon.
    Closed(EntityId),
}

/// Editor state for outlining polygons on one image.
///
/// Draft vertices are never part of history: undo always removes the last
/// draft vertex first. Committed shapes are reverted according to the
/// session's [`UndoPolicy`].
#[derive(Debug)]
pub struct PolygonSession {
    image: Option<ImageInfo>,
    canvas: CanvasSize,
    max_width: f64,
    close_threshold: f64,
    shapes: Vec<Polygon>,
    draft: DraftState,
    policy: UndoPolicy,
    history: UndoStack<Vec<Polygon>>,
    ids: Box<dyn IdSource>,
}

impl Default for PolygonSession {
    fn default() -> Self {
        Self::new()
    }
}

impl PolygonSession {
    /// Create an empty session using pop-last undo.
    pub fn new() -> Self {
        Self {
            image: None,
            canvas: CanvasSize::new(0.0, 0.0),
            max_width: DEFAULT_POLYGON_MAX_WIDTH,
            close_threshold: POLYGON_CLOSE_THRESHOLD,
            shapes: Vec::new(),
            draft: DraftState::Idle,
            policy: UndoPolicy::PopLast,
            history: UndoStack::new(),
            ids: Box::new(UuidIds),
        }
    }

    pub fn with_policy(mut self, policy: UndoPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_max_width(mut self, max_width: f64) -> Self {
        self.max_width = max_width;
        self
    }

    /// Distance from the start vertex within which a click closes the draft.
    pub fn with_close_threshold(mut self, threshold: f64) -> Self {
        self.close_threshold = threshold;
        self
    }

    pub fn with_undo_config(mut self, config: UndoConfig) -> Self {
        self.history = UndoStack::with_config(config);
        self
    }

    pub fn with_id_source(mut self, ids: Box<dyn IdSource>) -> Self {
        self.ids = ids;
        self
    }

    /// Open an image, discarding all shapes, the draft and history.
    pub fn load_image(&mut self, image: ImageInfo) {
        self.canvas = CanvasSize::fit(image.width, image.height, self.max_width);
        log::info!(
            "Loaded {} on a {}x{} canvas",
            image.file_name,
            self.canvas.width,
            self.canvas.height
        );
        self.image = Some(image);
        self.shapes.clear();
        self.draft = DraftState::Idle;
        self.history.clear();
    }

    pub fn image(&self) -> Option<&ImageInfo> {
        self.image.as_ref()
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn shapes(&self) -> &[Polygon] {
        &self.shapes
    }

    pub fn draft(&self) -> &DraftState {
        &self.draft
    }

    pub fn policy(&self) -> UndoPolicy {
        self.policy
    }

    fn record(&mut self) {
        if self.policy == UndoPolicy::Snapshot {
            self.history.snapshot(&self.shapes);
        }
    }

    fn position(&self, id: &EntityId) -> Result<usize, EditError> {
        self.shapes
            .iter()
            .position(|s| &s.id == id)
            .ok_or_else(|| EditError::UnknownShape(id.clone()))
    }

    /// Whether the cursor is close enough to the draft's first vertex to
    /// close it on click.
    pub fn is_cursor_over_start(&self, cursor: Point) -> bool {
        let vertices = self.draft.vertices();
        vertices.len() >= MIN_POLYGON_VERTICES
            && geometry::within_radius(cursor, vertices[0], self.close_threshold)
    }

    /// Draft outline followed by the cursor, for the rubber-band preview.
    pub fn preview(&self, cursor: Point) -> Vec<Point> {
        let mut points = self.draft.vertices().to_vec();
        if !points.is_empty() {
            points.push(cursor);
        }
        points
    }

    /// Handle a click on the canvas.
    pub fn click(&mut self, p: Point) -> Result<ClickOutcome, EditError> {
        if self.image.is_none() {
            return Err(EditError::NoImage);
        }
        if self.is_cursor_over_start(p) {
            if let Some(id) = self.close_shape() {
                return Ok(ClickOutcome::Closed(id));
            }
        }

        let mut vertices = match std::mem::take(&mut self.draft) {
            DraftState::Drawing { vertices } => vertices,
            DraftState::Idle => Vec::new(),
        };
        vertices.push(p);
        let count = vertices.len();
        log::trace!("Polygon draft vertex {} at ({}, {})", count, p.x, p.y);
        self.draft = DraftState::Drawing { vertices };
        Ok(ClickOutcome::VertexAdded { count })
    }

    /// Close the draft into a polygon.
    ///
    /// A draft with fewer than three vertices is discarded and `None` is
    /// returned.
    pub fn close_shape(&mut self) -> Option<EntityId> {
        let DraftState::Drawing { vertices } = std::mem::take(&mut self.draft) else {
            return None;
        };
        if vertices.len() < MIN_POLYGON_VERTICES {
            log::debug!("Discarded polygon draft with {} vertices", vertices.len());
            return None;
        }

        let id = self.ids.next_id();
        let name = format!("Polygon {}", self.shapes.len() + 1);
        let polygon = Polygon::new(id.clone(), vertices, name)?;
        self.record();
        log::debug!("Closed {} with {} vertices", polygon.name, polygon.vertices.len());
        self.shapes.push(polygon);
        Some(id)
    }

    /// Drop the draft without creating a shape.
    pub fn cancel_draft(&mut self) {
        self.draft = DraftState::Idle;
    }

    pub fn rename(&mut self, id: &EntityId, name: &str) -> Result<(), EditError> {
        let index = self.position(id)?;
        self.record();
        self.shapes[index].name = name.to_string();
        Ok(())
    }

    pub fn delete(&mut self, id: &EntityId) -> Result<(), EditError> {
        let index = self.position(id)?;
        self.record();
        self.shapes.remove(index);
        Ok(())
    }

    /// Remove every shape and the draft.
    pub fn clear_all(&mut self) {
        if !self.shapes.is_empty() {
            self.record();
            self.shapes.clear();
        }
        self.draft = DraftState::Idle;
    }

    /// Revert the last change.
    ///
    /// While drawing this removes the last draft vertex. Otherwise the
    /// pop-last policy removes the newest shape and the snapshot policy
    /// restores the previous shape list.
    pub fn undo(&mut self) -> bool {
        if let DraftState::Drawing { vertices } = &mut self.draft {
            vertices.pop();
            if vertices.is_empty() {
                self.draft = DraftState::Idle;
            }
            return true;
        }
        match self.policy {
            UndoPolicy::PopLast => self.shapes.pop().is_some(),
            UndoPolicy::Snapshot => self.history.undo(&mut self.shapes),
        }
    }

    /// Re-apply an undone change. Always false under pop-last undo.
    pub fn redo(&mut self) -> bool {
        match self.policy {
            UndoPolicy::PopLast => false,
            UndoPolicy::Snapshot => self.history.redo(&mut self.shapes),
        }
    }

    /// Export the shapes as a COCO-like JSON document.
    pub fn export_coco(&self, options: &ExportOptions) -> Result<ExportResult, FormatError> {
        let image = self.image.as_ref().ok_or(FormatError::NoImage)?;
        CocoFormat.export(
            &ExportSource::new(&image.file_name, self.canvas, &self.shapes),
            options,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::formats::decode_coco;
    use crate::model::SequentialIds;

    fn session(policy: UndoPolicy) -> PolygonSession {
        let mut s = PolygonSession::new()
            .with_policy(policy)
            .with_id_source(Box::new(SequentialIds::new("poly")));
        s.load_image(ImageInfo::new("street.jpg", 2000, 1000));
        s
    }

    fn draw_triangle(s: &mut PolygonSession) -> EntityId {
        for p in [(100.0, 100.0), (200.0, 100.0), (150.0, 200.0)] {
            s.click(Point::new(p.0, p.1)).unwrap();
        }
        match s.click(Point::new(103.0, 104.0)).unwrap() {
            ClickOutcome::Closed(id) => id,
            other => panic!("expected close, got {other:?}"),
        }
    }

    #[test]
    fn test_canvas_is_fitted() {
        let s = session(UndoPolicy::PopLast);
        assert_eq!(s.canvas(), CanvasSize::new(1000.0, 500.0));
    }

    #[test]
    fn test_click_near_start_closes() {
        let mut s = session(UndoPolicy::PopLast);
        let id = draw_triangle(&mut s);
        assert_eq!(s.shapes().len(), 1);
        assert_eq!(s.shapes()[0].id, id);
        assert_eq!(s.shapes()[0].vertices.len(), 3);
        assert_eq!(s.shapes()[0].name, "Polygon 1");
        assert!(!s.draft().is_drawing());
    }

    #[test]
    fn test_click_near_start_with_two_vertices_adds_vertex() {
        let mut s = session(UndoPolicy::PopLast);
        s.click(Point::new(100.0, 100.0)).unwrap();
        s.click(Point::new(200.0, 100.0)).unwrap();
        assert!(!s.is_cursor_over_start(Point::new(101.0, 101.0)));
        assert_eq!(
            s.click(Point::new(101.0, 101.0)).unwrap(),
            ClickOutcome::VertexAdded { count: 3 }
        );
    }

    #[test]
    fn test_close_threshold_is_exclusive() {
        let mut s = session(UndoPolicy::PopLast);
        for p in [(0.0, 0.0), (50.0, 0.0), (50.0, 50.0)] {
            s.click(Point::new(p.0, p.1)).unwrap();
        }
        assert!(!s.is_cursor_over_start(Point::new(10.0, 0.0)));
        assert!(s.is_cursor_over_start(Point::new(9.0, 0.0)));
    }

    #[test]
    fn test_close_with_too_few_vertices_discards_draft() {
        let mut s = session(UndoPolicy::PopLast);
        s.click(Point::new(1.0, 1.0)).unwrap();
        s.click(Point::new(50.0, 1.0)).unwrap();
        assert_eq!(s.close_shape(), None);
        assert!(s.shapes().is_empty());
        assert!(!s.draft().is_drawing());
    }

    #[test]
    fn test_pop_last_undo() {
        let mut s = session(UndoPolicy::PopLast);
        draw_triangle(&mut s);
        s.click(Point::new(400.0, 400.0)).unwrap();
        s.click(Point::new(410.0, 400.0)).unwrap();

        assert!(s.undo());
        assert_eq!(s.draft().vertices().len(), 1);
        assert!(s.undo());
        assert!(!s.draft().is_drawing());
        assert!(s.undo());
        assert!(s.shapes().is_empty());
        assert!(!s.undo());
        assert!(!s.redo());
    }

    #[test]
    fn test_snapshot_policy_round_trip() {
        let mut s = session(UndoPolicy::Snapshot);
        let id = draw_triangle(&mut s);
        s.rename(&id, "car").unwrap();
        let renamed = s.shapes().to_vec();

        assert!(s.undo());
        assert_eq!(s.shapes()[0].name, "Polygon 1");
        assert!(s.redo());
        assert_eq!(s.shapes(), renamed.as_slice());
    }

    #[test]
    fn test_delete_and_clear_all() {
        let mut s = session(UndoPolicy::Snapshot);
        let first = draw_triangle(&mut s);
        draw_triangle(&mut s);

        s.delete(&first).unwrap();
        assert_eq!(s.shapes().len(), 1);
        assert_eq!(
            s.delete(&first),
            Err(EditError::UnknownShape(first.clone()))
        );

        s.clear_all();
        assert!(s.shapes().is_empty());
        assert!(s.undo());
        assert_eq!(s.shapes().len(), 1);
    }

    #[test]
    fn test_click_requires_image() {
        let mut s = PolygonSession::new();
        assert_eq!(s.click(Point::new(1.0, 1.0)), Err(EditError::NoImage));
    }

    #[test]
    fn test_preview_follows_cursor() {
        let mut s = session(UndoPolicy::PopLast);
        assert!(s.preview(Point::new(5.0, 5.0)).is_empty());
        s.click(Point::new(1.0, 1.0)).unwrap();
        assert_eq!(
            s.preview(Point::new(5.0, 5.0)),
            vec![Point::new(1.0, 1.0), Point::new(5.0, 5.0)]
        );
    }

    #[test]
    fn test_export_coco() {
        let mut s = session(UndoPolicy::PopLast);
        draw_triangle(&mut s);
        let result = s.export_coco(&ExportOptions::new().year(2024)).unwrap();
        assert_eq!(result.file_name, "street_coco.json");
        assert_eq!(result.annotations_exported, 1);

        let regions = decode_coco(&result.contents).unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].label, "object");
        assert_eq!(regions[0].polygon.as_ref().map(Vec::len), Some(3));
    }
}
