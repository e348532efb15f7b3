//! Bounding-box annotation session.

use crate::color_utils::distinct_color;
use crate::format::formats::BoxJsonFormat;
use crate::format::{AnnotationFormat, ExportOptions, ExportResult, ExportSource, FormatError};
use crate::geometry::{self, Bounds, CanvasSize, Point};
use crate::history::{UndoConfig, UndoStack};
use crate::model::{BoundingBox, EntityId, IdSource, MIN_BBOX_SIZE, UuidIds};

use super::{EditError, ImageInfo};

/// Default display-fit width of the box canvas.
pub const DEFAULT_BOX_MAX_WIDTH: f64 = 900.0;

/// Progress of the box being dragged out.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Drawing { start: Point, current: Point },
}

/// Editor state for drawing boxes on one image.
#[derive(Debug)]
pub struct BoxSession {
    image: Option<ImageInfo>,
    canvas: CanvasSize,
    max_width: f64,
    min_size: f64,
    boxes: Vec<BoundingBox>,
    drag: DragState,
    selected: Option<EntityId>,
    history: UndoStack<Vec<BoundingBox>>,
    ids: Box<dyn IdSource>,
}

impl Default for BoxSession {
    fn default() -> Self {
        Self::new()
    }
}

impl BoxSession {
    pub fn new() -> Self {
        Self {
            image: None,
            canvas: CanvasSize::new(0.0, 0.0),
            max_width: DEFAULT_BOX_MAX_WIDTH,
            min_size: MIN_BBOX_SIZE,
            boxes: Vec::new(),
            drag: DragState::Idle,
            selected: None,
            history: UndoStack::new(),
            ids: Box::new(UuidIds),
        }
    }

    pub fn with_max_width(mut self, max_width: f64) -> Self {
        self.max_width = max_width;
        self
    }

    /// Smallest accepted box extent in pixels.
    pub fn with_min_size(mut self, min_size: f64) -> Self {
        self.min_size = min_size;
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

    /// Open an image, discarding boxes, selection and history.
    pub fn load_image(&mut self, image: ImageInfo) {
        self.canvas = CanvasSize::fit(image.width, image.height, self.max_width);
        log::info!(
            "Loaded {} on a {}x{} canvas",
            image.file_name,
            self.canvas.width,
            self.canvas.height
        );
        self.image = Some(image);
        self.boxes.clear();
        self.drag = DragState::Idle;
        self.selected = None;
        self.history.clear();
    }

    pub fn image(&self) -> Option<&ImageInfo> {
        self.image.as_ref()
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn boxes(&self) -> &[BoundingBox] {
        &self.boxes
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    pub fn selected(&self) -> Option<&EntityId> {
        self.selected.as_ref()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn position(&self, id: &EntityId) -> Result<usize, EditError> {
        self.boxes
            .iter()
            .position(|b| &b.id == id)
            .ok_or_else(|| EditError::UnknownShape(id.clone()))
    }

    fn record(&mut self) {
        self.history.snapshot(&self.boxes);
    }

    /// Start dragging out a new box at `p`. Clears the selection.
    pub fn begin_drag(&mut self, p: Point) -> Result<(), EditError> {
        if self.image.is_none() {
            return Err(EditError::NoImage);
        }
        self.selected = None;
        self.drag = DragState::Drawing {
            start: p,
            current: p,
        };
        Ok(())
    }

    pub fn drag_to(&mut self, p: Point) {
        if let DragState::Drawing { current, .. } = &mut self.drag {
            *current = p;
        }
    }

    /// The rectangle currently being dragged, normalized to positive extents.
    pub fn drag_preview(&self) -> Option<Bounds> {
        match self.drag {
            DragState::Idle => None,
            DragState::Drawing { start, current } => geometry::bounding_box_of(&[start, current]),
        }
    }

    /// Finish the drag.
    ///
    /// Creates a box named `Box N` when both extents exceed the minimum
    /// size; a smaller drag is dropped and `None` is returned.
    pub fn end_drag(&mut self) -> Option<EntityId> {
        let DragState::Drawing { start, current } = std::mem::take(&mut self.drag) else {
            return None;
        };

        let id = self.ids.next_id();
        let index = self.boxes.len();
        let Some(bbox) = BoundingBox::from_corners_min(
            id.clone(),
            start,
            current,
            self.min_size,
            format!("Box {}", index + 1),
            distinct_color(index),
        ) else {
            log::debug!(
                "Dropped box drag of {}x{}",
                (current.x - start.x).abs(),
                (current.y - start.y).abs()
            );
            return None;
        };

        self.record();
        log::debug!("Created {} ({}x{})", bbox.name, bbox.w, bbox.h);
        self.boxes.push(bbox);
        Some(id)
    }

    pub fn select(&mut self, id: &EntityId) -> Result<(), EditError> {
        self.position(id)?;
        self.selected = Some(id.clone());
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Move a box so its top-left corner is at `to`.
    pub fn move_box(&mut self, id: &EntityId, to: Point) -> Result<(), EditError> {
        let index = self.position(id)?;
        self.record();
        let bbox = &mut self.boxes[index];
        bbox.x = to.x;
        bbox.y = to.y;
        Ok(())
    }

    /// Set a box's extent.
    ///
    /// Extents below the minimum size are rejected and leave the box as is.
    pub fn resize_box(&mut self, id: &EntityId, width: f64, height: f64) -> Result<(), EditError> {
        let origin = {
            let bbox = &self.boxes[self.position(id)?];
            Point::new(bbox.x, bbox.y)
        };
        self.transform_box(id, origin, width, height)
    }

    /// Apply a transform gesture: new top-left corner plus extent.
    pub fn transform_box(
        &mut self,
        id: &EntityId,
        origin: Point,
        width: f64,
        height: f64,
    ) -> Result<(), EditError> {
        let index = self.position(id)?;
        // Written so NaN extents fail too.
        if !(width >= self.min_size && height >= self.min_size) {
            return Err(EditError::BoxTooSmall { width, height });
        }
        self.record();
        let bbox = &mut self.boxes[index];
        bbox.x = origin.x;
        bbox.y = origin.y;
        bbox.w = width;
        bbox.h = height;
        Ok(())
    }

    pub fn rename_box(&mut self, id: &EntityId, name: &str) -> Result<(), EditError> {
        let index = self.position(id)?;
        self.record();
        self.boxes[index].name = name.to_string();
        Ok(())
    }

    /// Delete a box, clearing the selection if it was selected.
    pub fn delete_box(&mut self, id: &EntityId) -> Result<(), EditError> {
        let index = self.position(id)?;
        self.record();
        self.boxes.remove(index);
        if self.selected.as_ref() == Some(id) {
            self.selected = None;
        }
        Ok(())
    }

    pub fn undo(&mut self) -> bool {
        let changed = self.history.undo(&mut self.boxes);
        self.drop_stale_selection();
        changed
    }

    pub fn redo(&mut self) -> bool {
        let changed = self.history.redo(&mut self.boxes);
        self.drop_stale_selection();
        changed
    }

    fn drop_stale_selection(&mut self) {
        if let Some(id) = &self.selected {
            if self.position(id).is_err() {
                self.selected = None;
            }
        }
    }

    /// Export the boxes as `<base>_bbox.json`.
    ///
    /// Fails with [`FormatError::NothingToExport`] when there are no boxes.
    pub fn export_json(&self, options: &ExportOptions) -> Result<ExportResult, FormatError> {
        let image = self.image.as_ref().ok_or(FormatError::NoImage)?;
        BoxJsonFormat.export(
            &ExportSource::new(&image.file_name, self.canvas, &self.boxes),
            options,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::formats::decode_boxes;
    use crate::model::SequentialIds;

    fn session() -> BoxSession {
        let mut s = BoxSession::new().with_id_source(Box::new(SequentialIds::new("box")));
        s.load_image(ImageInfo::new("pets.png", 600, 400));
        s
    }

    fn drag(s: &mut BoxSession, from: (f64, f64), to: (f64, f64)) -> Option<EntityId> {
        s.begin_drag(Point::new(from.0, from.1)).unwrap();
        s.drag_to(Point::new(to.0, to.1));
        s.end_drag()
    }

    #[test]
    fn test_small_drag_creates_nothing() {
        let mut s = session();
        assert_eq!(drag(&mut s, (10.0, 10.0), (12.0, 11.0)), None);
        assert!(s.boxes().is_empty());
        assert!(!s.can_undo());
    }

    #[test]
    fn test_drag_creates_box() {
        let mut s = session();
        let id = drag(&mut s, (10.0, 10.0), (20.0, 30.0)).unwrap();
        assert_eq!(s.boxes().len(), 1);
        let b = &s.boxes()[0];
        assert_eq!(b.id, id);
        assert_eq!((b.x, b.y, b.w, b.h), (10.0, 10.0, 10.0, 20.0));
        assert_eq!(b.name, "Box 1");
        assert_eq!(s.drag_state(), DragState::Idle);
    }

    #[test]
    fn test_reverse_drag_is_normalized() {
        let mut s = session();
        drag(&mut s, (50.0, 60.0), (20.0, 30.0)).unwrap();
        let b = &s.boxes()[0];
        assert_eq!((b.x, b.y, b.w, b.h), (20.0, 30.0, 30.0, 30.0));
    }

    #[test]
    fn test_boxes_get_distinct_names_and_colors() {
        let mut s = session();
        drag(&mut s, (0.0, 0.0), (10.0, 10.0));
        drag(&mut s, (20.0, 20.0), (40.0, 40.0));
        assert_eq!(s.boxes()[1].name, "Box 2");
        assert_ne!(s.boxes()[0].color, s.boxes()[1].color);
    }

    #[test]
    fn test_begin_drag_requires_image_and_clears_selection() {
        let mut empty = BoxSession::new();
        assert_eq!(
            empty.begin_drag(Point::new(0.0, 0.0)),
            Err(EditError::NoImage)
        );

        let mut s = session();
        let id = drag(&mut s, (0.0, 0.0), (10.0, 10.0)).unwrap();
        s.select(&id).unwrap();
        s.begin_drag(Point::new(100.0, 100.0)).unwrap();
        assert!(s.selected().is_none());
    }

    #[test]
    fn test_resize_rejects_below_minimum() {
        let mut s = session();
        let id = drag(&mut s, (10.0, 10.0), (40.0, 40.0)).unwrap();

        assert_eq!(
            s.resize_box(&id, 4.0, 50.0),
            Err(EditError::BoxTooSmall {
                width: 4.0,
                height: 50.0
            })
        );
        assert_eq!(s.boxes()[0].w, 30.0);

        s.resize_box(&id, 5.0, 50.0).unwrap();
        assert_eq!((s.boxes()[0].w, s.boxes()[0].h), (5.0, 50.0));
    }

    #[test]
    fn test_nan_extent_is_rejected() {
        let mut s = session();
        let id = drag(&mut s, (10.0, 10.0), (40.0, 40.0)).unwrap();
        let depth = s.history.undo_count();

        assert!(matches!(
            s.resize_box(&id, f64::NAN, 50.0),
            Err(EditError::BoxTooSmall { .. })
        ));
        assert!(matches!(
            s.transform_box(&id, Point::new(0.0, 0.0), 20.0, f64::NAN),
            Err(EditError::BoxTooSmall { .. })
        ));
        assert_eq!((s.boxes()[0].w, s.boxes()[0].h), (30.0, 30.0));
        assert_eq!(s.history.undo_count(), depth);
    }

    #[test]
    fn test_move_and_transform() {
        let mut s = session();
        let id = drag(&mut s, (10.0, 10.0), (40.0, 40.0)).unwrap();
        s.move_box(&id, Point::new(100.0, 120.0)).unwrap();
        assert_eq!((s.boxes()[0].x, s.boxes()[0].y), (100.0, 120.0));

        s.transform_box(&id, Point::new(90.0, 110.0), 60.0, 70.0)
            .unwrap();
        let b = &s.boxes()[0];
        assert_eq!((b.x, b.y, b.w, b.h), (90.0, 110.0, 60.0, 70.0));
    }

    #[test]
    fn test_delete_clears_selection() {
        let mut s = session();
        let id = drag(&mut s, (10.0, 10.0), (40.0, 40.0)).unwrap();
        s.select(&id).unwrap();
        s.delete_box(&id).unwrap();
        assert!(s.boxes().is_empty());
        assert!(s.selected().is_none());
        assert_eq!(s.delete_box(&id), Err(EditError::UnknownShape(id)));
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut s = session();
        let id = drag(&mut s, (10.0, 10.0), (40.0, 40.0)).unwrap();
        let before = s.boxes().to_vec();
        s.rename_box(&id, "dog").unwrap();
        let after = s.boxes().to_vec();

        assert!(s.undo());
        assert_eq!(s.boxes(), before.as_slice());
        assert!(s.redo());
        assert_eq!(s.boxes(), after.as_slice());

        assert!(s.undo());
        assert!(s.undo());
        assert!(s.boxes().is_empty());
        assert!(!s.undo());
    }

    #[test]
    fn test_export_json() {
        let mut s = session();
        assert!(matches!(
            s.export_json(&ExportOptions::new()),
            Err(FormatError::NothingToExport { .. })
        ));

        drag(&mut s, (10.0, 10.0), (40.0, 30.0));
        let result = s.export_json(&ExportOptions::new()).unwrap();
        assert_eq!(result.file_name, "pets_bbox.json");
        let doc = decode_boxes(&result.contents).unwrap();
        assert_eq!(doc.image, "pets.png");
        assert_eq!(doc.boxes[0].label, "Box 1");
        assert_eq!((doc.boxes[0].w, doc.boxes[0].h), (30.0, 20.0));
    }
}
