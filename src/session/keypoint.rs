//! Keypoint annotation session.
//!
//! Keypoints are placed on a fitted image canvas, linked into a skeleton
//! graph through link mode, and exported as one YOLO pose line.

use crate::format::formats::{YoloKeypointFormat, YoloMeta, apply_meta, decode_keypoints};
use crate::format::{
    AnnotationFormat, ExportOptions, ExportResult, ExportSource, FormatError, FormatWarning,
    instantiate,
};
use crate::geometry::{CanvasSize, Point};
use crate::history::{UndoConfig, UndoStack};
use crate::link::{LinkMode, PickAction};
use crate::model::{
    AddOutcome, Connection, ConnectionSet, EntityId, IdSource, Keypoint, SkeletonTemplate,
    UuidIds, Visibility, keypoint_label,
};

use super::{EditError, ImageInfo};

/// Default display-fit width of the keypoint canvas.
pub const DEFAULT_KEYPOINT_MAX_WIDTH: f64 = 900.0;

/// The undoable part of a keypoint session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeypointGraph {
    pub keypoints: Vec<Keypoint>,
    pub connections: ConnectionSet,
}

impl KeypointGraph {
    /// Look up a keypoint by id.
    pub fn keypoint(&self, id: &EntityId) -> Option<&Keypoint> {
        self.keypoints.iter().find(|k| &k.id == id)
    }

    fn keypoint_mut(&mut self, id: &EntityId) -> Option<&mut Keypoint> {
        self.keypoints.iter_mut().find(|k| &k.id == id)
    }

    /// Whether `id` names a live keypoint.
    pub fn contains(&self, id: &EntityId) -> bool {
        self.keypoint(id).is_some()
    }

    /// Connections whose endpoints both exist.
    pub fn live_connections(&self) -> impl Iterator<Item = &Connection> + '_ {
        self.connections.resolved(move |id| self.contains(id))
    }
}

/// What a keypoint pick did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickOutcome {
    /// Link mode is off; the keypoint is now active.
    Selected(EntityId),
    /// The keypoint is the pending link source.
    SourceArmed(EntityId),
    /// The pending source was picked again and dropped.
    Cancelled,
    /// A new edge was added.
    Connected(Connection),
    /// The two keypoints were already joined; nothing changed.
    AlreadyConnected,
}

/// Summary of a YOLO keypoint import.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportReport {
    pub objects: usize,
    pub keypoints_added: usize,
    pub warnings: Vec<FormatWarning>,
}

/// Editor state for placing and linking keypoints on one image.
#[derive(Debug)]
pub struct KeypointSession {
    image: Option<ImageInfo>,
    canvas: CanvasSize,
    max_width: f64,
    graph: KeypointGraph,
    history: UndoStack<KeypointGraph>,
    link: LinkMode,
    active: Option<EntityId>,
    ids: Box<dyn IdSource>,
}

impl Default for KeypointSession {
    fn default() -> Self {
        Self::new()
    }
}

impl KeypointSession {
    /// Create an empty session with random ids.
    pub fn new() -> Self {
        Self {
            image: None,
            canvas: CanvasSize::new(0.0, 0.0),
            max_width: DEFAULT_KEYPOINT_MAX_WIDTH,
            graph: KeypointGraph::default(),
            history: UndoStack::new(),
            link: LinkMode::new(),
            active: None,
            ids: Box::new(UuidIds),
        }
    }

    /// Use a different display-fit width for images loaded afterwards.
    pub fn with_max_width(mut self, max_width: f64) -> Self {
        self.max_width = max_width;
        self
    }

    /// Use a history of a different depth.
    pub fn with_undo_config(mut self, config: UndoConfig) -> Self {
        self.history = UndoStack::with_config(config);
        self
    }

    /// Draw keypoint ids from `ids`.
    pub fn with_id_source(mut self, ids: Box<dyn IdSource>) -> Self {
        self.ids = ids;
        self
    }

    /// Open an image, discarding every keypoint, edge and history entry.
    pub fn load_image(&mut self, image: ImageInfo) {
        self.canvas = CanvasSize::fit(image.width, image.height, self.max_width);
        log::info!(
            "Loaded {} ({}x{}) on a {}x{} canvas",
            image.file_name,
            image.width,
            image.height,
            self.canvas.width,
            self.canvas.height
        );
        self.image = Some(image);
        self.graph = KeypointGraph::default();
        self.history.clear();
        self.link.reset();
        self.active = None;
    }

    pub fn image(&self) -> Option<&ImageInfo> {
        self.image.as_ref()
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn graph(&self) -> &KeypointGraph {
        &self.graph
    }

    pub fn keypoints(&self) -> &[Keypoint] {
        &self.graph.keypoints
    }

    pub fn connections(&self) -> &ConnectionSet {
        &self.graph.connections
    }

    pub fn link_mode(&self) -> &LinkMode {
        &self.link
    }

    /// The selected keypoint or pending link source.
    pub fn active(&self) -> Option<&EntityId> {
        self.active.as_ref()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn require_image(&self) -> Result<(), EditError> {
        if self.image.is_some() {
            Ok(())
        } else {
            Err(EditError::NoImage)
        }
    }

    fn require_keypoint(&self, id: &EntityId) -> Result<(), EditError> {
        if self.graph.contains(id) {
            Ok(())
        } else {
            Err(EditError::UnknownKeypoint(id.clone()))
        }
    }

    fn record(&mut self) {
        self.history.snapshot(&self.graph);
    }

    /// Handle a click on empty canvas.
    ///
    /// Places a keypoint unless link mode is on, in which case the click
    /// is ignored and `Ok(None)` is returned.
    pub fn click_canvas(&mut self, p: Point) -> Result<Option<EntityId>, EditError> {
        if self.link.is_enabled() {
            return Ok(None);
        }
        self.add_keypoint(p).map(Some)
    }

    /// Place a keypoint at `p`, clamped to the canvas and auto-labelled.
    pub fn add_keypoint(&mut self, p: Point) -> Result<EntityId, EditError> {
        self.require_image()?;
        self.record();

        let p = self.canvas.clamp_point(p);
        let id = self.ids.next_id();
        let name = keypoint_label(self.graph.keypoints.len());
        log::debug!("Added keypoint {} at ({}, {})", name, p.x, p.y);
        self.graph
            .keypoints
            .push(Keypoint::new(id.clone(), p.x, p.y, name));
        Ok(id)
    }

    /// Move a keypoint to `p`, clamped to the canvas.
    pub fn move_keypoint(&mut self, id: &EntityId, p: Point) -> Result<(), EditError> {
        self.require_keypoint(id)?;
        self.record();
        let p = self.canvas.clamp_point(p);
        if let Some(kp) = self.graph.keypoint_mut(id) {
            kp.x = p.x;
            kp.y = p.y;
        }
        Ok(())
    }

    pub fn rename_keypoint(&mut self, id: &EntityId, name: &str) -> Result<(), EditError> {
        self.require_keypoint(id)?;
        self.record();
        if let Some(kp) = self.graph.keypoint_mut(id) {
            kp.name = name.to_string();
        }
        Ok(())
    }

    pub fn set_visibility(
        &mut self,
        id: &EntityId,
        visibility: Visibility,
    ) -> Result<(), EditError> {
        self.require_keypoint(id)?;
        self.record();
        if let Some(kp) = self.graph.keypoint_mut(id) {
            kp.visibility = visibility;
        }
        Ok(())
    }

    /// Delete a keypoint together with every edge touching it.
    pub fn delete_keypoint(&mut self, id: &EntityId) -> Result<(), EditError> {
        self.require_keypoint(id)?;
        self.record();

        self.graph.keypoints.retain(|k| &k.id != id);
        let dropped = self.graph.connections.remove_touching(id);
        self.link.forget(id);
        if self.active.as_ref() == Some(id) {
            self.active = None;
        }
        log::debug!("Deleted keypoint {} and {} connections", id, dropped);
        Ok(())
    }

    /// Turn link mode on or off, dropping any pending source.
    pub fn set_link_mode(&mut self, enabled: bool) {
        self.link.set_enabled(enabled);
        self.active = None;
    }

    /// Flip link mode, returning the new setting.
    pub fn toggle_link_mode(&mut self) -> bool {
        let enabled = !self.link.is_enabled();
        self.set_link_mode(enabled);
        enabled
    }

    /// Feed a click on keypoint `id` through the link protocol.
    ///
    /// Only a pick that actually adds an edge is recorded in history.
    pub fn pick_keypoint(&mut self, id: &EntityId) -> Result<PickOutcome, EditError> {
        self.require_keypoint(id)?;

        let outcome = match self.link.pick(id.clone()) {
            PickAction::Select(id) => {
                self.active = Some(id.clone());
                PickOutcome::Selected(id)
            }
            PickAction::SourceArmed(id) => {
                self.active = Some(id.clone());
                PickOutcome::SourceArmed(id)
            }
            PickAction::Cancelled => {
                self.active = None;
                PickOutcome::Cancelled
            }
            PickAction::Connect { from, to } => {
                self.active = None;
                match self.graph.connections.check(&from, &to) {
                    AddOutcome::Added => {
                        self.record();
                        self.graph.connections.add(from.clone(), to.clone());
                        PickOutcome::Connected(Connection::new(from, to))
                    }
                    AddOutcome::Duplicate | AddOutcome::SelfLoop => PickOutcome::AlreadyConnected,
                }
            }
        };
        Ok(outcome)
    }

    /// Remove the edge between `a` and `b`, in either direction.
    ///
    /// Returns false (and records nothing) when no such edge exists.
    pub fn remove_connection(&mut self, a: &EntityId, b: &EntityId) -> bool {
        if !self.graph.connections.contains(a, b) {
            return false;
        }
        self.record();
        self.graph.connections.remove(a, b)
    }

    pub fn undo(&mut self) -> bool {
        let changed = self.history.undo(&mut self.graph);
        if changed {
            self.drop_stale_references();
        }
        changed
    }

    pub fn redo(&mut self) -> bool {
        let changed = self.history.redo(&mut self.graph);
        if changed {
            self.drop_stale_references();
        }
        changed
    }

    fn drop_stale_references(&mut self) {
        if let Some(id) = self.active.take() {
            if self.graph.contains(&id) {
                self.active = Some(id);
            }
        }
        if let Some(source) = self.link.pending_source().cloned() {
            if !self.graph.contains(&source) {
                self.link.forget(&source);
            }
        }
    }

    /// Append a fresh instance of `template`, scaled to the canvas.
    ///
    /// Returns the number of keypoints added.
    pub fn apply_template(&mut self, template: &SkeletonTemplate) -> Result<usize, EditError> {
        self.require_image()?;
        self.record();

        let instance = instantiate(template, self.canvas, self.ids.as_mut());
        let added = instance.keypoints.len();
        self.graph.keypoints.extend(instance.keypoints);
        for edge in instance.connections {
            self.graph.connections.add(edge.from, edge.to);
        }
        log::info!("Applied template '{}' ({} keypoints)", template.name, added);
        Ok(added)
    }

    /// Capture the current keypoints as a template under `name`.
    pub fn capture_template(&mut self, name: &str) -> Result<SkeletonTemplate, EditError> {
        self.require_image()?;
        Ok(SkeletonTemplate::capture(
            self.ids.next_id(),
            name,
            &self.graph.keypoints,
            &self.graph.connections,
            self.canvas,
        ))
    }

    /// Append the keypoints of a YOLO pose file as one undoable step.
    ///
    /// Malformed lines are reported as warnings. An import that yields no
    /// keypoints leaves the session and its history untouched.
    pub fn import_yolo(&mut self, text: &str) -> Result<ImportReport, EditError> {
        self.require_image()?;

        let import = decode_keypoints(text, self.canvas);
        let total: usize = import.objects.iter().map(|o| o.keypoints.len()).sum();
        if total > 0 {
            self.record();
            for decoded in import.objects.iter().flat_map(|o| &o.keypoints) {
                let id = self.ids.next_id();
                let name = keypoint_label(self.graph.keypoints.len());
                self.graph.keypoints.push(
                    Keypoint::new(id, decoded.x, decoded.y, name)
                        .with_visibility(decoded.visibility),
                );
            }
        }

        log::info!(
            "Imported {} keypoints from {} objects ({} warnings)",
            total,
            import.objects.len(),
            import.warnings.len()
        );
        Ok(ImportReport {
            objects: import.objects.len(),
            keypoints_added: total,
            warnings: import.warnings,
        })
    }

    /// Like [`import_yolo`](Self::import_yolo), but names each record's
    /// keypoints and links them from a meta document.
    ///
    /// Skeleton pairs index into each record's own keypoints. Pairs that
    /// cannot be resolved are reported alongside the line warnings.
    pub fn import_yolo_with_meta(
        &mut self,
        text: &str,
        meta: &YoloMeta,
    ) -> Result<ImportReport, EditError> {
        self.require_image()?;

        let import = decode_keypoints(text, self.canvas);
        let total: usize = import.objects.iter().map(|o| o.keypoints.len()).sum();
        let mut warnings = import.warnings;
        if total > 0 {
            self.record();
            for object in &import.objects {
                let pose = apply_meta(object, meta, self.ids.as_mut());
                self.graph.keypoints.extend(pose.keypoints);
                for edge in &pose.connections {
                    self.graph
                        .connections
                        .add(edge.from.clone(), edge.to.clone());
                }
                warnings.extend(pose.warnings);
            }
        }

        log::info!(
            "Imported {} named keypoints from {} objects ({} warnings)",
            total,
            import.objects.len(),
            warnings.len()
        );
        Ok(ImportReport {
            objects: import.objects.len(),
            keypoints_added: total,
            warnings,
        })
    }

    /// Export the keypoints as a YOLO pose file named after the image.
    pub fn export_yolo(&self, options: &ExportOptions) -> Result<ExportResult, FormatError> {
        let image = self.image.as_ref().ok_or(FormatError::NoImage)?;
        let source = ExportSource::new(&image.file_name, self.canvas, &self.graph.keypoints);
        YoloKeypointFormat.export(&source, options)
    }
}
