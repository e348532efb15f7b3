//! Authoring editor for skeleton templates.
//!
//! Keypoints are kept normalized to a fixed square authoring canvas so a
//! saved template can be instantiated on any image size. Every edit to
//! the keypoints or edges is undoable; the template name is not.

use crate::geometry::{self, CanvasSize, Point};
use crate::history::{UndoConfig, UndoStack};
use crate::link::{LinkMode, PickAction};
use crate::model::{
    AddOutcome, Connection, ConnectionSet, EntityId, IdSource, SkeletonTemplate,
    TemplateKeypoint, UuidIds,
};
use crate::store::{SkeletonLibrary, SlotStore, StoreError};

use super::{EditError, PickOutcome};

/// Side length in pixels of the square authoring canvas.
pub const AUTHORING_CANVAS_SIZE: f64 = 600.0;

/// The undoable part of a template being authored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateDraft {
    pub keypoints: Vec<TemplateKeypoint>,
    pub connections: ConnectionSet,
}

impl TemplateDraft {
    pub fn contains(&self, id: &EntityId) -> bool {
        self.keypoints.iter().any(|k| &k.id == id)
    }
}

/// Editor state for one skeleton template.
#[derive(Debug)]
pub struct SkeletonEditor {
    active_id: Option<EntityId>,
    name: String,
    draft: TemplateDraft,
    history: UndoStack<TemplateDraft>,
    link: LinkMode,
    ids: Box<dyn IdSource>,
}

impl Default for SkeletonEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl SkeletonEditor {
    pub fn new() -> Self {
        Self {
            active_id: None,
            name: String::new(),
            draft: TemplateDraft::default(),
            history: UndoStack::new(),
            link: LinkMode::new(),
            ids: Box::new(UuidIds),
        }
    }

    pub fn with_id_source(mut self, ids: Box<dyn IdSource>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_undo_config(mut self, config: UndoConfig) -> Self {
        self.history = UndoStack::with_config(config);
        self
    }

    pub fn canvas(&self) -> CanvasSize {
        CanvasSize::new(AUTHORING_CANVAS_SIZE, AUTHORING_CANVAS_SIZE)
    }

    /// Id of the stored template being edited, if it was loaded or saved.
    pub fn active_id(&self) -> Option<&EntityId> {
        self.active_id.as_ref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn keypoints(&self) -> &[TemplateKeypoint] {
        &self.draft.keypoints
    }

    pub fn connections(&self) -> &ConnectionSet {
        &self.draft.connections
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn link_mode(&self) -> &LinkMode {
        &self.link
    }

    /// Edges whose endpoints both exist, for drawing.
    pub fn live_connections(&self) -> impl Iterator<Item = &Connection> + '_ {
        self.draft
            .connections
            .resolved(move |id| self.draft.contains(id))
    }

    fn to_normalized(&self, p: Point) -> Point {
        let n = self.canvas().normalize_point(p);
        Point::new(geometry::clamp(n.x, 0.0, 1.0), geometry::clamp(n.y, 0.0, 1.0))
    }

    fn keypoint_mut(&mut self, id: &EntityId) -> Result<&mut TemplateKeypoint, EditError> {
        self.draft
            .keypoints
            .iter_mut()
            .find(|k| &k.id == id)
            .ok_or_else(|| EditError::UnknownKeypoint(id.clone()))
    }

    fn require_keypoint(&self, id: &EntityId) -> Result<(), EditError> {
        if self.draft.contains(id) {
            Ok(())
        } else {
            Err(EditError::UnknownKeypoint(id.clone()))
        }
    }

    fn record(&mut self) {
        self.history.snapshot(&self.draft);
    }

    /// Start a new, unsaved template. History is discarded.
    pub fn clear(&mut self) {
        self.active_id = None;
        self.name.clear();
        self.draft = TemplateDraft::default();
        self.history.clear();
        self.link.reset();
    }

    /// Handle a click on empty canvas at pixel `p`.
    ///
    /// Places `KP <n>` clamped into the canvas, or does nothing in link mode.
    pub fn click_canvas(&mut self, p: Point) -> Option<EntityId> {
        if self.link.is_enabled() {
            return None;
        }
        let n = self.to_normalized(p);
        let id = self.ids.next_id();
        let name = format!("KP {}", self.draft.keypoints.len() + 1);
        log::trace!("Placed {} at ({:.3}, {:.3})", name, n.x, n.y);
        self.record();
        self.draft.keypoints.push(TemplateKeypoint {
            id: id.clone(),
            x: n.x,
            y: n.y,
            name,
        });
        Some(id)
    }

    /// Drag a keypoint to pixel `p`, clamped into the canvas.
    pub fn move_keypoint(&mut self, id: &EntityId, p: Point) -> Result<(), EditError> {
        self.require_keypoint(id)?;
        let n = self.to_normalized(p);
        self.record();
        let kp = self.keypoint_mut(id)?;
        kp.x = n.x;
        kp.y = n.y;
        Ok(())
    }

    pub fn rename_keypoint(&mut self, id: &EntityId, name: &str) -> Result<(), EditError> {
        self.require_keypoint(id)?;
        self.record();
        self.keypoint_mut(id)?.name = name.to_string();
        Ok(())
    }

    /// Delete a keypoint and every edge touching it.
    pub fn delete_keypoint(&mut self, id: &EntityId) -> Result<(), EditError> {
        self.require_keypoint(id)?;
        self.record();
        self.draft.keypoints.retain(|k| &k.id != id);
        self.draft.connections.remove_touching(id);
        self.link.forget(id);
        Ok(())
    }

    /// Remove the edge joining `a` and `b`. Returns false, recording
    /// nothing, when there is no such edge.
    pub fn remove_connection(&mut self, a: &EntityId, b: &EntityId) -> bool {
        if !self.draft.connections.contains(a, b) {
            return false;
        }
        self.record();
        self.draft.connections.remove(a, b)
    }

    pub fn undo(&mut self) -> bool {
        let changed = self.history.undo(&mut self.draft);
        if changed {
            self.drop_stale_source();
        }
        changed
    }

    pub fn redo(&mut self) -> bool {
        let changed = self.history.redo(&mut self.draft);
        if changed {
            self.drop_stale_source();
        }
        changed
    }

    fn drop_stale_source(&mut self) {
        if let Some(source) = self.link.pending_source().cloned() {
            if !self.draft.contains(&source) {
                self.link.forget(&source);
            }
        }
    }

    pub fn set_link_mode(&mut self, enabled: bool) {
        self.link.set_enabled(enabled);
    }

    pub fn toggle_link_mode(&mut self) -> bool {
        self.link.toggle()
    }

    /// Feed a click on keypoint `id` through the link protocol.
    pub fn pick_keypoint(&mut self, id: &EntityId) -> Result<PickOutcome, EditError> {
        self.require_keypoint(id)?;
        Ok(match self.link.pick(id.clone()) {
            PickAction::Select(id) => PickOutcome::Selected(id),
            PickAction::SourceArmed(id) => PickOutcome::SourceArmed(id),
            PickAction::Cancelled => PickOutcome::Cancelled,
            PickAction::Connect { from, to } => {
                match self.draft.connections.check(&from, &to) {
                    AddOutcome::Added => {
                        self.record();
                        self.draft.connections.add(from.clone(), to.clone());
                        PickOutcome::Connected(Connection::new(from, to))
                    }
                    AddOutcome::Duplicate | AddOutcome::SelfLoop => PickOutcome::AlreadyConnected,
                }
            }
        })
    }

    /// The template as it would be saved.
    pub fn to_template(&self, id: EntityId) -> SkeletonTemplate {
        SkeletonTemplate::new(
            id,
            self.name.clone(),
            self.draft.keypoints.clone(),
            self.draft.connections.iter().cloned().collect(),
        )
    }

    /// Save into `library`, replacing the stored copy if this template was
    /// loaded or saved before.
    ///
    /// A blank name is rejected with [`StoreError::MissingName`] and the
    /// editor keeps its state.
    pub fn save<S: SlotStore>(
        &mut self,
        library: &mut SkeletonLibrary<S>,
    ) -> Result<SkeletonTemplate, StoreError> {
        if self.name.trim().is_empty() {
            return Err(StoreError::MissingName);
        }
        let id = match &self.active_id {
            Some(id) => id.clone(),
            None => self.ids.next_id(),
        };
        let template = self.to_template(id.clone());
        library.save(template.clone())?;
        self.active_id = Some(id);
        Ok(template)
    }

    /// Replace the editor contents with a stored template. History is
    /// discarded.
    pub fn load(&mut self, template: &SkeletonTemplate) {
        self.active_id = Some(template.id.clone());
        self.name = template.name.clone();
        self.draft = TemplateDraft {
            keypoints: template.keypoints.clone(),
            connections: template.connections.clone(),
        };
        self.history.clear();
        self.link.reset();
        log::debug!("Editing skeleton '{}'", template.name);
    }

    /// Delete a stored template. The editor detaches from it if it was
    /// the one being edited.
    pub fn delete_saved<S: SlotStore>(
        &mut self,
        library: &mut SkeletonLibrary<S>,
        id: &EntityId,
    ) -> Result<Vec<SkeletonTemplate>, StoreError> {
        let remaining = library.delete(id)?;
        if self.active_id.as_ref() == Some(id) {
            self.active_id = None;
        }
        Ok(remaining)
    }
}
