//! Two-click "link mode" for connecting keypoints.
//!
//! While link mode is on, picking a keypoint either arms it as the pending
//! source or, when a source is already armed, requests an edge from the
//! source to the picked keypoint. With link mode off a pick is a plain
//! selection. Picking the armed source a second time disarms it.

use crate::model::EntityId;

/// Progress of the current connect gesture.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LinkState {
    /// No pending source.
    #[default]
    Idle,
    /// A source keypoint is waiting for its target.
    SourcePicked(EntityId),
}

/// What a keypoint pick asks the editor to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickAction {
    /// Link mode is off: focus the keypoint.
    Select(EntityId),
    /// The keypoint became the pending source.
    SourceArmed(EntityId),
    /// The pending source was picked again and has been disarmed.
    Cancelled,
    /// Add the edge `{from, to}` (a no-op if it already exists).
    Connect { from: EntityId, to: EntityId },
}

/// Link-mode switch plus the pending-source state machine.
#[derive(Debug, Clone, Default)]
pub struct LinkMode {
    enabled: bool,
    state: LinkState,
}

impl LinkMode {
    /// Create with link mode off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether picks are interpreted as edge endpoints.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Current gesture state.
    pub fn state(&self) -> &LinkState {
        &self.state
    }

    /// The armed source, if any.
    pub fn pending_source(&self) -> Option<&EntityId> {
        match &self.state {
            LinkState::SourcePicked(id) => Some(id),
            LinkState::Idle => None,
        }
    }

    /// Turn link mode on or off. Always drops any pending source.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.state = LinkState::Idle;
        log::trace!("Link mode {}", if enabled { "on" } else { "off" });
    }

    /// Flip link mode, returning the new setting.
    pub fn toggle(&mut self) -> bool {
        self.set_enabled(!self.enabled);
        self.enabled
    }

    /// Feed a keypoint pick through the state machine.
    pub fn pick(&mut self, id: EntityId) -> PickAction {
        if !self.enabled {
            return PickAction::Select(id);
        }

        match std::mem::take(&mut self.state) {
            LinkState::Idle => {
                self.state = LinkState::SourcePicked(id.clone());
                PickAction::SourceArmed(id)
            }
            LinkState::SourcePicked(source) if source == id => PickAction::Cancelled,
            LinkState::SourcePicked(source) => PickAction::Connect {
                from: source,
                to: id,
            },
        }
    }

    /// Drop the pending source if it is `id` (called when `id` is deleted).
    pub fn forget(&mut self, id: &EntityId) {
        if self.pending_source() == Some(id) {
            self.state = LinkState::Idle;
        }
    }

    /// Return to `Idle` without changing the mode.
    pub fn reset(&mut self) {
        self.state = LinkState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> EntityId {
        EntityId::new(s)
    }

    #[test]
    fn test_pick_without_link_mode_selects() {
        let mut link = LinkMode::new();
        assert_eq!(link.pick(id("a")), PickAction::Select(id("a")));
        assert_eq!(link.state(), &LinkState::Idle);
    }

    #[test]
    fn test_two_picks_request_connection() {
        let mut link = LinkMode::new();
        link.set_enabled(true);
        assert_eq!(link.pick(id("a")), PickAction::SourceArmed(id("a")));
        assert_eq!(link.pending_source(), Some(&id("a")));
        assert_eq!(
            link.pick(id("b")),
            PickAction::Connect {
                from: id("a"),
                to: id("b")
            }
        );
        assert_eq!(link.state(), &LinkState::Idle);
    }

    #[test]
    fn test_picking_source_again_cancels() {
        let mut link = LinkMode::new();
        link.set_enabled(true);
        link.pick(id("a"));
        assert_eq!(link.pick(id("a")), PickAction::Cancelled);
        assert_eq!(link.state(), &LinkState::Idle);
    }

    #[test]
    fn test_toggle_off_clears_pending_source() {
        let mut link = LinkMode::new();
        assert!(link.toggle());
        link.pick(id("a"));
        assert!(!link.toggle());
        assert!(link.pending_source().is_none());
        assert!(link.toggle());
        assert_eq!(link.pick(id("b")), PickAction::SourceArmed(id("b")));
    }

    #[test]
    fn test_forget_only_resets_matching_source() {
        let mut link = LinkMode::new();
        link.set_enabled(true);
        link.pick(id("a"));
        link.forget(&id("b"));
        assert_eq!(link.pending_source(), Some(&id("a")));
        link.forget(&id("a"));
        assert_eq!(link.state(), &LinkState::Idle);
    }
}
