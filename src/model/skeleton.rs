//! Reusable keypoint topologies stored in normalized coordinates.

use serde::{Deserialize, Serialize};

use super::{Connection, ConnectionSet, EntityId, Keypoint};
use crate::geometry::CanvasSize;

/// A keypoint of a stored template, with `x`/`y` relative to the
/// authoring canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateKeypoint {
    pub id: EntityId,
    pub x: f64,
    pub y: f64,
    pub name: String,
}

/// A named skeleton: keypoints plus the edges between them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkeletonTemplate {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub keypoints: Vec<TemplateKeypoint>,
    #[serde(default)]
    pub connections: ConnectionSet,
}

impl SkeletonTemplate {
    /// Create a template from already-normalized parts. Self-loops and
    /// repeated edges are dropped.
    pub fn new(
        id: EntityId,
        name: impl Into<String>,
        keypoints: Vec<TemplateKeypoint>,
        connections: Vec<Connection>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            keypoints,
            connections: ConnectionSet::from_edges(connections),
        }
    }

    /// Capture live keypoints drawn on `canvas` as a template.
    ///
    /// Coordinates are divided by the canvas size and left unclamped.
    /// Edges with an endpoint outside `keypoints` are dropped.
    pub fn capture(
        id: EntityId,
        name: impl Into<String>,
        keypoints: &[Keypoint],
        connections: &ConnectionSet,
        canvas: CanvasSize,
    ) -> Self {
        let stored = keypoints
            .iter()
            .map(|kp| {
                let p = canvas.normalize_point(kp.position());
                TemplateKeypoint {
                    id: kp.id.clone(),
                    x: p.x,
                    y: p.y,
                    name: kp.name.clone(),
                }
            })
            .collect();
        let edges = connections
            .resolved(|id| keypoints.iter().any(|kp| &kp.id == id))
            .cloned()
            .collect();
        Self::new(id, name, stored, edges)
    }

    /// Look up a stored keypoint.
    pub fn keypoint(&self, id: &EntityId) -> Option<&TemplateKeypoint> {
        self.keypoints.iter().find(|kp| &kp.id == id)
    }
}
