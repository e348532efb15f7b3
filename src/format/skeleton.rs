//! Materializing stored skeleton templates onto a canvas.

use std::collections::HashMap;

use crate::geometry::{CanvasSize, Point};
use crate::model::{Connection, EntityId, IdSource, Keypoint, SkeletonTemplate, Visibility};

/// Live entities produced from a template.
#[derive(Debug, Clone, PartialEq)]
pub struct Instantiated {
    pub keypoints: Vec<Keypoint>,
    pub connections: Vec<Connection>,
}

/// Instantiate `template` on `canvas` with fresh ids.
///
/// Every stored keypoint gets a new id from `ids`; edges are remapped
/// through the old-to-new id map. Edges naming a keypoint the template
/// does not contain are dropped. The template itself is not touched.
pub fn instantiate(
    template: &SkeletonTemplate,
    canvas: CanvasSize,
    ids: &mut dyn IdSource,
) -> Instantiated {
    let mut id_map: HashMap<&EntityId, EntityId> = HashMap::with_capacity(template.keypoints.len());
    let mut keypoints = Vec::with_capacity(template.keypoints.len());

    for stored in &template.keypoints {
        let fresh = ids.next_id();
        let p = canvas.denormalize_point(Point::new(stored.x, stored.y));
        keypoints.push(
            Keypoint::new(fresh.clone(), p.x, p.y, stored.name.clone())
                .with_visibility(Visibility::Visible),
        );
        id_map.insert(&stored.id, fresh);
    }

    let connections = template
        .connections
        .iter()
        .filter_map(|edge| {
            let remapped = id_map
                .get(&edge.from)
                .zip(id_map.get(&edge.to))
                .map(|(from, to)| Connection::new(from.clone(), to.clone()));
            if remapped.is_none() {
                log::warn!(
                    "Template '{}' edge {} -> {} references a missing keypoint",
                    template.name,
                    edge.from,
                    edge.to
                );
            }
            remapped
        })
        .collect();

    log::debug!(
        "Instantiated template '{}' with {} keypoints",
        template.name,
        keypoints.len()
    );
    Instantiated {
        keypoints,
        connections,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SequentialIds, TemplateKeypoint};

    fn template() -> SkeletonTemplate {
        SkeletonTemplate::new(
            EntityId::new("t1"),
            "arm",
            vec![
                TemplateKeypoint {
                    id: EntityId::new("s"),
                    x: 0.25,
                    y: 0.5,
                    name: "shoulder".into(),
                },
                TemplateKeypoint {
                    id: EntityId::new("e"),
                    x: 0.5,
                    y: 0.75,
                    name: "elbow".into(),
                },
            ],
            vec![
                Connection::new(EntityId::new("s"), EntityId::new("e")),
                Connection::new(EntityId::new("e"), EntityId::new("missing")),
            ],
        )
    }

    #[test]
    fn test_instantiate_rescales_and_remaps() {
        let t = template();
        let mut ids = SequentialIds::new("kp");
        let out = instantiate(&t, CanvasSize::new(800.0, 400.0), &mut ids);

        assert_eq!(out.keypoints.len(), 2);
        assert_eq!(out.keypoints[0].id, EntityId::new("kp-1"));
        assert_eq!((out.keypoints[0].x, out.keypoints[0].y), (200.0, 200.0));
        assert_eq!((out.keypoints[1].x, out.keypoints[1].y), (400.0, 300.0));
        assert_eq!(out.keypoints[1].name, "elbow");
        assert!(out.keypoints.iter().all(|k| k.visibility == Visibility::Visible));

        assert_eq!(
            out.connections,
            vec![Connection::new(EntityId::new("kp-1"), EntityId::new("kp-2"))]
        );
        assert_eq!(t, template());
    }

    #[test]
    fn test_two_instances_have_disjoint_ids() {
        let t = template();
        let mut ids = SequentialIds::new("kp");
        let a = instantiate(&t, CanvasSize::new(100.0, 100.0), &mut ids);
        let b = instantiate(&t, CanvasSize::new(100.0, 100.0), &mut ids);
        assert!(
            a.keypoints
                .iter()
                .all(|ka| b.keypoints.iter().all(|kb| ka.id != kb.id))
        );
        assert_eq!(a.connections.len(), b.connections.len());
    }
}
