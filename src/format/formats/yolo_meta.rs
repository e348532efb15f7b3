//! Sidecar metadata for YOLO pose files.
//!
//! A pose line stores positions only. A meta JSON document supplies the
//! keypoint names and the skeleton edges by index into a record's
//! keypoint list:
//!
//! ```json
//! { "names": ["nose", "left_eye"], "skeleton": [[0, 1]] }
//! ```

use serde::{Deserialize, Serialize};

use super::yolo::YoloObject;
use crate::format::error::FormatError;
use crate::format::traits::FormatWarning;
use crate::model::{AddOutcome, ConnectionSet, IdSource, Keypoint, keypoint_label};

/// Names and skeleton edges for the keypoints of a pose record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YoloMeta {
    #[serde(default)]
    pub names: Vec<String>,
    /// Index pairs into a record's keypoints.
    #[serde(default)]
    pub skeleton: Vec<[i64; 2]>,
}

impl YoloMeta {
    /// Name for the keypoint at `index`, falling back to its letter label.
    pub fn name_for(&self, index: usize) -> String {
        self.names
            .get(index)
            .map(|n| n.trim())
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| keypoint_label(index))
    }
}

/// Parse a meta document. Missing fields default to empty.
pub fn decode_meta(json: &str) -> Result<YoloMeta, FormatError> {
    let meta: YoloMeta = serde_json::from_str(json)?;
    log::debug!(
        "Decoded YOLO meta with {} names and {} edges",
        meta.names.len(),
        meta.skeleton.len()
    );
    Ok(meta)
}

/// A decoded pose record turned into named keypoints and edges.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledPose {
    pub keypoints: Vec<Keypoint>,
    pub connections: ConnectionSet,
    pub warnings: Vec<FormatWarning>,
}

/// Give `object`'s keypoints fresh ids and the names from `meta`, then
/// connect them along `meta.skeleton`.
///
/// Pairs pointing past the record's keypoints, self-pairs and repeated
/// pairs are skipped with a warning.
pub fn apply_meta(object: &YoloObject, meta: &YoloMeta, ids: &mut dyn IdSource) -> LabeledPose {
    let keypoints: Vec<Keypoint> = object
        .keypoints
        .iter()
        .enumerate()
        .map(|(i, decoded)| {
            Keypoint::new(ids.next_id(), decoded.x, decoded.y, meta.name_for(i))
                .with_visibility(decoded.visibility)
        })
        .collect();

    let mut connections = ConnectionSet::new();
    let mut warnings = Vec::new();
    let lookup = |index: i64| usize::try_from(index).ok().and_then(|i| keypoints.get(i));

    for &[a, b] in &meta.skeleton {
        let Some((from, to)) = lookup(a).zip(lookup(b)) else {
            log::warn!("Skeleton pair [{}, {}] is out of range", a, b);
            warnings.push(FormatWarning::warning(format!(
                "Skeleton pair [{}, {}] is out of range for {} keypoints",
                a,
                b,
                keypoints.len()
            )));
            continue;
        };
        match connections.add(from.id.clone(), to.id.clone()) {
            AddOutcome::Added => {}
            AddOutcome::Duplicate => warnings.push(FormatWarning::warning(format!(
                "Skeleton pair [{}, {}] repeats an earlier edge",
                a, b
            ))),
            AddOutcome::SelfLoop => warnings.push(FormatWarning::warning(format!(
                "Skeleton pair [{}, {}] joins a keypoint to itself",
                a, b
            ))),
        }
    }

    LabeledPose {
        keypoints,
        connections,
        warnings,
    }
}
