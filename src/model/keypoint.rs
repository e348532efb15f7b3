//! Keypoint entities and their automatic labels.

use serde::{Deserialize, Serialize};

use super::EntityId;
use crate::geometry::Point;

/// Labeling state of a keypoint, as written in YOLO pose files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Visibility {
    /// Not labeled.
    Absent,
    /// Labeled but occluded.
    Hidden,
    /// Labeled and visible.
    #[default]
    Visible,
}

impl Visibility {
    /// Numeric code used by the text format.
    pub fn code(self) -> u8 {
        match self {
            Visibility::Absent => 0,
            Visibility::Hidden => 1,
            Visibility::Visible => 2,
        }
    }

    /// Parse a numeric code, `None` for anything but 0, 1 or 2.
    pub fn from_code(code: f64) -> Option<Self> {
        match code {
            c if c == 0.0 => Some(Visibility::Absent),
            c if c == 1.0 => Some(Visibility::Hidden),
            c if c == 2.0 => Some(Visibility::Visible),
            _ => None,
        }
    }
}

impl From<Visibility> for u8 {
    fn from(v: Visibility) -> Self {
        v.code()
    }
}

impl TryFrom<u8> for Visibility {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Visibility::from_code(code as f64).ok_or_else(|| format!("invalid visibility {}", code))
    }
}

/// A named point on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub id: EntityId,
    pub x: f64,
    pub y: f64,
    pub name: String,
    #[serde(default)]
    pub visibility: Visibility,
}

impl Keypoint {
    /// Create a visible keypoint.
    pub fn new(id: EntityId, x: f64, y: f64, name: impl Into<String>) -> Self {
        Self {
            id,
            x,
            y,
            name: name.into(),
            visibility: Visibility::Visible,
        }
    }

    /// Set the visibility.
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Position as a point.
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Spreadsheet-column style label for the keypoint at `index`.
///
/// `0 -> A`, `25 -> Z`, `26 -> AA`, `701 -> ZZ`, `702 -> AAA`.
pub fn keypoint_label(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index + 1;
    while n > 0 {
        let r = (n - 1) % 26;
        letters.push(b'A' + r as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    letters.into_iter().map(char::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_letters() {
        let labels: Vec<String> = (0..26).map(keypoint_label).collect();
        assert_eq!(labels.first().map(String::as_str), Some("A"));
        assert_eq!(labels.last().map(String::as_str), Some("Z"));
        assert_eq!(labels.concat(), "ABCDEFGHIJKLMNOPQRSTUVWXYZ");
    }

    #[test]
    fn test_label_boundaries() {
        assert_eq!(keypoint_label(26), "AA");
        assert_eq!(keypoint_label(27), "AB");
        assert_eq!(keypoint_label(51), "AZ");
        assert_eq!(keypoint_label(52), "BA");
        assert_eq!(keypoint_label(701), "ZZ");
        assert_eq!(keypoint_label(702), "AAA");
    }

    #[test]
    fn test_visibility_codes() {
        assert_eq!(Visibility::default(), Visibility::Visible);
        assert_eq!(Visibility::from_code(1.0), Some(Visibility::Hidden));
        assert_eq!(Visibility::from_code(3.0), None);
        assert_eq!(Visibility::from_code(1.5), None);
        assert_eq!(Visibility::Absent.code(), 0);
    }

    #[test]
    fn test_keypoint_json_uses_numeric_visibility() {
        let kp = Keypoint::new(EntityId::new("k"), 1.0, 2.0, "A").with_visibility(Visibility::Hidden);
        let json = serde_json::to_value(&kp).unwrap();
        assert_eq!(json["visibility"], 1);
    }
}
