//! Core data types for tree multilateration

use crate::core::constants::CANONICAL_ID_WIDTH;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical tree identifier.
///
/// Single-character identifiers are zero-padded (`"7"` becomes `"07"`) so that
/// plain string ordering agrees with the numeric prefix ordering of survey
/// numbers like `07 < 12`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct TreeId(String);

impl TreeId {
    /// Create a canonical identifier from raw input text
    pub fn new(raw: &str) -> Self {
        let trimmed = raw.trim();
        let len = trimmed.chars().count();
        if len == 0 || len >= CANONICAL_ID_WIDTH {
            return Self(trimmed.to_string());
        }

        let mut padded = "0".repeat(CANONICAL_ID_WIDTH - len);
        padded.push_str(trimmed);
        Self(padded)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for TreeId {
    fn from(raw: &str) -> Self {
        TreeId::new(raw)
    }
}

impl From<String> for TreeId {
    fn from(raw: String) -> Self {
        TreeId::new(&raw)
    }
}

impl From<TreeId> for String {
    fn from(id: TreeId) -> Self {
        id.0
    }
}

impl fmt::Display for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 2D position in the local survey plane (meters)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn to_vector(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }

    pub fn from_vector(v: &Vector2<f64>) -> Self {
        Self { x: v.x, y: v.y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Point) -> f64 {
        (other.to_vector() - self.to_vector()).norm()
    }

    /// Squared Euclidean distance to another point
    pub fn distance_squared_to(&self, other: &Point) -> f64 {
        (other.to_vector() - self.to_vector()).norm_squared()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A surveyed object, either already positioned or awaiting resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub id: TreeId,
    /// Committed coordinate; `None` while the tree is unknown
    pub position: Option<Point>,
    /// Approximate coordinate carried by an unknown tree. Never treated as resolved.
    pub hint: Option<Point>,
    pub name: String,
}

impl Tree {
    /// Create a tree with a known, final position
    pub fn known(id: impl Into<TreeId>, position: Point, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            position: Some(position),
            hint: None,
            name: name.into(),
        }
    }

    /// Create a tree whose position has to be resolved
    pub fn unknown(id: impl Into<TreeId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            position: None,
            hint: None,
            name: name.into(),
        }
    }

    pub fn with_hint(mut self, hint: Point) -> Self {
        self.hint = Some(hint);
        self
    }

    pub fn is_known(&self) -> bool {
        self.position.is_some()
    }

    /// Drop the committed position, keeping it as an approximate hint
    pub fn into_unknown(self) -> Self {
        Self {
            hint: self.position.or(self.hint),
            position: None,
            ..self
        }
    }

    pub(crate) fn resolved(self, position: Point) -> Self {
        Self {
            position: Some(position),
            ..self
        }
    }
}

/// Keep the first `count` trees as given and demote the rest to unknown,
/// keeping their coordinates as hints.
pub fn split_known(trees: Vec<Tree>, count: usize) -> Vec<Tree> {
    trees
        .into_iter()
        .enumerate()
        .map(|(index, tree)| if index < count { tree } else { tree.into_unknown() })
        .collect()
}

/// Measured distance between two trees. The pair is unordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceMeasurement {
    pub tree1: TreeId,
    pub tree2: TreeId,
    pub distance: f64,
}

impl DistanceMeasurement {
    pub fn new(tree1: impl Into<TreeId>, tree2: impl Into<TreeId>, distance: f64) -> Self {
        Self {
            tree1: tree1.into(),
            tree2: tree2.into(),
            distance,
        }
    }

    /// Whether either endpoint is `id`
    pub fn involves(&self, id: &TreeId) -> bool {
        self.tree1 == *id || self.tree2 == *id
    }

    /// The endpoint opposite to `id`, if `id` is an endpoint
    pub fn other(&self, id: &TreeId) -> Option<&TreeId> {
        if self.tree1 == *id {
            Some(&self.tree2)
        } else if self.tree2 == *id {
            Some(&self.tree1)
        } else {
            None
        }
    }

    /// Whether this measurement links `a` and `b` in either direction
    pub fn connects(&self, a: &TreeId, b: &TreeId) -> bool {
        (self.tree1 == *a && self.tree2 == *b) || (self.tree1 == *b && self.tree2 == *a)
    }

    pub fn is_self_referencing(&self) -> bool {
        self.tree1 == self.tree2
    }

    /// Endpoints in canonical (sorted) order, for pair-keyed lookups
    pub fn pair_key(&self) -> (TreeId, TreeId) {
        if self.tree1 <= self.tree2 {
            (self.tree1.clone(), self.tree2.clone())
        } else {
            (self.tree2.clone(), self.tree1.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_character_ids_are_padded() {
        assert_eq!(TreeId::new("7").as_str(), "07");
        assert_eq!(TreeId::new(" 7 ").as_str(), "07");
        assert_eq!(TreeId::new("12").as_str(), "12");
        assert_eq!(TreeId::new("A3b").as_str(), "A3b");
        assert!(TreeId::new("").is_empty());
    }

    #[test]
    fn test_padded_ids_sort_numerically() {
        let mut ids: Vec<TreeId> = ["12", "3", "10", "1"].iter().map(|s| TreeId::from(*s)).collect();
        ids.sort();
        let sorted: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
        assert_eq!(sorted, vec!["01", "03", "10", "12"]);
    }

    #[test]
    fn test_tree_id_serde_canonicalizes() {
        let id: TreeId = serde_json::from_str("\"5\"").unwrap();
        assert_eq!(id.as_str(), "05");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"05\"");
    }

    #[test]
    fn test_point_distances() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-12);
        assert!((a.distance_squared_to(&b) - 25.0).abs() < 1e-12);
        assert!(!Point::new(f64::NAN, 0.0).is_finite());
    }

    #[test]
    fn test_tree_into_unknown_keeps_hint() {
        let tree = Tree::known("4", Point::new(1.0, 2.0), "Oak").into_unknown();
        assert!(!tree.is_known());
        assert_eq!(tree.hint, Some(Point::new(1.0, 2.0)));
        assert_eq!(tree.id.as_str(), "04");
    }

    #[test]
    fn test_split_known_demotes_tail() {
        let trees = vec![
            Tree::known("1", Point::new(0.0, 0.0), "Oak"),
            Tree::known("2", Point::new(5.0, 0.0), "Beech"),
            Tree::unknown("3", "Birch"),
        ];
        let split = split_known(trees, 1);
        assert!(split[0].is_known());
        assert!(!split[1].is_known());
        assert_eq!(split[1].hint, Some(Point::new(5.0, 0.0)));
        assert!(!split[2].is_known());
        assert_eq!(split[2].hint, None);
    }

    #[test]
    fn test_measurement_endpoints() {
        let m = DistanceMeasurement::new("1", "2", 4.5);
        let one = TreeId::from("1");
        let two = TreeId::from("2");
        let three = TreeId::from("3");

        assert!(m.involves(&one));
        assert!(!m.involves(&three));
        assert_eq!(m.other(&one), Some(&two));
        assert_eq!(m.other(&two), Some(&one));
        assert_eq!(m.other(&three), None);
        assert!(m.connects(&two, &one));
        assert!(!m.is_self_referencing());
        assert_eq!(DistanceMeasurement::new("9", "2", 1.0).pair_key(), (TreeId::from("2"), TreeId::from("9")));
    }
}
