//! Choosing between the two mirror-image solutions of a circle intersection

use crate::core::{Point, TreeId};
use crate::utils::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Rule used to pick one of two intersection points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisambiguationPolicy {
    /// Smaller y wins, then smaller x
    LowerY,
    /// Nearest to the candidate's approximate input coordinate
    Hint,
    /// Best agreement with the measured distance to a third known anchor
    #[default]
    ThirdAnchor,
}

impl DisambiguationPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            DisambiguationPolicy::LowerY => "lower-y",
            DisambiguationPolicy::Hint => "hint",
            DisambiguationPolicy::ThirdAnchor => "third-anchor",
        }
    }
}

impl fmt::Display for DisambiguationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DisambiguationPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lower-y" | "lowery" | "lower_y" => Ok(DisambiguationPolicy::LowerY),
            "hint" => Ok(DisambiguationPolicy::Hint),
            "third-anchor" | "thirdanchor" | "third_anchor" => Ok(DisambiguationPolicy::ThirdAnchor),
            other => Err(ConfigError::InvalidParameter {
                parameter: "disambiguation".to_string(),
                value: other.to_string(),
                reason: "Expected one of lower-y, hint, third-anchor".to_string(),
            }),
        }
    }
}

/// A known tree beyond the two solving anchors, with its measured distance
#[derive(Debug, Clone, PartialEq)]
pub struct CheckAnchor {
    pub id: TreeId,
    pub position: Point,
    pub distance: f64,
}

/// What a committed position was decided on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SelectionBasis {
    /// The circles touched in a single point
    Tangent,
    LowerY,
    Hint,
    ThirdAnchor(TreeId),
}

impl fmt::Display for SelectionBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionBasis::Tangent => write!(f, "tangent"),
            SelectionBasis::LowerY => write!(f, "lower-y"),
            SelectionBasis::Hint => write!(f, "hint"),
            SelectionBasis::ThirdAnchor(id) => write!(f, "third anchor {}", id),
        }
    }
}

/// Pick one of two intersection points under `policy`.
///
/// Policies that lack their reference data (no hint, no third anchor) or end
/// in an exact tie fall back to [`DisambiguationPolicy::LowerY`].
pub fn choose_point(
    policy: DisambiguationPolicy,
    first: Point,
    second: Point,
    hint: Option<&Point>,
    check: Option<&CheckAnchor>,
) -> (Point, SelectionBasis) {
    match policy {
        DisambiguationPolicy::LowerY => {}
        DisambiguationPolicy::Hint => {
            if let Some(reference) = hint {
                let cost_first = first.distance_squared_to(reference);
                let cost_second = second.distance_squared_to(reference);
                if let Some(point) = strictly_cheaper(first, cost_first, second, cost_second) {
                    return (point, SelectionBasis::Hint);
                }
            }
        }
        DisambiguationPolicy::ThirdAnchor => {
            if let Some(anchor) = check {
                let cost_first = squared_residual(&first, anchor);
                let cost_second = squared_residual(&second, anchor);
                if let Some(point) = strictly_cheaper(first, cost_first, second, cost_second) {
                    return (point, SelectionBasis::ThirdAnchor(anchor.id.clone()));
                }
            }
        }
    }

    (lower_y(first, second), SelectionBasis::LowerY)
}

/// Smaller y, then smaller x
pub fn lower_y(first: Point, second: Point) -> Point {
    let ordering = first
        .y
        .partial_cmp(&second.y)
        .unwrap_or(Ordering::Equal)
        .then(first.x.partial_cmp(&second.x).unwrap_or(Ordering::Equal));

    match ordering {
        Ordering::Greater => second,
        _ => first,
    }
}

fn squared_residual(point: &Point, anchor: &CheckAnchor) -> f64 {
    (point.distance_to(&anchor.position) - anchor.distance).powi(2)
}

fn strictly_cheaper(first: Point, cost_first: f64, second: Point, cost_second: f64) -> Option<Point> {
    if cost_first < cost_second {
        Some(first)
    } else if cost_second < cost_first {
        Some(second)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upper() -> Point {
        Point::new(5.0, 8.66)
    }

    fn lower() -> Point {
        Point::new(5.0, -8.66)
    }

    #[test]
    fn test_lower_y_prefers_smaller_y_then_x() {
        assert_eq!(lower_y(upper(), lower()), lower());
        assert_eq!(lower_y(lower(), upper()), lower());
        assert_eq!(lower_y(Point::new(3.0, 1.0), Point::new(-3.0, 1.0)), Point::new(-3.0, 1.0));
    }

    #[test]
    fn test_hint_policy_uses_nearest_point() {
        let hint = Point::new(4.0, 9.0);
        let (point, basis) = choose_point(DisambiguationPolicy::Hint, lower(), upper(), Some(&hint), None);
        assert_eq!(point, upper());
        assert_eq!(basis, SelectionBasis::Hint);
    }

    #[test]
    fn test_hint_policy_without_hint_falls_back() {
        let (point, basis) = choose_point(DisambiguationPolicy::Hint, upper(), lower(), None, None);
        assert_eq!(point, lower());
        assert_eq!(basis, SelectionBasis::LowerY);
    }

    #[test]
    fn test_third_anchor_policy_matches_measured_distance() {
        let check = CheckAnchor {
            id: TreeId::from("3"),
            position: Point::new(5.0, 20.0),
            distance: 11.34,
        };
        let (point, basis) = choose_point(DisambiguationPolicy::ThirdAnchor, lower(), upper(), None, Some(&check));
        assert_eq!(point, upper());
        assert_eq!(basis, SelectionBasis::ThirdAnchor(TreeId::from("03")));
    }

    #[test]
    fn test_third_anchor_on_symmetry_axis_is_a_tie() {
        // Anchor on the line through both solving anchors sees both points at equal range
        let check = CheckAnchor {
            id: TreeId::from("3"),
            position: Point::new(20.0, 0.0),
            distance: 17.32,
        };
        let (point, basis) = choose_point(DisambiguationPolicy::ThirdAnchor, upper(), lower(), None, Some(&check));
        assert_eq!(point, lower());
        assert_eq!(basis, SelectionBasis::LowerY);
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("lower-y".parse::<DisambiguationPolicy>().unwrap(), DisambiguationPolicy::LowerY);
        assert_eq!("Third_Anchor".parse::<DisambiguationPolicy>().unwrap(), DisambiguationPolicy::ThirdAnchor);
        assert!("closest".parse::<DisambiguationPolicy>().is_err());
        assert_eq!(DisambiguationPolicy::default(), DisambiguationPolicy::ThirdAnchor);
    }
}
