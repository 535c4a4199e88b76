//! Circle-circle intersection for two distance constraints
//!
//! A measured distance `r` from a known tree at `c` constrains the unknown tree
//! to the circle of radius `r` around `c`. Two such circles meet in zero, one
//! or two points.

use crate::core::{Point, DEFAULT_TOLERANCE};
use nalgebra::Vector2;

/// Result of intersecting two circles
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CircleIntersection {
    /// Circles are disjoint, nested, or share a center
    Empty,
    /// Circles touch in exactly one point
    Tangent(Point),
    /// Circles cross in two points, left and right of the A→B line
    Pair(Point, Point),
}

impl CircleIntersection {
    pub fn is_empty(&self) -> bool {
        matches!(self, CircleIntersection::Empty)
    }

    pub fn len(&self) -> usize {
        match self {
            CircleIntersection::Empty => 0,
            CircleIntersection::Tangent(_) => 1,
            CircleIntersection::Pair(_, _) => 2,
        }
    }

    pub fn points(&self) -> Vec<Point> {
        match *self {
            CircleIntersection::Empty => Vec::new(),
            CircleIntersection::Tangent(p) => vec![p],
            CircleIntersection::Pair(p, q) => vec![p, q],
        }
    }
}

/// Intersect two circles using the default tolerance
pub fn intersect_circles(
    center_a: &Point,
    radius_a: f64,
    center_b: &Point,
    radius_b: f64,
) -> CircleIntersection {
    intersect_circles_with_tolerance(center_a, radius_a, center_b, radius_b, DEFAULT_TOLERANCE)
}

/// Intersect two circles.
///
/// `tolerance` is an absolute slack (meters) applied to the containment and
/// separation tests, to the coincident-center test, and to the half-chord
/// length below which the circles are reported as tangent. A negative or
/// non-finite tolerance yields `Empty`.
pub fn intersect_circles_with_tolerance(
    center_a: &Point,
    radius_a: f64,
    center_b: &Point,
    radius_b: f64,
    tolerance: f64,
) -> CircleIntersection {
    if !tolerance.is_finite() || tolerance < 0.0 {
        return CircleIntersection::Empty;
    }
    if !center_a.is_finite() || !center_b.is_finite() {
        return CircleIntersection::Empty;
    }
    if !(radius_a.is_finite() && radius_b.is_finite()) || radius_a < 0.0 || radius_b < 0.0 {
        return CircleIntersection::Empty;
    }

    let a_vec = center_a.to_vector();
    let delta = center_b.to_vector() - a_vec;
    let d = delta.norm();

    // Coincident centers: infinitely many solutions or none
    if d <= tolerance {
        return CircleIntersection::Empty;
    }
    if d > radius_a + radius_b + tolerance {
        return CircleIntersection::Empty;
    }
    if d < (radius_a - radius_b).abs() - tolerance {
        return CircleIntersection::Empty;
    }

    // Signed distance from A to the chord's foot along A→B
    let a = (radius_a * radius_a - radius_b * radius_b + d * d) / (2.0 * d);
    let h_sq = radius_a * radius_a - a * a;
    let h = if h_sq > 0.0 { h_sq.sqrt() } else { 0.0 };

    let unit = delta / d;
    let foot = a_vec + unit * a;

    if h <= tolerance {
        return CircleIntersection::Tangent(Point::from_vector(&foot));
    }

    let perp = Vector2::new(-unit.y, unit.x);
    CircleIntersection::Pair(
        Point::from_vector(&(foot + perp * h)),
        Point::from_vector(&(foot - perp * h)),
    )
}
