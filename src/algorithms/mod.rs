//! Positioning algorithms

pub mod circle_intersection;
pub mod disambiguation;
pub mod resolution;

pub use circle_intersection::{intersect_circles, intersect_circles_with_tolerance, CircleIntersection};
pub use disambiguation::{choose_point, DisambiguationPolicy, SelectionBasis};
pub use resolution::{resolve, EngineState, ResolutionEngine, ResolutionState, ResolvedLayout, StepOutcome};
