//! Tree Multilateration
//!
//! Infers 2D positions of surveyed trees from pairwise distance measurements
//! by incrementally intersecting distance circles around trees whose
//! positions are already known.

pub mod core;
pub mod algorithms;
pub mod processing;
pub mod validation;
pub mod utils;
pub mod api;

// Re-export commonly used types
pub use crate::core::{DistanceMeasurement, Point, Tree, TreeId, DEFAULT_TOLERANCE};
pub use algorithms::{
    intersect_circles, resolve, CircleIntersection, DisambiguationPolicy, EngineState, ResolutionEngine,
    ResolvedLayout, StepOutcome,
};
pub use processing::{ParseError, RecordParser};
pub use validation::{AttemptFailure, ResolutionError, ResolutionResult};
pub use utils::{ConfigError, ConfigurationManager, ResolverConfig};
pub use api::{LayoutReport, OutputFormat, ReportBuilder};
