//! Numerical constants and resolution parameters

/// Default absolute tolerance for geometric comparisons (meters)
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

/// Number of known anchors needed to intersect two distance circles
pub const MIN_ANCHORS: usize = 2;

/// Width that single-character tree identifiers are zero-padded to
pub const CANONICAL_ID_WIDTH: usize = 2;
