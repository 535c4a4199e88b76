//! Resolution error types

use crate::core::{Tree, TreeId};
use crate::utils::config::ConfigError;
use crate::validation::data::ValidationError;
use std::fmt;

/// Why a single candidate could not be resolved on this attempt.
///
/// These never escape a run; the engine defers the candidate and moves on.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptFailure {
    /// Fewer than two known anchors are linked to the candidate
    UnderConstrained {
        tree_id: TreeId,
        anchors: Vec<TreeId>,
    },
    /// The two anchor circles do not meet in a usable point
    NoGeometricSolution {
        tree_id: TreeId,
        anchor_a: TreeId,
        anchor_b: TreeId,
        radius_a: f64,
        radius_b: f64,
        anchor_separation: f64,
    },
}

impl AttemptFailure {
    pub fn tree_id(&self) -> &TreeId {
        match self {
            AttemptFailure::UnderConstrained { tree_id, .. } => tree_id,
            AttemptFailure::NoGeometricSolution { tree_id, .. } => tree_id,
        }
    }
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptFailure::UnderConstrained { tree_id, anchors } => {
                write!(f, "Tree {} is under-constrained: {} known anchor(s)", tree_id, anchors.len())
            }
            AttemptFailure::NoGeometricSolution {
                tree_id,
                anchor_a,
                anchor_b,
                radius_a,
                radius_b,
                anchor_separation,
            } => write!(
                f,
                "No position for tree {}: circles around {} (r={:.2}) and {} (r={:.2}) {:.2} m apart do not intersect",
                tree_id, anchor_a, radius_a, anchor_b, radius_b, anchor_separation
            ),
        }
    }
}

/// Errors surfaced to the caller of a resolution run
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionError {
    /// Every unknown tree was tried without progress
    ExhaustedCandidates {
        /// Known trees at the time the run stopped, sorted by id
        resolved: Vec<Tree>,
        /// Trees that are still unknown, sorted by id
        unresolved: Vec<TreeId>,
    },
    /// The input records are structurally unusable
    InvalidInput { issues: Vec<ValidationError> },
    /// The resolver configuration is unusable, e.g. a non-finite tolerance
    InvalidConfig { error: ConfigError },
}

impl ResolutionError {
    /// Whether a partial layout is available
    pub fn is_partial(&self) -> bool {
        matches!(self, ResolutionError::ExhaustedCandidates { .. })
    }
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionError::ExhaustedCandidates { resolved, unresolved } => {
                let ids: Vec<&str> = unresolved.iter().map(|id| id.as_str()).collect();
                write!(
                    f,
                    "Unable to resolve {} tree(s) [{}] after exhausting all candidates ({} known)",
                    unresolved.len(),
                    ids.join(", "),
                    resolved.len()
                )
            }
            ResolutionError::InvalidInput { issues } => {
                write!(f, "Invalid input: {} issue(s)", issues.len())?;
                for issue in issues {
                    write!(f, "; {}", issue)?;
                }
                Ok(())
            }
            ResolutionError::InvalidConfig { error } => write!(f, "Invalid configuration: {}", error),
        }
    }
}

impl std::error::Error for ResolutionError {}

/// Result type for resolution runs
pub type ResolutionResult<T> = Result<T, ResolutionError>;
