use crate::core::{DistanceMeasurement, Tree, TreeId, DEFAULT_TOLERANCE};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::warn;

/// How much an input issue matters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The run cannot start
    Error,
    /// The run can proceed, but results may be surprising
    Warning,
}

/// Problems found in the tree and measurement records before a run
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    DuplicateTree { tree_id: TreeId },
    EmptyTreeId { name: String },
    InvalidCoordinate { tree_id: TreeId },
    InvalidDistance { tree1: TreeId, tree2: TreeId, distance: f64 },
    SelfReference { tree_id: TreeId },
    UnknownTreeReference { tree_id: TreeId },
    ConflictingMeasurements { tree1: TreeId, tree2: TreeId, first: f64, second: f64 },
    IsolatedTree { tree_id: TreeId },
}

impl ValidationError {
    pub fn severity(&self) -> Severity {
        match self {
            ValidationError::DuplicateTree { .. }
            | ValidationError::EmptyTreeId { .. }
            | ValidationError::InvalidCoordinate { .. }
            | ValidationError::InvalidDistance { .. }
            | ValidationError::SelfReference { .. } => Severity::Error,
            ValidationError::UnknownTreeReference { .. }
            | ValidationError::ConflictingMeasurements { .. }
            | ValidationError::IsolatedTree { .. } => Severity::Warning,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::DuplicateTree { tree_id } => {
                write!(f, "Duplicate tree ID: {}", tree_id)
            }
            ValidationError::EmptyTreeId { name } => {
                write!(f, "Tree '{}' has an empty ID", name)
            }
            ValidationError::InvalidCoordinate { tree_id } => {
                write!(f, "Non-finite coordinate for tree {}", tree_id)
            }
            ValidationError::InvalidDistance { tree1, tree2, distance } => {
                write!(f, "Invalid distance between {} and {}: {}", tree1, tree2, distance)
            }
            ValidationError::SelfReference { tree_id } => {
                write!(f, "Measurement links tree {} to itself", tree_id)
            }
            ValidationError::UnknownTreeReference { tree_id } => {
                write!(f, "Measurement references tree {} which is not in the tree list", tree_id)
            }
            ValidationError::ConflictingMeasurements { tree1, tree2, first, second } => {
                write!(
                    f,
                    "Conflicting distances between {} and {}: {:.2} and {:.2} (the first is used)",
                    tree1, tree2, first, second
                )
            }
            ValidationError::IsolatedTree { tree_id } => {
                write!(f, "Unknown tree {} has no measurements", tree_id)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Outcome of validating one set of input records
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub issues: Vec<ValidationError>,
}

impl ValidationReport {
    pub fn errors(&self) -> impl Iterator<Item = &ValidationError> {
        self.issues.iter().filter(|issue| issue.severity() == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationError> {
        self.issues.iter().filter(|issue| issue.severity() == Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Structural checks on tree and measurement records
#[derive(Debug, Clone)]
pub struct DataValidator {
    /// Treat warnings as errors
    strict: bool,
}

impl Default for DataValidator {
    fn default() -> Self {
        Self { strict: false }
    }
}

impl DataValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strict() -> Self {
        Self { strict: true }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Whether a run may start with the records behind `report`
    pub fn accepts(&self, report: &ValidationReport) -> bool {
        if self.strict {
            report.is_clean()
        } else {
            !report.has_errors()
        }
    }

    pub fn validate(&self, trees: &[Tree], measurements: &[DistanceMeasurement]) -> ValidationReport {
        let mut report = ValidationReport::default();
        let mut seen: HashSet<&TreeId> = HashSet::new();

        for tree in trees {
            if tree.id.is_empty() {
                report.issues.push(ValidationError::EmptyTreeId { name: tree.name.clone() });
            }
            if !seen.insert(&tree.id) {
                report.issues.push(ValidationError::DuplicateTree { tree_id: tree.id.clone() });
            }
            if tree.position.map_or(false, |p| !p.is_finite()) {
                report.issues.push(ValidationError::InvalidCoordinate { tree_id: tree.id.clone() });
            }
        }

        let mut first_distance: HashMap<(TreeId, TreeId), f64> = HashMap::new();
        let mut reported_missing: HashSet<&TreeId> = HashSet::new();

        for m in measurements {
            if !m.distance.is_finite() || m.distance < 0.0 {
                report.issues.push(ValidationError::InvalidDistance {
                    tree1: m.tree1.clone(),
                    tree2: m.tree2.clone(),
                    distance: m.distance,
                });
            }
            if m.is_self_referencing() {
                report.issues.push(ValidationError::SelfReference { tree_id: m.tree1.clone() });
            }

            for endpoint in [&m.tree1, &m.tree2] {
                if !seen.contains(endpoint) && reported_missing.insert(endpoint) {
                    report.issues.push(ValidationError::UnknownTreeReference { tree_id: endpoint.clone() });
                }
            }

            let key = m.pair_key();
            match first_distance.get(&key) {
                Some(&first) if (first - m.distance).abs() > DEFAULT_TOLERANCE => {
                    report.issues.push(ValidationError::ConflictingMeasurements {
                        tree1: key.0.clone(),
                        tree2: key.1.clone(),
                        first,
                        second: m.distance,
                    });
                }
                Some(_) => {}
                None => {
                    first_distance.insert(key, m.distance);
                }
            }
        }

        for tree in trees.iter().filter(|t| !t.is_known()) {
            if !measurements.iter().any(|m| m.involves(&tree.id)) {
                report.issues.push(ValidationError::IsolatedTree { tree_id: tree.id.clone() });
            }
        }

        for warning in report.warnings() {
            warn!(issue = %warning, "input warning");
        }

        report
    }
}

/// Validate records with the default (non-strict) validator
pub fn validate_input(trees: &[Tree], measurements: &[DistanceMeasurement]) -> ValidationReport {
    DataValidator::new().validate(trees, measurements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Point;

    fn sample_trees() -> Vec<Tree> {
        vec![
            Tree::known("1", Point::new(0.0, 0.0), "Oak"),
            Tree::known("2", Point::new(10.0, 0.0), "Beech"),
            Tree::unknown("3", "Birch"),
        ]
    }

    #[test]
    fn test_clean_input() {
        let measurements = vec![
            DistanceMeasurement::new("1", "3", 10.0),
            DistanceMeasurement::new("2", "3", 10.0),
        ];
        let report = validate_input(&sample_trees(), &measurements);
        assert!(report.is_clean());
        assert!(DataValidator::new().accepts(&report));
    }

    #[test]
    fn test_duplicate_and_invalid_records_are_errors() {
        let mut trees = sample_trees();
        trees.push(Tree::unknown("03", "Another birch"));
        trees.push(Tree::known("4", Point::new(f64::NAN, 1.0), "Broken"));
        let measurements = vec![
            DistanceMeasurement::new("1", "3", -2.0),
            DistanceMeasurement::new("3", "3", 1.0),
        ];

        let report = DataValidator::new().validate(&trees, &measurements);
        let errors: Vec<_> = report.errors().collect();
        assert!(errors.contains(&&ValidationError::DuplicateTree { tree_id: TreeId::from("3") }));
        assert!(errors.contains(&&ValidationError::InvalidCoordinate { tree_id: TreeId::from("4") }));
        assert!(errors.contains(&&ValidationError::SelfReference { tree_id: TreeId::from("3") }));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidDistance { .. })));
        assert!(!DataValidator::new().accepts(&report));
    }

    #[test]
    fn test_warnings_only_block_strict_runs() {
        let measurements = vec![
            DistanceMeasurement::new("1", "3", 10.0),
            DistanceMeasurement::new("3", "1", 12.0),
            DistanceMeasurement::new("9", "3", 4.0),
        ];
        let report = DataValidator::new().validate(&sample_trees(), &measurements);

        assert!(!report.has_errors());
        assert_eq!(report.warnings().count(), 2);
        assert!(DataValidator::new().accepts(&report));
        assert!(!DataValidator::strict().accepts(&report));
    }

    #[test]
    fn test_isolated_unknown_tree_is_flagged() {
        let report = DataValidator::new().validate(&sample_trees(), &[]);
        let warnings: Vec<_> = report.warnings().collect();
        assert_eq!(warnings, vec![&ValidationError::IsolatedTree { tree_id: TreeId::from("3") }]);
    }
}
