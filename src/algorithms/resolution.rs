//! Incremental multilateration of unknown trees
//!
//! The engine repeatedly picks one unknown tree, intersects the distance
//! circles around two of its known neighbours and, when the circles meet,
//! commits the chosen point and moves the tree into the known set. Trees that
//! cannot be resolved yet are skipped round-robin; the run fails only once
//! every remaining unknown tree has been tried without progress.

use crate::algorithms::circle_intersection::{intersect_circles_with_tolerance, CircleIntersection};
use crate::algorithms::disambiguation::{choose_point, CheckAnchor, DisambiguationPolicy, SelectionBasis};
use crate::core::{split_known, DistanceMeasurement, Point, Tree, TreeId, MIN_ANCHORS};
use crate::utils::config::{ConfigurationManager, ResolverConfig};
use crate::validation::data::DataValidator;
use crate::validation::error::{AttemptFailure, ResolutionError, ResolutionResult};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, warn};

/// Phases of one resolution run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Select,
    CheckConstraints,
    SolveGeometry,
    Commit,
    Success,
    FatalFail,
}

impl EngineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, EngineState::Success | EngineState::FatalFail)
    }
}

/// Known/unknown partition plus the retry counter
#[derive(Debug, Clone, Default)]
pub struct ResolutionState {
    known: BTreeMap<TreeId, Tree>,
    unknown: BTreeMap<TreeId, Tree>,
    fail_count: usize,
}

impl ResolutionState {
    /// Split trees by whether they carry a position.
    ///
    /// Ids must be unique; later duplicates overwrite earlier ones.
    pub fn from_trees(trees: Vec<Tree>) -> Self {
        let mut state = Self::default();
        for tree in trees {
            if tree.is_known() {
                state.known.insert(tree.id.clone(), tree);
            } else {
                state.unknown.insert(tree.id.clone(), tree);
            }
        }
        state
    }

    pub fn known(&self) -> &BTreeMap<TreeId, Tree> {
        &self.known
    }

    pub fn unknown(&self) -> &BTreeMap<TreeId, Tree> {
        &self.unknown
    }

    pub fn fail_count(&self) -> usize {
        self.fail_count
    }

    /// Number of trees across both sets
    pub fn universe_len(&self) -> usize {
        self.known.len() + self.unknown.len()
    }

    /// Whether no id is in both sets
    pub fn is_disjoint(&self) -> bool {
        self.known.keys().all(|id| !self.unknown.contains_key(id))
    }

    pub fn position_of(&self, id: &TreeId) -> Option<Point> {
        self.known.get(id).and_then(|tree| tree.position)
    }

    /// Unknown ids in ascending order
    pub fn unresolved_ids(&self) -> Vec<TreeId> {
        self.unknown.keys().cloned().collect()
    }

    /// Known trees in ascending id order
    pub fn known_trees(&self) -> Vec<Tree> {
        self.known.values().cloned().collect()
    }

    /// The unknown tree at `index` in ascending id order
    fn candidate(&self, index: usize) -> Option<&Tree> {
        self.unknown.values().nth(index)
    }

    fn commit(&mut self, id: &TreeId, position: Point) {
        if let Some(tree) = self.unknown.remove(id) {
            self.known.insert(id.clone(), tree.resolved(position));
        }
        self.fail_count = 0;
    }

    fn defer(&mut self) {
        self.fail_count += 1;
    }
}

/// What one call to [`ResolutionEngine::step`] did
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// A tree was positioned and moved to the known set
    Committed {
        tree_id: TreeId,
        position: Point,
        anchors: (TreeId, TreeId),
        basis: SelectionBasis,
    },
    /// The candidate was skipped; `fail_count` is the counter after the skip
    Deferred {
        failure: AttemptFailure,
        fail_count: usize,
    },
    /// No unknown trees remain
    Finished,
    /// Every remaining candidate has been tried without progress
    Exhausted { unresolved: Vec<TreeId> },
}

impl StepOutcome {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StepOutcome::Finished | StepOutcome::Exhausted { .. })
    }

    pub fn tree_id(&self) -> Option<&TreeId> {
        match self {
            StepOutcome::Committed { tree_id, .. } => Some(tree_id),
            StepOutcome::Deferred { failure, .. } => Some(failure.tree_id()),
            StepOutcome::Finished | StepOutcome::Exhausted { .. } => None,
        }
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepOutcome::Committed { tree_id, position, anchors, basis } => write!(
                f,
                "Resolved tree {} at ({:.2}, {:.2}) from anchors {} and {} ({})",
                tree_id, position.x, position.y, anchors.0, anchors.1, basis
            ),
            StepOutcome::Deferred { failure, fail_count } => {
                write!(f, "{}; deferred (fail count {})", failure, fail_count)
            }
            StepOutcome::Finished => write!(f, "Success: all trees have been processed"),
            StepOutcome::Exhausted { unresolved } => {
                let ids: Vec<&str> = unresolved.iter().map(|id| id.as_str()).collect();
                write!(f, "Error: fail count exceeds the number of unknown trees; unresolved: {}", ids.join(", "))
            }
        }
    }
}

/// Fully resolved set of trees
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLayout {
    /// All trees, sorted by id, each with a position
    pub trees: Vec<Tree>,
    /// Trees positioned during this run
    pub resolved_count: usize,
    /// Candidate evaluations performed, deferrals included
    pub evaluations: usize,
}

impl ResolvedLayout {
    pub fn get(&self, id: &TreeId) -> Option<&Tree> {
        self.trees.iter().find(|tree| tree.id == *id)
    }
}

/// Candidate's known neighbours, in ascending id order, with the first
/// measured distance to each
struct Anchors {
    entries: Vec<(TreeId, f64)>,
}

impl Anchors {
    fn ids(&self) -> Vec<TreeId> {
        self.entries.iter().map(|(id, _)| id.clone()).collect()
    }
}

/// Drives one resolution run over an exclusively owned partition
#[derive(Debug, Clone)]
pub struct ResolutionEngine {
    state: ResolutionState,
    measurements: Vec<DistanceMeasurement>,
    policy: DisambiguationPolicy,
    tolerance: f64,
    phase: EngineState,
    history: Vec<StepOutcome>,
}

impl ResolutionEngine {
    /// Create an engine with the default configuration
    pub fn new(trees: Vec<Tree>, measurements: Vec<DistanceMeasurement>) -> ResolutionResult<Self> {
        Self::with_config(trees, measurements, &ResolverConfig::default())
    }

    /// Validate the configuration and records and set up the initial partition
    pub fn with_config(
        trees: Vec<Tree>,
        measurements: Vec<DistanceMeasurement>,
        config: &ResolverConfig,
    ) -> ResolutionResult<Self> {
        ConfigurationManager::new()
            .check_config(config)
            .map_err(|error| ResolutionError::InvalidConfig { error })?;

        let trees = match config.known_count {
            Some(count) => split_known(trees, count),
            None => trees,
        };

        let validator = if config.strict_validation {
            DataValidator::strict()
        } else {
            DataValidator::new()
        };
        let report = validator.validate(&trees, &measurements);
        if !validator.accepts(&report) {
            let issues = if validator.is_strict() {
                report.issues
            } else {
                report.errors().cloned().collect()
            };
            return Err(ResolutionError::InvalidInput { issues });
        }

        let state = ResolutionState::from_trees(trees);
        info!(
            known = state.known.len(),
            unknown = state.unknown.len(),
            measurements = measurements.len(),
            policy = %config.disambiguation,
            "resolution engine initialised"
        );

        Ok(Self {
            state,
            measurements,
            policy: config.disambiguation,
            tolerance: config.tolerance,
            phase: EngineState::Select,
            history: Vec::new(),
        })
    }

    pub fn state(&self) -> &ResolutionState {
        &self.state
    }

    /// Phase between steps.
    ///
    /// A step runs CHECK_CONSTRAINTS, SOLVE_GEOMETRY and COMMIT internally, so
    /// between calls this reports `Select` or one of the terminal phases.
    pub fn phase(&self) -> EngineState {
        self.phase
    }

    pub fn measurements(&self) -> &[DistanceMeasurement] {
        &self.measurements
    }

    /// Every outcome produced so far, in order
    pub fn history(&self) -> &[StepOutcome] {
        &self.history
    }

    /// Evaluate one candidate (or detect termination).
    ///
    /// Stepping an engine that already terminated reports the terminal
    /// outcome again without recording it.
    pub fn step(&mut self) -> StepOutcome {
        match self.phase {
            EngineState::Success => return StepOutcome::Finished,
            EngineState::FatalFail => {
                return StepOutcome::Exhausted {
                    unresolved: self.state.unresolved_ids(),
                }
            }
            _ => {}
        }

        let outcome = self.evaluate();
        self.history.push(outcome.clone());
        outcome
    }

    /// Step until the run terminates.
    pub fn run(&mut self) -> ResolutionResult<ResolvedLayout> {
        loop {
            match self.step() {
                StepOutcome::Finished => return Ok(self.layout()),
                StepOutcome::Exhausted { unresolved } => {
                    return Err(ResolutionError::ExhaustedCandidates {
                        resolved: self.state.known_trees(),
                        unresolved,
                    })
                }
                StepOutcome::Committed { .. } | StepOutcome::Deferred { .. } => {}
            }
        }
    }

    fn layout(&self) -> ResolvedLayout {
        let resolved_count = self
            .history
            .iter()
            .filter(|outcome| matches!(outcome, StepOutcome::Committed { .. }))
            .count();
        let evaluations = self
            .history
            .iter()
            .filter(|outcome| !outcome.is_terminal())
            .count();

        ResolvedLayout {
            trees: self.state.known_trees(),
            resolved_count,
            evaluations,
        }
    }

    fn evaluate(&mut self) -> StepOutcome {
        // SELECT
        self.phase = EngineState::Select;
        if self.state.unknown.is_empty() {
            self.phase = EngineState::Success;
            info!(known = self.state.known.len(), "all trees resolved");
            return StepOutcome::Finished;
        }

        let fail_count = self.state.fail_count;
        let candidate = match self.state.candidate(fail_count) {
            Some(tree) => tree.clone(),
            None => {
                self.phase = EngineState::FatalFail;
                let unresolved = self.state.unresolved_ids();
                warn!(
                    fail_count,
                    unresolved = unresolved.len(),
                    "every remaining tree was tried without progress"
                );
                return StepOutcome::Exhausted { unresolved };
            }
        };
        debug!(tree = %candidate.id, fail_count, "selected candidate");

        // CHECK_CONSTRAINTS
        self.phase = EngineState::CheckConstraints;
        let anchors = self.anchors_for(&candidate.id);
        if anchors.entries.len() < MIN_ANCHORS {
            return self.defer(AttemptFailure::UnderConstrained {
                tree_id: candidate.id.clone(),
                anchors: anchors.ids(),
            });
        }

        // SOLVE_GEOMETRY
        self.phase = EngineState::SolveGeometry;
        let (id_a, radius_a) = anchors.entries[0].clone();
        let (id_b, radius_b) = anchors.entries[1].clone();
        let (center_a, center_b) = match (self.state.position_of(&id_a), self.state.position_of(&id_b)) {
            (Some(a), Some(b)) => (a, b),
            // Anchors are drawn from the known set, which always carries positions
            _ => {
                return self.defer(AttemptFailure::UnderConstrained {
                    tree_id: candidate.id.clone(),
                    anchors: anchors.ids(),
                })
            }
        };

        let intersection =
            intersect_circles_with_tolerance(&center_a, radius_a, &center_b, radius_b, self.tolerance);

        let (position, basis) = match intersection {
            CircleIntersection::Empty => {
                return self.defer(AttemptFailure::NoGeometricSolution {
                    tree_id: candidate.id.clone(),
                    anchor_a: id_a,
                    anchor_b: id_b,
                    radius_a,
                    radius_b,
                    anchor_separation: center_a.distance_to(&center_b),
                });
            }
            CircleIntersection::Tangent(point) => (point, SelectionBasis::Tangent),
            CircleIntersection::Pair(first, second) => {
                let check = anchors.entries.get(2).and_then(|(id, distance)| {
                    self.state.position_of(id).map(|position| CheckAnchor {
                        id: id.clone(),
                        position,
                        distance: *distance,
                    })
                });
                choose_point(self.policy, first, second, candidate.hint.as_ref(), check.as_ref())
            }
        };

        // COMMIT
        self.phase = EngineState::Commit;
        self.state.commit(&candidate.id, position);
        self.phase = EngineState::Select;
        info!(
            tree = %candidate.id,
            x = position.x,
            y = position.y,
            anchor_a = %id_a,
            anchor_b = %id_b,
            basis = %basis,
            "tree resolved"
        );

        StepOutcome::Committed {
            tree_id: candidate.id,
            position,
            anchors: (id_a, id_b),
            basis,
        }
    }

    fn defer(&mut self, failure: AttemptFailure) -> StepOutcome {
        self.state.defer();
        self.phase = EngineState::Select;
        debug!(reason = %failure, fail_count = self.state.fail_count, "candidate deferred");
        StepOutcome::Deferred {
            failure,
            fail_count: self.state.fail_count,
        }
    }

    /// Known neighbours of `candidate`, deduplicated and sorted by id. Each
    /// keeps the distance of the first measurement (input order) linking it.
    fn anchors_for(&self, candidate: &TreeId) -> Anchors {
        let mut entries: BTreeMap<TreeId, f64> = BTreeMap::new();
        for m in &self.measurements {
            let other = match m.other(candidate) {
                Some(other) if other != candidate => other,
                _ => continue,
            };
            if self.state.known.contains_key(other) && !entries.contains_key(other) {
                entries.insert(other.clone(), m.distance);
            }
        }

        Anchors {
            entries: entries.into_iter().collect(),
        }
    }
}

/// Resolve every unknown tree in one call
pub fn resolve(
    trees: Vec<Tree>,
    measurements: Vec<DistanceMeasurement>,
    config: &ResolverConfig,
) -> ResolutionResult<ResolvedLayout> {
    ResolutionEngine::with_config(trees, measurements, config)?.run()
}
