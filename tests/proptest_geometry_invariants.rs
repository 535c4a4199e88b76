//! Property checks for circle intersection and the resolution partition.

use multilateration::{
    intersect_circles, CircleIntersection, DistanceMeasurement, Point, ResolutionEngine, StepOutcome, Tree,
};
use proptest::prelude::*;

fn circle_error(point: &Point, center: &Point, radius: f64) -> f64 {
    (point.distance_to(center) - radius).abs()
}

proptest! {
    #[test]
    fn crossing_circles_meet_on_both_rims(
        ra in 0.1f64..100.0,
        rb in 0.1f64..100.0,
        t in 0.05f64..0.95,
        angle in 0.0f64..std::f64::consts::TAU,
        cx in -500.0f64..500.0,
        cy in -500.0f64..500.0,
    ) {
        let low = (ra - rb).abs();
        let high = ra + rb;
        let d = low + (high - low) * t;
        prop_assume!(d > 1e-3);

        let a = Point::new(cx, cy);
        let b = Point::new(cx + d * angle.cos(), cy + d * angle.sin());
        let result = intersect_circles(&a, ra, &b, rb);
        prop_assert!(!result.is_empty());

        let slack = 1e-6 * ra.max(rb).max(1.0);
        for point in result.points() {
            prop_assert!(circle_error(&point, &a, ra) < slack);
            prop_assert!(circle_error(&point, &b, rb) < slack);
        }
    }

    #[test]
    fn separated_circles_do_not_meet(
        ra in 0.1f64..50.0,
        rb in 0.1f64..50.0,
        gap in 0.01f64..50.0,
        angle in 0.0f64..std::f64::consts::TAU,
    ) {
        let d = ra + rb + gap;
        let a = Point::new(0.0, 0.0);
        let b = Point::new(d * angle.cos(), d * angle.sin());
        prop_assert_eq!(intersect_circles(&a, ra, &b, rb), CircleIntersection::Empty);
    }

    #[test]
    fn nested_circles_do_not_meet(
        inner in 0.1f64..50.0,
        margin in 0.01f64..50.0,
        offset in 0.0f64..1.0,
        angle in 0.0f64..std::f64::consts::TAU,
    ) {
        let outer = inner + margin + 1.0;
        // Center gap strictly below outer - inner
        let d = (margin + 1.0) * offset * 0.99;
        let a = Point::new(0.0, 0.0);
        let b = Point::new(d * angle.cos(), d * angle.sin());
        prop_assert_eq!(intersect_circles(&a, outer, &b, inner), CircleIntersection::Empty);
    }

    #[test]
    fn engine_preserves_partition_and_bounds_fail_count(
        unknown in 1usize..6,
        links in prop::collection::vec((0usize..8, 0usize..8, 1.0f64..20.0), 0..16),
    ) {
        let mut trees = vec![
            Tree::known("K1", Point::new(0.0, 0.0), "Anchor"),
            Tree::known("K2", Point::new(10.0, 0.0), "Anchor"),
        ];
        for index in 0..unknown {
            trees.push(Tree::unknown(format!("U{}", index), "Target"));
        }
        let ids: Vec<String> = trees.iter().map(|tree| tree.id.to_string()).collect();
        let measurements: Vec<DistanceMeasurement> = links
            .iter()
            .map(|&(a, b, distance)| (ids[a % ids.len()].clone(), ids[b % ids.len()].clone(), distance))
            .filter(|(a, b, _)| a != b)
            .map(|(a, b, distance)| DistanceMeasurement::new(a, b, distance))
            .collect();

        let universe = trees.len();
        let mut engine = ResolutionEngine::new(trees, measurements).unwrap();
        let mut steps = 0;
        loop {
            let known_before = engine.state().known().len();
            let outcome = engine.step();
            steps += 1;

            let state = engine.state();
            prop_assert!(state.is_disjoint());
            prop_assert_eq!(state.universe_len(), universe);
            prop_assert!(state.known().len() >= known_before);
            prop_assert!(state.fail_count() <= state.unknown().len());

            match outcome {
                StepOutcome::Committed { .. } => prop_assert_eq!(state.fail_count(), 0),
                StepOutcome::Deferred { fail_count, .. } => prop_assert_eq!(state.fail_count(), fail_count),
                StepOutcome::Finished => {
                    prop_assert!(state.unknown().is_empty());
                    break;
                }
                StepOutcome::Exhausted { unresolved } => {
                    prop_assert_eq!(unresolved.len(), state.unknown().len());
                    break;
                }
            }
            // Each commit shrinks the unknown set and each run of deferrals is bounded by it
            prop_assert!(steps <= (unknown + 1) * (unknown + 1) + 1);
        }
    }
}
