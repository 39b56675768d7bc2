//! Constraint-aware placement engine.
//!
//! # Algorithm
//!
//! 1. Validate input and resolve constraints (conflicts abort the run).
//! 2. Create `number_of_classes` buckets with an even-split capacity.
//! 3. Place together groups, strongest first, into the least-populated bucket
//!    free of separated peers.
//! 4. Distribute everyone else with the selected strategy.
//! 5. Score buckets and audit separations.
//!
//! # Complexity
//! O(n * k * s) for `Balanced`, where n = students, k = classes,
//! s = separated peers per student.

use tracing::{debug, info};

use super::{PlacementState, PlacementStats, Strategy};
use crate::balance::{BalanceScorer, BalanceWeights};
use crate::error::{PlacementError, Result};
use crate::models::{ClassBucket, ClassCapacity, Constraint, Student};
use crate::resolver::{resolve, ResolvedConstraints};
use crate::validation::{validate_input, validate_weights};

/// Default seats allowed above the even split before a bucket is full.
pub const DEFAULT_SIZE_TOLERANCE: usize = 2;

/// Default weight multiplier for emphasized balance factors.
pub const DEFAULT_EMPHASIS_MULTIPLIER: f64 = 2.0;

/// Input container for a placement run.
#[derive(Debug, Clone)]
pub struct PlacementRequest {
    pub students: Vec<Student>,
    pub number_of_classes: usize,
    pub strategy: Strategy,
    pub constraints: Vec<Constraint>,
    pub weights: BalanceWeights,
}

impl PlacementRequest {
    pub fn new(students: Vec<Student>, number_of_classes: usize) -> Self {
        Self {
            students,
            number_of_classes,
            strategy: Strategy::default(),
            constraints: Vec::new(),
            weights: BalanceWeights::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_constraints(mut self, constraints: Vec<Constraint>) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_weights(mut self, weights: BalanceWeights) -> Self {
        self.weights = weights;
        self
    }
}

/// Result of a placement run.
#[derive(Debug, Clone)]
pub struct Placement {
    pub classes: Vec<ClassBucket>,
    pub stats: PlacementStats,
    /// Resolved constraints, reusable for suggestions and matching.
    pub constraints: ResolvedConstraints,
}

/// Places students into class buckets.
///
/// # Example
///
/// ```
/// use u_placement::models::{Gender, Student};
/// use u_placement::placement::{PlacementEngine, PlacementRequest, Strategy};
///
/// let students = vec![
///     Student::new("S1", 3, Gender::Male).with_academic(5),
///     Student::new("S2", 3, Gender::Female).with_academic(2),
///     Student::new("S3", 3, Gender::Female).with_academic(4),
/// ];
/// let request = PlacementRequest::new(students, 2).with_strategy(Strategy::Balanced);
///
/// let placement = PlacementEngine::new().place_request(&request).unwrap();
/// assert_eq!(placement.classes.len(), 2);
/// assert_eq!(placement.stats.total_students, 3);
/// ```
#[derive(Debug, Clone)]
pub struct PlacementEngine {
    strategy: Strategy,
    weights: BalanceWeights,
    size_tolerance: usize,
    emphasis_multiplier: f64,
}

impl PlacementEngine {
    pub fn new() -> Self {
        Self {
            strategy: Strategy::default(),
            weights: BalanceWeights::default(),
            size_tolerance: DEFAULT_SIZE_TOLERANCE,
            emphasis_multiplier: DEFAULT_EMPHASIS_MULTIPLIER,
        }
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_weights(mut self, weights: BalanceWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn weights(&self) -> &BalanceWeights {
        &self.weights
    }

    /// Seats allowed above the even split before a bucket counts as full.
    pub fn with_size_tolerance(mut self, tolerance: usize) -> Self {
        self.size_tolerance = tolerance;
        self
    }

    pub fn with_emphasis_multiplier(mut self, multiplier: f64) -> Self {
        self.emphasis_multiplier = multiplier;
        self
    }

    /// Places students using the engine's strategy and weights.
    ///
    /// An empty roster yields `number_of_classes` empty buckets.
    ///
    /// # Errors
    /// - [`PlacementError::Validation`] for malformed input
    ///   (e.g. `number_of_classes < 1`, unknown student references,
    ///   negative weights).
    /// - [`PlacementError::Conflict`] when a pair is required both together
    ///   and apart.
    pub fn place(
        &self,
        students: &[Student],
        number_of_classes: usize,
        constraints: &[Constraint],
    ) -> Result<Placement> {
        let mut errors = validate_input(students, number_of_classes, constraints)
            .err()
            .unwrap_or_default();
        errors.extend(validate_weights(&self.weights).err().unwrap_or_default());
        if !errors.is_empty() {
            return Err(PlacementError::Validation(errors));
        }
        let resolved = resolve(constraints)?;

        info!(
            event = "placement_start",
            students = students.len(),
            classes = number_of_classes,
            strategy = %self.strategy,
            constraints = constraints.len(),
        );

        let tolerance = if resolved.equal_class_size {
            0
        } else {
            self.size_tolerance
        };
        let capacity = ClassCapacity::even_split(students.len(), number_of_classes, tolerance);
        let buckets = (0..number_of_classes)
            .map(|idx| ClassBucket::new(idx, capacity))
            .collect();
        let mut state = PlacementState::new(buckets);

        for group in &resolved.together {
            let target = state.least_populated_for_group(&group.students, &resolved);
            for sid in &group.students {
                state.assign(sid, target);
            }
            debug!(
                event = "group_placed",
                members = group.students.len(),
                class = %state.bucket(target).id,
            );
        }

        let remaining: Vec<&Student> = students
            .iter()
            .filter(|s| !state.is_assigned(&s.id))
            .collect();
        let rule = self.strategy.rule();
        debug!(
            event = "strategy_pass",
            strategy = rule.name(),
            remaining = remaining.len(),
        );
        rule.place(&remaining, &mut state, &resolved);

        let weights = resolved
            .emphasized
            .iter()
            .fold(self.weights, |w, &factor| {
                w.emphasize(factor, self.emphasis_multiplier)
            });
        let scorer = BalanceScorer::new(students, weights);
        let mut classes = state.into_buckets();
        scorer.score_all(&mut classes);

        let stats = PlacementStats::calculate(&classes, &resolved, self.strategy);
        info!(
            event = "placement_end",
            balance = stats.balance_score,
            violations = stats.separation_violations.len(),
        );

        Ok(Placement {
            classes,
            stats,
            constraints: resolved,
        })
    }

    /// Places from a request, overriding the engine's strategy and weights.
    pub fn place_request(&self, request: &PlacementRequest) -> Result<Placement> {
        let engine = Self {
            strategy: request.strategy,
            weights: request.weights,
            ..self.clone()
        };
        engine.place(
            &request.students,
            request.number_of_classes,
            &request.constraints,
        )
    }
}

impl Default for PlacementEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BalanceFactor, Gender, Priority};
    use crate::validation::ValidationErrorKind;
    use std::collections::HashSet;

    fn roster(n: usize) -> Vec<Student> {
        (1..=n)
            .map(|i| {
                let gender = if i % 2 == 0 { Gender::Female } else { Gender::Male };
                Student::new(format!("S{i}"), 3, gender)
                    .with_academic((i % 5 + 1) as u8)
                    .with_behavioral(((i * 3) % 5 + 1) as u8)
            })
            .collect()
    }

    fn class_of<'a>(p: &'a Placement, id: &str) -> &'a str {
        &p.classes.iter().find(|c| c.contains(id)).unwrap().id
    }

    #[test]
    fn test_zero_classes_rejected() {
        let err = PlacementEngine::new().place(&roster(4), 0, &[]).unwrap_err();
        match err {
            PlacementError::Validation(errors) => {
                assert_eq!(errors[0].kind, ValidationErrorKind::InvalidClassCount);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_conflict_rejected() {
        let constraints = vec![
            Constraint::together(["S1", "S2"]),
            Constraint::separate(["S1", "S2"]),
        ];
        let err = PlacementEngine::new()
            .place(&roster(4), 2, &constraints)
            .unwrap_err();
        assert!(matches!(err, PlacementError::Conflict { .. }));
    }

    #[test]
    fn test_empty_roster() {
        let p = PlacementEngine::new().place(&[], 3, &[]).unwrap();
        assert_eq!(p.classes.len(), 3);
        assert!(p.classes.iter().all(ClassBucket::is_empty));
        assert_eq!(p.stats.total_students, 0);
    }

    #[test]
    fn test_conservation_all_strategies() {
        let students = roster(23);
        for strategy in [
            Strategy::Balanced,
            Strategy::AcademicFocus,
            Strategy::ParentRequestsPriority,
            Strategy::RoundRobin,
        ] {
            let p = PlacementEngine::new()
                .with_strategy(strategy)
                .place(&students, 4, &[Constraint::together(["S1", "S7", "S9"])])
                .unwrap();
            let total: usize = p.classes.iter().map(ClassBucket::size).sum();
            assert_eq!(total, 23, "{strategy}");
            let unique: HashSet<&str> = p
                .classes
                .iter()
                .flat_map(|c| c.student_ids.iter().map(String::as_str))
                .collect();
            assert_eq!(unique.len(), 23, "{strategy}");
        }
    }

    #[test]
    fn test_together_group_first_bucket() {
        let p = PlacementEngine::new()
            .place(&roster(6), 2, &[Constraint::together(["S5", "S6"])])
            .unwrap();
        assert_eq!(class_of(&p, "S5"), class_of(&p, "S6"));
        assert_eq!(class_of(&p, "S5"), "class-1");
    }

    #[test]
    fn test_groups_spread_by_population() {
        let constraints = vec![
            Constraint::together(["S1", "S2", "S3"]),
            Constraint::together(["S4", "S5"]).with_priority(Priority::Required),
        ];
        let p = PlacementEngine::new()
            .place(&roster(10), 2, &constraints)
            .unwrap();
        // Required group first → class-1; next group → class-2.
        assert_eq!(class_of(&p, "S4"), "class-1");
        assert_eq!(class_of(&p, "S1"), "class-2");
    }

    #[test]
    fn test_separation_honored_when_possible() {
        let constraints = vec![Constraint::separate(["S1", "S2", "S3"])];
        let p = PlacementEngine::new()
            .place(&roster(12), 3, &constraints)
            .unwrap();
        let classes: HashSet<&str> = ["S1", "S2", "S3"].iter().map(|s| class_of(&p, s)).collect();
        assert_eq!(classes.len(), 3);
        assert!(p.stats.is_feasible());
    }

    #[test]
    fn test_infeasible_separation_reported() {
        let constraints = vec![Constraint::separate(["S1", "S2", "S3"])];
        let p = PlacementEngine::new()
            .place(&roster(6), 2, &constraints)
            .unwrap();
        assert_eq!(p.stats.separation_violations.len(), 1);
        assert_eq!(p.stats.total_students, 6);
    }

    #[test]
    fn test_round_robin_violation_audited() {
        // Round robin ignores separations; S1 (idx 0) and S3 (idx 2) share class-1.
        let p = PlacementEngine::new()
            .with_strategy(Strategy::RoundRobin)
            .place(&roster(4), 2, &[Constraint::separate(["S1", "S3"])])
            .unwrap();
        assert_eq!(class_of(&p, "S1"), class_of(&p, "S3"));
        assert_eq!(p.stats.separation_violations.len(), 1);
    }

    #[test]
    fn test_equal_class_size_tightens_capacity() {
        let p = PlacementEngine::new()
            .place(&roster(10), 3, &[Constraint::equal_class_size()])
            .unwrap();
        assert_eq!(p.classes[0].capacity, ClassCapacity::new(3, 4, 4));

        let p = PlacementEngine::new().place(&roster(10), 3, &[]).unwrap();
        assert_eq!(p.classes[0].capacity.max, 6);
    }

    #[test]
    fn test_balanced_sizes_even() {
        let p = PlacementEngine::new().place(&roster(24), 2, &[]).unwrap();
        assert!(p.classes.iter().all(|c| c.size() == 12));
    }

    #[test]
    fn test_scores_in_bounds() {
        let p = PlacementEngine::new().place(&roster(17), 3, &[]).unwrap();
        for c in &p.classes {
            for v in [
                c.balance.gender,
                c.balance.academic,
                c.balance.behavioral,
                c.balance.special_needs,
                c.balance.overall,
            ] {
                assert!((0.0..=1.0).contains(&v));
            }
        }
        assert!((0.0..=1.0).contains(&p.stats.balance_score));
    }

    #[test]
    fn test_emphasis_changes_overall_only() {
        // All boys: gender scores 0, so doubling its weight lowers overall.
        let students: Vec<Student> = (1..=8)
            .map(|i| Student::new(format!("S{i}"), 3, Gender::Male).with_academic((i % 5 + 1) as u8))
            .collect();
        let plain = PlacementEngine::new().place(&students, 2, &[]).unwrap();
        let emphasized = PlacementEngine::new()
            .place(&students, 2, &[Constraint::balanced(BalanceFactor::Gender)])
            .unwrap();
        for (a, b) in plain.classes.iter().zip(&emphasized.classes) {
            assert_eq!(a.student_ids, b.student_ids);
            assert_eq!(a.balance.gender, 0.0);
            assert_eq!(a.balance.gender, b.balance.gender);
            assert_eq!(a.balance.academic, b.balance.academic);
            assert!(b.balance.overall < a.balance.overall);
        }
    }

    #[test]
    fn test_together_groups_avoid_separated_peers() {
        let students: Vec<Student> = ["A", "B", "C", "D", "E", "F", "G", "H", "I", "J"]
            .iter()
            .map(|id| Student::new(*id, 3, Gender::Female))
            .collect();
        let constraints = vec![
            Constraint::together(["A", "B", "C"]),
            Constraint::together(["D", "E"]),
            Constraint::together(["F", "G"]),
            Constraint::separate(["D", "F"]),
        ];
        let p = PlacementEngine::new().place(&students, 2, &constraints).unwrap();

        assert_ne!(class_of(&p, "D"), class_of(&p, "F"));
        assert_eq!(class_of(&p, "F"), class_of(&p, "A"));
        assert!(p.stats.separation_violations.is_empty());
        assert_eq!(p.stats.total_students, 10);
    }

    #[test]
    fn test_deterministic() {
        let students = roster(31);
        let constraints = vec![
            Constraint::together(["S3", "S4"]),
            Constraint::separate(["S10", "S11"]),
        ];
        let engine = PlacementEngine::new().with_strategy(Strategy::Balanced);
        let a = engine.place(&students, 3, &constraints).unwrap();
        let b = engine.place(&students, 3, &constraints).unwrap();
        for (x, y) in a.classes.iter().zip(&b.classes) {
            assert_eq!(x.student_ids, y.student_ids);
            assert_eq!(x.balance, y.balance);
        }
    }

    #[test]
    fn test_place_request_overrides() {
        let request = PlacementRequest::new(roster(4), 2).with_strategy(Strategy::RoundRobin);
        let p = PlacementEngine::new().place_request(&request).unwrap();
        assert_eq!(p.stats.strategy, Strategy::RoundRobin);
        assert_eq!(p.classes[0].student_ids, vec!["S1", "S3"]);
    }

    #[test]
    fn test_negative_weight_rejected() {
        let err = PlacementEngine::new()
            .with_weights(BalanceWeights::new(1.0, -0.5, 1.0, 1.0))
            .place(&roster(4), 2, &[])
            .unwrap_err();
        match err {
            PlacementError::Validation(errors) => {
                assert_eq!(errors[0].kind, ValidationErrorKind::InvalidWeight);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
