//! High-level planning facade.
//!
//! [`ClassPlanner`] exposes the three call contracts a surrounding service
//! consumes (run a placement, generate suggestions, match teachers) and a
//! [`run_for_grade`](ClassPlanner::run_for_grade) pipeline that drives all
//! three from an injected [`RosterSource`].
//!
//! Every call works on its own copy of the input. Nothing is shared between
//! calls, so a planner can serve concurrent requests behind an `Arc`.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::PlannerConfig;
use crate::error::{PlacementError, Result};
use crate::matching::{Matcher, TeacherMatchResult, TeacherMatcher};
use crate::models::{ClassBucket, Constraint, Student, TeacherProfile};
use crate::placement::{PlacementRequest, PlacementStats};
use crate::resolver::resolve;
use crate::source::{RosterSource, Snapshot};
use crate::suggestions::Suggestion;

/// Output of [`ClassPlanner::run_placement`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementResult {
    pub classes: Vec<ClassBucket>,
    pub stats: PlacementStats,
}

/// Output of [`ClassPlanner::run_for_grade`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradePlan {
    pub grade: u8,
    /// Final classes, with teachers filled in when any were available.
    pub classes: Vec<ClassBucket>,
    pub stats: PlacementStats,
    pub suggestions: Vec<Suggestion>,
    /// `None` when the source lists no teachers for the grade.
    pub teachers: Option<TeacherMatchResult>,
}

/// Entry point for placement, suggestions, and teacher matching.
///
/// # Example
///
/// ```
/// use u_placement::models::{Gender, Student};
/// use u_placement::placement::PlacementRequest;
/// use u_placement::planner::ClassPlanner;
///
/// let students: Vec<Student> = (0..8)
///     .map(|i| Student::new(format!("S{i}"), 2, if i % 2 == 0 { Gender::Male } else { Gender::Female }))
///     .collect();
///
/// let planner = ClassPlanner::new();
/// let result = planner.run_placement(&PlacementRequest::new(students.clone(), 2)).unwrap();
/// assert_eq!(result.stats.total_students, 8);
///
/// let suggestions = planner.generate_suggestions(&result.classes, &students, &[]);
/// assert!(suggestions.len() <= 5);
/// ```
#[derive(Debug, Default)]
pub struct ClassPlanner {
    config: PlannerConfig,
    matcher: TeacherMatcher,
}

impl ClassPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: PlannerConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the teacher assignment algorithm.
    pub fn with_matcher(mut self, matcher: impl Matcher + 'static) -> Self {
        self.matcher = TeacherMatcher::new().with_matcher(matcher);
        self
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Places the request's students into classes.
    ///
    /// The request's strategy and weights apply; size tolerance and
    /// emphasis come from the planner configuration.
    ///
    /// # Errors
    /// Validation or conflict errors; no partial placement is returned.
    pub fn run_placement(&self, request: &PlacementRequest) -> Result<PlacementResult> {
        let placement = self.config.engine().place_request(request)?;
        Ok(PlacementResult {
            classes: placement.classes,
            stats: placement.stats,
        })
    }

    /// Proposes swaps and moves that would improve balance.
    pub fn generate_suggestions(
        &self,
        classes: &[ClassBucket],
        students: &[Student],
        constraints: &[Constraint],
    ) -> Vec<Suggestion> {
        self.config
            .suggestion_generator()
            .suggest(classes, students, constraints)
    }

    /// Assigns teachers to finished classes.
    ///
    /// Teacher preference constraints are reported per assignment.
    ///
    /// # Errors
    /// [`PlacementError::Validation`] for malformed teacher profiles and
    /// [`PlacementError::Conflict`] if `constraints` contradict each other.
    pub fn match_teachers(
        &self,
        teachers: &[TeacherProfile],
        classes: &[ClassBucket],
        students: &[Student],
        constraints: &[Constraint],
    ) -> Result<TeacherMatchResult> {
        let resolved = resolve(constraints)?;
        self.matcher
            .match_teachers(teachers, classes, students, &resolved.teacher_prefs)
    }

    /// Places, suggests, and matches teachers for one grade.
    ///
    /// Data is read from `source` once, before any work starts.
    ///
    /// # Errors
    /// - [`PlacementError::NoStudents`] if the grade has no students.
    /// - Any error from the source, placement, or matching.
    pub fn run_for_grade(
        &self,
        source: &dyn RosterSource,
        grade: u8,
        number_of_classes: usize,
    ) -> Result<GradePlan> {
        let snapshot = Snapshot::capture(source, grade)?;
        if snapshot.students.is_empty() {
            return Err(PlacementError::NoStudents { grade });
        }

        let placement = self.config.engine().place(
            &snapshot.students,
            number_of_classes,
            &snapshot.constraints,
        )?;
        let suggestions = self.generate_suggestions(
            &placement.classes,
            &snapshot.students,
            &snapshot.constraints,
        );

        let (classes, teachers) = if snapshot.teachers.is_empty() {
            (placement.classes, None)
        } else {
            let matched = self.matcher.match_teachers(
                &snapshot.teachers,
                &placement.classes,
                &snapshot.students,
                &placement.constraints.teacher_prefs,
            )?;
            (matched.classes.clone(), Some(matched))
        };

        info!(
            event = "grade_planned",
            grade,
            classes = classes.len(),
            suggestions = suggestions.len(),
            teachers_assigned = teachers.as_ref().map_or(0, |t| t.assigned_teacher_count),
        );

        Ok(GradePlan {
            grade,
            classes,
            stats: placement.stats,
            suggestions,
            teachers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::GreedyMatcher;
    use crate::models::Gender;
    use crate::placement::Strategy;
    use crate::source::InMemorySource;

    fn roster(grade: u8, n: usize) -> Vec<Student> {
        (0..n)
            .map(|i| {
                let g = if i % 2 == 0 { Gender::Male } else { Gender::Female };
                Student::new(format!("G{grade}-{i}"), grade, g).with_academic((i % 5 + 1) as u8)
            })
            .collect()
    }

    #[test]
    fn test_run_placement_uses_request_strategy() {
        let planner = ClassPlanner::new();
        let request = PlacementRequest::new(roster(3, 10), 2).with_strategy(Strategy::RoundRobin);
        let result = planner.run_placement(&request).unwrap();
        assert_eq!(result.stats.strategy, Strategy::RoundRobin);
        assert_eq!(result.classes.len(), 2);
        assert_eq!(result.stats.total_students, 10);
    }

    #[test]
    fn test_run_placement_rejects_zero_classes() {
        let err = ClassPlanner::new()
            .run_placement(&PlacementRequest::new(roster(3, 4), 0))
            .unwrap_err();
        assert!(matches!(err, PlacementError::Validation(_)));
    }

    #[test]
    fn test_suggestions_respect_config_limit() {
        let planner =
            ClassPlanner::new().with_config(PlannerConfig::new().with_max_suggestions(1));
        let students = roster(3, 12);
        let lopsided = vec![
            ClassBucket::new(0, Default::default())
                .with_students(students.iter().filter(|s| s.gender == Gender::Male).map(|s| s.id.as_str())),
            ClassBucket::new(1, Default::default())
                .with_students(students.iter().filter(|s| s.gender == Gender::Female).map(|s| s.id.as_str())),
        ];
        let out = planner.generate_suggestions(&lopsided, &students, &[]);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_match_teachers_conflict_surfaces() {
        let students = roster(3, 4);
        let classes = ClassPlanner::new()
            .run_placement(&PlacementRequest::new(students.clone(), 2))
            .unwrap()
            .classes;
        let constraints = vec![
            Constraint::together(["G3-0", "G3-1"]),
            Constraint::separate(["G3-0", "G3-1"]),
        ];
        let err = ClassPlanner::new()
            .match_teachers(&[TeacherProfile::new("T1")], &classes, &students, &constraints)
            .unwrap_err();
        assert!(matches!(err, PlacementError::Conflict { .. }));
    }

    #[test]
    fn test_run_for_grade_no_students() {
        let source = InMemorySource::new().with_students(roster(3, 6));
        let err = ClassPlanner::new().run_for_grade(&source, 5, 2).unwrap_err();
        assert!(matches!(err, PlacementError::NoStudents { grade: 5 }));
    }

    #[test]
    fn test_run_for_grade_end_to_end() {
        let source = InMemorySource::new()
            .with_students(roster(3, 20))
            .with_students(roster(4, 7))
            .with_constraint(3, Constraint::together(["G3-0", "G3-1"]))
            .with_constraint(3, Constraint::preferred_teacher("G3-0", "T2"))
            .with_teacher(3, TeacherProfile::new("T1").with_class_size(8, 10, 12))
            .with_teacher(3, TeacherProfile::new("T2").with_class_size(8, 10, 12));

        let plan = ClassPlanner::new()
            .with_matcher(GreedyMatcher)
            .run_for_grade(&source, 3, 2)
            .unwrap();

        assert_eq!(plan.grade, 3);
        assert_eq!(plan.stats.total_students, 20);
        assert!(plan.classes.iter().all(|c| c.teacher_id.is_some()));
        let matched = plan.teachers.unwrap();
        assert_eq!(matched.assigned_teacher_count, 2);
        assert_eq!(matched.total_teacher_count, 2);

        let together = plan.classes.iter().find(|c| c.contains("G3-0")).unwrap();
        assert!(together.contains("G3-1"));
    }

    #[test]
    fn test_run_for_grade_without_teachers() {
        let source = InMemorySource::new().with_students(roster(4, 9));
        let plan = ClassPlanner::new().run_for_grade(&source, 4, 3).unwrap();
        assert!(plan.teachers.is_none());
        assert!(plan.classes.iter().all(|c| c.teacher_id.is_none()));
    }
}
