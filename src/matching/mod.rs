//! Teacher-to-class matching.
//!
//! Scores every (teacher, class) pair with [`score_pair`], then hands the
//! matrix to a [`Matcher`] to pick one-to-one pairings. Each teacher gets
//! at most one class and each class at most one teacher; when counts
//! differ the surplus side stays unassigned.
//!
//! Teacher preference constraints (`preferred_teacher` / `avoid_teacher`)
//! do not change scores. They are reported on each [`TeacherAssignment`]
//! so a reviewer can see which requests a pairing honors or breaks.

mod compatibility;
mod matcher;

pub use compatibility::{
    class_size_score, distribution_score, gender_score, score_pair, special_ed_score,
    CompatibilityBreakdown, CompatibilityScore, ACADEMIC_WEIGHT, BEHAVIORAL_WEIGHT,
    GENDER_WEIGHT, SIZE_WEIGHT, SPECIAL_ED_WEIGHT,
};
pub use matcher::{CompatibilityMatrix, GreedyMatcher, Matcher, Pairing};

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::balance::{round2, ClassProfile};
use crate::error::{PlacementError, Result};
use crate::models::{ClassBucket, Student, TeacherProfile};
use crate::resolver::TeacherPreference;
use crate::validation::validate_teachers;

/// One chosen teacher–class pairing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeacherAssignment {
    pub teacher_id: String,
    pub class_id: String,
    /// Compatibility in [0, 100].
    pub score: f64,
    pub breakdown: CompatibilityBreakdown,
    /// Students in the class who asked for this teacher.
    pub requested_by: Vec<String>,
    /// Students in the class who asked to avoid this teacher.
    pub avoided_by: Vec<String>,
}

/// Output of a matching run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeacherMatchResult {
    /// Input classes with `teacher_id` and `compatibility_score` filled in.
    pub classes: Vec<ClassBucket>,
    pub assignments: Vec<TeacherAssignment>,
    /// Every pair's score, teacher-major.
    pub compatibility: Vec<CompatibilityScore>,
    /// Mean score over assigned pairs; 0 when nothing was assigned.
    pub teacher_assignment_score: f64,
    pub assigned_teacher_count: usize,
    pub total_teacher_count: usize,
}

/// Matches teachers to finished classes.
#[derive(Debug)]
pub struct TeacherMatcher {
    matcher: Box<dyn Matcher>,
}

impl TeacherMatcher {
    /// Creates a matcher using [`GreedyMatcher`].
    pub fn new() -> Self {
        Self {
            matcher: Box::new(GreedyMatcher),
        }
    }

    /// Replaces the assignment algorithm.
    pub fn with_matcher(mut self, matcher: impl Matcher + 'static) -> Self {
        self.matcher = Box::new(matcher);
        self
    }

    /// Scores every teacher against every class and assigns them.
    ///
    /// `students` is the roster the classes were built from; IDs missing
    /// from it are ignored when computing class composition.
    ///
    /// # Errors
    /// [`PlacementError::Validation`] if a teacher profile is malformed.
    pub fn match_teachers(
        &self,
        teachers: &[TeacherProfile],
        classes: &[ClassBucket],
        students: &[Student],
        preferences: &BTreeMap<String, TeacherPreference>,
    ) -> Result<TeacherMatchResult> {
        validate_teachers(teachers).map_err(PlacementError::Validation)?;

        let index: HashMap<&str, &Student> = students.iter().map(|s| (s.id.as_str(), s)).collect();
        let profiles: Vec<ClassProfile> = classes
            .iter()
            .map(|class| {
                let members: Vec<&Student> = class
                    .student_ids
                    .iter()
                    .filter_map(|id| index.get(id.as_str()).copied())
                    .collect();
                ClassProfile::from_members(&members)
            })
            .collect();

        let matrix = CompatibilityMatrix::from_fn(teachers.len(), classes.len(), |t, c| {
            score_pair(&teachers[t], &classes[c].id, &profiles[c])
        });

        let mut pairings = self.matcher.assign(&matrix);
        pairings.sort_by_key(|p| p.class);
        debug!(
            event = "teachers_paired",
            matcher = self.matcher.name(),
            pairs = pairings.len(),
        );

        let mut result_classes: Vec<ClassBucket> = classes
            .iter()
            .cloned()
            .map(|mut c| {
                c.teacher_id = None;
                c.compatibility_score = None;
                c
            })
            .collect();

        let mut assignments = Vec::with_capacity(pairings.len());
        for p in &pairings {
            let teacher = &teachers[p.teacher];
            let class = &mut result_classes[p.class];
            let score = matrix.get(p.teacher, p.class);
            class.teacher_id = Some(teacher.id.clone());
            class.compatibility_score = Some(score.score);

            let (requested_by, avoided_by) = preference_hits(class, &teacher.id, preferences);
            assignments.push(TeacherAssignment {
                teacher_id: teacher.id.clone(),
                class_id: class.id.clone(),
                score: score.score,
                breakdown: score.breakdown,
                requested_by,
                avoided_by,
            });
        }

        let teacher_assignment_score = if assignments.is_empty() {
            0.0
        } else {
            round2(assignments.iter().map(|a| a.score).sum::<f64>() / assignments.len() as f64)
        };

        info!(
            event = "teachers_matched",
            teachers = teachers.len(),
            classes = classes.len(),
            assigned = assignments.len(),
            score = teacher_assignment_score,
        );

        Ok(TeacherMatchResult {
            classes: result_classes,
            assigned_teacher_count: assignments.len(),
            total_teacher_count: teachers.len(),
            assignments,
            compatibility: matrix.scores().to_vec(),
            teacher_assignment_score,
        })
    }
}

impl Default for TeacherMatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn preference_hits(
    class: &ClassBucket,
    teacher_id: &str,
    preferences: &BTreeMap<String, TeacherPreference>,
) -> (Vec<String>, Vec<String>) {
    let mut requested = Vec::new();
    let mut avoided = Vec::new();
    for student_id in &class.student_ids {
        let Some(pref) = preferences.get(student_id) else {
            continue;
        };
        if pref.preferred.iter().any(|t| t == teacher_id) {
            requested.push(student_id.clone());
        }
        if pref.avoided.iter().any(|t| t == teacher_id) {
            avoided.push(student_id.clone());
        }
    }
    (requested, avoided)
}
