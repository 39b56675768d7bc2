//! Teacher–class assignment algorithms.
//!
//! A [`Matcher`] turns a full compatibility matrix into one-to-one
//! (teacher, class) pairings. The default [`GreedyMatcher`] repeatedly
//! takes the highest-scoring pair whose teacher and class are both free.
//!
//! # Complexity
//! O(T·C·log(T·C)) for T teachers and C classes.

use std::fmt::Debug;

use super::CompatibilityScore;

/// Row-major compatibility scores: `scores[t * classes + c]`.
#[derive(Debug, Clone)]
pub struct CompatibilityMatrix {
    teachers: usize,
    classes: usize,
    scores: Vec<CompatibilityScore>,
}

impl CompatibilityMatrix {
    /// Builds a matrix from scores in row-major order.
    ///
    /// Returns `None` if `scores.len() != teachers * classes`.
    pub fn new(teachers: usize, classes: usize, scores: Vec<CompatibilityScore>) -> Option<Self> {
        (scores.len() == teachers * classes).then_some(Self {
            teachers,
            classes,
            scores,
        })
    }

    /// Builds a matrix by scoring every `(teacher, class)` index pair.
    pub fn from_fn(
        teachers: usize,
        classes: usize,
        mut score: impl FnMut(usize, usize) -> CompatibilityScore,
    ) -> Self {
        let mut scores = Vec::with_capacity(teachers * classes);
        for t in 0..teachers {
            for c in 0..classes {
                scores.push(score(t, c));
            }
        }
        Self {
            teachers,
            classes,
            scores,
        }
    }

    pub fn teacher_count(&self) -> usize {
        self.teachers
    }

    pub fn class_count(&self) -> usize {
        self.classes
    }

    pub fn get(&self, teacher: usize, class: usize) -> &CompatibilityScore {
        &self.scores[teacher * self.classes + class]
    }

    pub fn scores(&self) -> &[CompatibilityScore] {
        &self.scores
    }
}

/// A chosen (teacher index, class index) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pairing {
    pub teacher: usize,
    pub class: usize,
}

/// Assigns at most one class per teacher and one teacher per class.
pub trait Matcher: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    /// Returns pairings; leftover teachers or classes stay unmatched.
    fn assign(&self, matrix: &CompatibilityMatrix) -> Vec<Pairing>;
}

/// Highest score first; ties → lower teacher index, then lower class index.
///
/// Not globally optimal.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyMatcher;

impl Matcher for GreedyMatcher {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn assign(&self, matrix: &CompatibilityMatrix) -> Vec<Pairing> {
        let mut candidates: Vec<Pairing> = (0..matrix.teacher_count())
            .flat_map(|teacher| {
                (0..matrix.class_count()).map(move |class| Pairing { teacher, class })
            })
            .collect();
        // Stable sort keeps row-major order among equal scores.
        candidates.sort_by(|a, b| {
            let sa = matrix.get(a.teacher, a.class).score;
            let sb = matrix.get(b.teacher, b.class).score;
            sb.total_cmp(&sa)
        });

        let mut teacher_used = vec![false; matrix.teacher_count()];
        let mut class_used = vec![false; matrix.class_count()];
        let mut pairings = Vec::new();

        for p in candidates {
            if teacher_used[p.teacher] || class_used[p.class] {
                continue;
            }
            teacher_used[p.teacher] = true;
            class_used[p.class] = true;
            pairings.push(p);
        }
        pairings
    }
}
