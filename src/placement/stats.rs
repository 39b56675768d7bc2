//! Placement run statistics.
//!
//! Summarizes a finished placement and reports separation constraints
//! that could not be honored.
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Average class size | students / classes |
//! | Balance score | mean of per-class overall scores |
//! | Constraints applied | constraints consumed by the resolver |
//! | Separation violations | separate pairs sharing a class |

use serde::{Deserialize, Serialize};

use crate::balance::round2;
use crate::models::ClassBucket;
use crate::resolver::ResolvedConstraints;

use super::Strategy;

/// A separate-from pair that ended up in the same class.
///
/// Non-fatal: the run proceeds with the best available assignment and
/// surfaces the violation here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeparationViolation {
    pub first: String,
    pub second: String,
    pub class_id: String,
    pub message: String,
}

/// Summary of one placement run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementStats {
    pub strategy: Strategy,
    pub total_students: usize,
    pub class_count: usize,
    pub average_class_size: f64,
    pub min_class_size: usize,
    pub max_class_size: usize,
    /// Mean overall balance across classes, in [0, 1].
    pub balance_score: f64,
    pub constraints_applied: usize,
    pub separation_violations: Vec<SeparationViolation>,
}

impl PlacementStats {
    /// Computes statistics from scored buckets.
    pub fn calculate(
        classes: &[ClassBucket],
        constraints: &ResolvedConstraints,
        strategy: Strategy,
    ) -> Self {
        let total_students: usize = classes.iter().map(ClassBucket::size).sum();
        let class_count = classes.len();
        let denom = class_count.max(1) as f64;

        let balance_score = if classes.is_empty() {
            1.0
        } else {
            classes.iter().map(|c| c.balance.overall).sum::<f64>() / denom
        };

        Self {
            strategy,
            total_students,
            class_count,
            average_class_size: round2(total_students as f64 / denom),
            min_class_size: classes.iter().map(ClassBucket::size).min().unwrap_or(0),
            max_class_size: classes.iter().map(ClassBucket::size).max().unwrap_or(0),
            balance_score: round2(balance_score),
            constraints_applied: constraints.applied,
            separation_violations: audit_separations(classes, constraints),
        }
    }

    /// Whether every separation constraint was honored.
    pub fn is_feasible(&self) -> bool {
        self.separation_violations.is_empty()
    }

    /// Whether the run meets the given quality thresholds.
    pub fn meets_thresholds(&self, min_balance: f64, max_size_spread: usize) -> bool {
        self.balance_score >= min_balance
            && self.max_class_size - self.min_class_size <= max_size_spread
    }
}

/// Lists every separate pair that shares a bucket.
pub fn audit_separations(
    classes: &[ClassBucket],
    constraints: &ResolvedConstraints,
) -> Vec<SeparationViolation> {
    let mut violations = Vec::new();
    for (first, second) in constraints.separate_pairs() {
        if let Some(class) = classes
            .iter()
            .find(|c| c.contains(first) && c.contains(second))
        {
            violations.push(SeparationViolation {
                first: first.to_string(),
                second: second.to_string(),
                class_id: class.id.clone(),
                message: format!(
                    "'{first}' and '{second}' must be separated but share {}",
                    class.name
                ),
            });
        }
    }
    violations
}
