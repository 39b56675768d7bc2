//! Placement engine, strategies, and run statistics.
//!
//! # Algorithm
//!
//! 1. Create `number_of_classes` empty buckets.
//! 2. Place each together group, strongest first, into the bucket with the
//!    fewest students (ties → lower index).
//! 3. Distribute the remaining students with the selected strategy.
//! 4. Score every bucket and audit separation constraints.
//!
//! # Usage
//!
//! ```
//! use u_placement::models::{Constraint, Gender, Student};
//! use u_placement::placement::{PlacementEngine, Strategy};
//!
//! let students: Vec<Student> = (0..6)
//!     .map(|i| Student::new(format!("S{i}"), 3, if i % 2 == 0 { Gender::Male } else { Gender::Female }))
//!     .collect();
//! let constraints = vec![Constraint::together(["S0", "S1"])];
//!
//! let engine = PlacementEngine::new().with_strategy(Strategy::Balanced);
//! let placement = engine.place(&students, 2, &constraints).unwrap();
//! assert_eq!(placement.stats.total_students, 6);
//! ```

mod engine;
mod stats;
pub mod strategies;

pub use engine::{
    Placement, PlacementEngine, PlacementRequest, DEFAULT_EMPHASIS_MULTIPLIER,
    DEFAULT_SIZE_TOLERANCE,
};
pub use stats::{PlacementStats, SeparationViolation};

use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{ClassBucket, Student};
use crate::resolver::ResolvedConstraints;

/// Named placement strategy.
///
/// Parsing is lenient: any unrecognized name selects `RoundRobin`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Strategy {
    #[default]
    Balanced,
    AcademicFocus,
    ParentRequestsPriority,
    /// Round-robin fallback (`"default"`).
    RoundRobin,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        self.rule().name()
    }

    /// The strategy implementation.
    pub fn rule(self) -> &'static dyn PlacementStrategy {
        match self {
            Strategy::Balanced => &strategies::Balanced,
            Strategy::AcademicFocus => &strategies::AcademicFocus,
            Strategy::ParentRequestsPriority => &strategies::ParentRequests,
            Strategy::RoundRobin => &strategies::RoundRobin,
        }
    }
}

impl FromStr for Strategy {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "balanced" => Strategy::Balanced,
            "academic_focus" => Strategy::AcademicFocus,
            "parent_requests_priority" => Strategy::ParentRequestsPriority,
            _ => Strategy::RoundRobin,
        })
    }
}

impl From<String> for Strategy {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(strategy) => strategy,
            Err(never) => match never {},
        }
    }
}

impl From<Strategy> for String {
    fn from(s: Strategy) -> Self {
        s.as_str().to_string()
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Distributes the students left after together groups are placed.
///
/// Implementations must be deterministic for a given input.
pub trait PlacementStrategy: Send + Sync + Debug {
    /// Strategy name as it appears in requests (e.g. `"balanced"`).
    fn name(&self) -> &'static str;

    /// Assigns every student in `remaining` to a bucket in `state`.
    fn place(
        &self,
        remaining: &[&Student],
        state: &mut PlacementState,
        constraints: &ResolvedConstraints,
    );

    fn description(&self) -> &'static str {
        self.name()
    }
}

/// Mutable bucket state for one placement run.
#[derive(Debug, Clone)]
pub struct PlacementState {
    buckets: Vec<ClassBucket>,
    location: HashMap<String, usize>,
}

impl PlacementState {
    pub fn new(buckets: Vec<ClassBucket>) -> Self {
        Self {
            buckets,
            location: HashMap::new(),
        }
    }

    pub fn class_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn bucket(&self, idx: usize) -> &ClassBucket {
        &self.buckets[idx]
    }

    pub fn buckets(&self) -> &[ClassBucket] {
        &self.buckets
    }

    /// Bucket index holding `student_id`, if assigned.
    pub fn bucket_of(&self, student_id: &str) -> Option<usize> {
        self.location.get(student_id).copied()
    }

    pub fn is_assigned(&self, student_id: &str) -> bool {
        self.location.contains_key(student_id)
    }

    /// Assigns a student. Re-assigning an already placed student is a no-op.
    pub fn assign(&mut self, student_id: &str, idx: usize) {
        if self.is_assigned(student_id) {
            return;
        }
        self.buckets[idx].add(student_id);
        self.location.insert(student_id.to_string(), idx);
    }

    /// Fewest students; ties → lower index.
    pub fn least_populated(&self) -> usize {
        self.buckets
            .iter()
            .enumerate()
            .min_by_key(|(idx, b)| (b.size(), *idx))
            .map(|(idx, _)| idx)
            .unwrap_or(0)
    }

    /// Bucket indices by ascending population, ties → lower index.
    pub fn by_population(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.buckets.len()).collect();
        order.sort_by_key(|&idx| (self.buckets[idx].size(), idx));
        order
    }

    /// Whether bucket `idx` holds someone `student` must be separated from.
    pub fn has_conflict(
        &self,
        student: &Student,
        idx: usize,
        constraints: &ResolvedConstraints,
    ) -> bool {
        constraints
            .separated_from(&student.id)
            .is_some_and(|peers| peers.iter().any(|p| self.bucket_of(p) == Some(idx)))
    }

    pub fn into_buckets(self) -> Vec<ClassBucket> {
        self.buckets
    }
}
