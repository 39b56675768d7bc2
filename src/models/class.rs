//! Class bucket (solution) model.
//!
//! A bucket is one target classroom for a placement run. It holds the
//! assigned student IDs, its capacity window, computed balance scores,
//! and (after teacher matching) the assigned teacher.

use serde::{Deserialize, Serialize};

/// Size window for a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClassCapacity {
    pub min: usize,
    pub optimal: usize,
    pub max: usize,
}

impl ClassCapacity {
    pub fn new(min: usize, optimal: usize, max: usize) -> Self {
        Self { min, optimal, max }
    }

    /// Even split of `students` over `classes`, with `tolerance` extra seats.
    ///
    /// `min = floor(n/k)`, `optimal = ceil(n/k)`, `max = optimal + tolerance`.
    pub fn even_split(students: usize, classes: usize, tolerance: usize) -> Self {
        let classes = classes.max(1);
        let min = students / classes;
        let optimal = students.div_ceil(classes);
        Self {
            min,
            optimal,
            max: optimal + tolerance,
        }
    }
}

/// Per-class balance metrics, each in [0, 1] (1 = perfectly balanced).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalanceScores {
    pub gender: f64,
    pub academic: f64,
    pub behavioral: f64,
    pub special_needs: f64,
    pub overall: f64,
}

impl Default for BalanceScores {
    fn default() -> Self {
        Self {
            gender: 1.0,
            academic: 1.0,
            behavioral: 1.0,
            special_needs: 1.0,
            overall: 1.0,
        }
    }
}

/// A classroom bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassBucket {
    /// Stable identifier (`class-1`, `class-2`, ...).
    pub id: String,
    pub name: String,
    pub capacity: ClassCapacity,
    /// Assigned students, in assignment order.
    pub student_ids: Vec<String>,
    /// Assigned teacher, set by teacher matching.
    #[serde(default)]
    pub teacher_id: Option<String>,
    /// Compatibility of the assigned teacher, in [0, 100].
    #[serde(default)]
    pub compatibility_score: Option<f64>,
    #[serde(default)]
    pub balance: BalanceScores,
}

impl ClassBucket {
    /// Creates an empty bucket for position `index` (0-based).
    pub fn new(index: usize, capacity: ClassCapacity) -> Self {
        Self {
            id: format!("class-{}", index + 1),
            name: format!("Class {}", index + 1),
            capacity,
            student_ids: Vec::new(),
            teacher_id: None,
            compatibility_score: None,
            balance: BalanceScores::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_students<I, S>(mut self, students: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.student_ids.extend(students.into_iter().map(Into::into));
        self
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.student_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.student_ids.is_empty()
    }

    /// Whether the bucket has reached its maximum size.
    pub fn is_full(&self) -> bool {
        self.size() >= self.capacity.max
    }

    pub fn contains(&self, student_id: &str) -> bool {
        self.student_ids.iter().any(|s| s == student_id)
    }

    pub fn add(&mut self, student_id: impl Into<String>) {
        self.student_ids.push(student_id.into());
    }

    /// Removes a student. Returns whether it was present.
    pub fn remove(&mut self, student_id: &str) -> bool {
        match self.student_ids.iter().position(|s| s == student_id) {
            Some(pos) => {
                self.student_ids.remove(pos);
                true
            }
            None => false,
        }
    }
}
