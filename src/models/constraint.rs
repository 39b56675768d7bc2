//! Placement constraints.
//!
//! One tagged type covers every constraint a placement run accepts:
//! grouping rules over students, student-teacher preferences, and
//! distribution directives.

use serde::{Deserialize, Serialize};

/// How strongly a constraint should win when it competes with another.
///
/// Ordering: `Required > High > Medium > Low`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Required,
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Numeric rank (higher = stronger).
    pub fn rank(self) -> u8 {
        match self {
            Priority::Required => 3,
            Priority::High => 2,
            Priority::Medium => 1,
            Priority::Low => 0,
        }
    }
}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

/// A balance dimension that can be named by a distribution directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceFactor {
    Gender,
    Academic,
    Behavioral,
    SpecialNeeds,
}

/// What a constraint requires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConstraintKind {
    /// All listed students share one class.
    MustBeTogether { students: Vec<String> },
    /// No two listed students share a class.
    MustBeSeparate { students: Vec<String> },
    /// The student should be taught by the teacher.
    PreferredTeacher { student: String, teacher: String },
    /// The student should not be taught by the teacher.
    AvoidTeacher { student: String, teacher: String },
    /// Emphasize one balance dimension when scoring.
    BalancedDistribution { factor: BalanceFactor },
    /// Keep class sizes as even as possible.
    EqualClassSize,
}

/// A constraint with its priority.
///
/// Creation order is the position in the input slice; it breaks ties
/// between constraints of equal priority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub kind: ConstraintKind,
    #[serde(default)]
    pub priority: Priority,
}

impl Constraint {
    /// Wraps a kind at `Medium` priority.
    pub fn new(kind: ConstraintKind) -> Self {
        Self {
            id: String::new(),
            kind,
            priority: Priority::default(),
        }
    }

    /// Creates a must-be-together group.
    pub fn together<I, S>(students: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ConstraintKind::MustBeTogether {
            students: students.into_iter().map(Into::into).collect(),
        })
    }

    /// Creates a must-be-separate group.
    pub fn separate<I, S>(students: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ConstraintKind::MustBeSeparate {
            students: students.into_iter().map(Into::into).collect(),
        })
    }

    pub fn preferred_teacher(student: impl Into<String>, teacher: impl Into<String>) -> Self {
        Self::new(ConstraintKind::PreferredTeacher {
            student: student.into(),
            teacher: teacher.into(),
        })
    }

    pub fn avoid_teacher(student: impl Into<String>, teacher: impl Into<String>) -> Self {
        Self::new(ConstraintKind::AvoidTeacher {
            student: student.into(),
            teacher: teacher.into(),
        })
    }

    pub fn balanced(factor: BalanceFactor) -> Self {
        Self::new(ConstraintKind::BalancedDistribution { factor })
    }

    pub fn equal_class_size() -> Self {
        Self::new(ConstraintKind::EqualClassSize)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Students referenced by this constraint, in declaration order.
    pub fn students(&self) -> Vec<&str> {
        match &self.kind {
            ConstraintKind::MustBeTogether { students }
            | ConstraintKind::MustBeSeparate { students } => {
                students.iter().map(String::as_str).collect()
            }
            ConstraintKind::PreferredTeacher { student, .. }
            | ConstraintKind::AvoidTeacher { student, .. } => vec![student.as_str()],
            ConstraintKind::BalancedDistribution { .. } | ConstraintKind::EqualClassSize => {
                Vec::new()
            }
        }
    }

    /// Whether this is a together/separate grouping rule.
    pub fn is_grouping(&self) -> bool {
        matches!(
            self.kind,
            ConstraintKind::MustBeTogether { .. } | ConstraintKind::MustBeSeparate { .. }
        )
    }
}
