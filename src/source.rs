//! Data access for placement runs.
//!
//! The planner never fetches data itself. Callers inject a
//! [`RosterSource`] and the planner takes one snapshot per run, so later
//! changes in the backing store cannot affect a run in progress.
//!
//! [`InMemorySource`] backs tests and embedded use.

use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::error::Result;
use crate::models::{Constraint, Student, TeacherProfile};

/// Supplies the roster, constraints, and teachers for a grade.
pub trait RosterSource: Send + Sync + Debug {
    /// Students enrolled in `grade`.
    fn students(&self, grade: u8) -> Result<Vec<Student>>;

    /// Placement constraints declared for `grade`.
    fn constraints(&self, grade: u8) -> Result<Vec<Constraint>>;

    /// Teachers available for `grade`.
    fn teachers(&self, grade: u8) -> Result<Vec<TeacherProfile>>;
}

/// Frozen input for one run.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub grade: u8,
    pub students: Vec<Student>,
    pub constraints: Vec<Constraint>,
    pub teachers: Vec<TeacherProfile>,
}

impl Snapshot {
    /// Reads everything for `grade` from `source`.
    pub fn capture(source: &dyn RosterSource, grade: u8) -> Result<Self> {
        Ok(Self {
            grade,
            students: source.students(grade)?,
            constraints: source.constraints(grade)?,
            teachers: source.teachers(grade)?,
        })
    }
}

/// Source held entirely in memory.
///
/// Students are filtered by their own `grade`; constraints and teachers
/// are registered per grade.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    students: Vec<Student>,
    constraints: BTreeMap<u8, Vec<Constraint>>,
    teachers: BTreeMap<u8, Vec<TeacherProfile>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_students(mut self, students: impl IntoIterator<Item = Student>) -> Self {
        self.students.extend(students);
        self
    }

    pub fn with_constraint(mut self, grade: u8, constraint: Constraint) -> Self {
        self.constraints.entry(grade).or_default().push(constraint);
        self
    }

    pub fn with_teacher(mut self, grade: u8, teacher: TeacherProfile) -> Self {
        self.teachers.entry(grade).or_default().push(teacher);
        self
    }
}

impl RosterSource for InMemorySource {
    fn students(&self, grade: u8) -> Result<Vec<Student>> {
        Ok(self
            .students
            .iter()
            .filter(|s| s.grade == grade)
            .cloned()
            .collect())
    }

    fn constraints(&self, grade: u8) -> Result<Vec<Constraint>> {
        Ok(self.constraints.get(&grade).cloned().unwrap_or_default())
    }

    fn teachers(&self, grade: u8) -> Result<Vec<TeacherProfile>> {
        Ok(self.teachers.get(&grade).cloned().unwrap_or_default())
    }
}
