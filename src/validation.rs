//! Input validation for placement runs.
//!
//! Checks structural integrity of the roster, constraints, and teacher
//! profiles before any placement work begins. Detects:
//! - Invalid class count
//! - Duplicate IDs
//! - Constraints referencing students not on the roster
//! - Grouping constraints with fewer than two distinct students
//! - Inconsistent teacher profiles
//! - Negative or non-finite balance weights
//!
//! All issues are collected; validation never stops at the first one.

use crate::balance::BalanceWeights;
use crate::models::{Constraint, ConstraintKind, LevelTarget, Student, TeacherProfile};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Fewer than one class requested.
    InvalidClassCount,
    /// Two entities share the same ID.
    DuplicateId,
    /// A constraint references a student that is not on the roster.
    UnknownStudent,
    /// A together/separate group names fewer than two distinct students.
    UndersizedGroup,
    /// A teacher constraint has an empty teacher reference.
    MissingTeacher,
    /// A teacher profile is internally inconsistent.
    InvalidTeacherProfile,
    /// A balance weight is negative or not finite.
    InvalidWeight,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Validates the class count on its own.
pub fn validate_class_count(number_of_classes: usize) -> Result<(), ValidationError> {
    if number_of_classes < 1 {
        return Err(ValidationError::new(
            ValidationErrorKind::InvalidClassCount,
            "number of classes must be at least 1",
        ));
    }
    Ok(())
}

/// Validates the input of a placement run.
///
/// Checks:
/// 1. At least one class is requested
/// 2. No duplicate student IDs
/// 3. Every constraint references only rostered students
/// 4. Every grouping constraint names at least two distinct students
/// 5. Teacher constraints name a teacher
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(
    students: &[Student],
    number_of_classes: usize,
    constraints: &[Constraint],
) -> ValidationResult {
    let mut errors = Vec::new();

    if let Err(e) = validate_class_count(number_of_classes) {
        errors.push(e);
    }

    let mut student_ids = HashSet::new();
    for s in students {
        if !student_ids.insert(s.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate student ID: {}", s.id),
            ));
        }
    }

    for (idx, c) in constraints.iter().enumerate() {
        let label = constraint_label(c, idx);

        for sid in c.students() {
            if !student_ids.contains(sid) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownStudent,
                    format!("Constraint {label} references unknown student '{sid}'"),
                ));
            }
        }

        match &c.kind {
            ConstraintKind::MustBeTogether { students }
            | ConstraintKind::MustBeSeparate { students } => {
                let distinct: HashSet<&str> = students.iter().map(String::as_str).collect();
                if distinct.len() < 2 {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::UndersizedGroup,
                        format!("Constraint {label} needs at least two distinct students"),
                    ));
                }
            }
            ConstraintKind::PreferredTeacher { teacher, .. }
            | ConstraintKind::AvoidTeacher { teacher, .. } => {
                if teacher.trim().is_empty() {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::MissingTeacher,
                        format!("Constraint {label} has no teacher"),
                    ));
                }
            }
            ConstraintKind::BalancedDistribution { .. } | ConstraintKind::EqualClassSize => {}
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates teacher profiles.
///
/// Checks duplicate IDs, size window ordering (`min <= ideal <= max`),
/// target percentages within 0–100 with `preferred <= max`, and gender
/// importance within 1–5.
pub fn validate_teachers(teachers: &[TeacherProfile]) -> ValidationResult {
    let mut errors = Vec::new();
    let mut ids = HashSet::new();

    for t in teachers {
        if !ids.insert(t.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate teacher ID: {}", t.id),
            ));
        }

        let size = &t.class_size;
        if !(size.min <= size.ideal && size.ideal <= size.max) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidTeacherProfile,
                format!(
                    "Teacher '{}' class size must satisfy min <= ideal <= max ({} / {} / {})",
                    t.id, size.min, size.ideal, size.max
                ),
            ));
        }

        check_targets(&t.id, "academic", &t.academic_targets, &mut errors);
        check_targets(&t.id, "behavioral", &t.behavioral_targets, &mut errors);

        if !(1..=5).contains(&t.gender.importance) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidTeacherProfile,
                format!(
                    "Teacher '{}' gender importance {} is outside 1..=5",
                    t.id, t.gender.importance
                ),
            ));
        }
        for (gender, pct) in &t.gender.preferred_pct {
            if !(0.0..=100.0).contains(pct) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidTeacherProfile,
                    format!("Teacher '{}' {gender:?} ratio {pct} is outside 0..=100", t.id),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates balance weights: each must be finite and non-negative.
pub fn validate_weights(weights: &BalanceWeights) -> ValidationResult {
    let errors: Vec<ValidationError> = [
        ("gender", weights.gender),
        ("academic", weights.academic),
        ("behavioral", weights.behavioral),
        ("special_needs", weights.special_needs),
    ]
    .into_iter()
    .filter(|(_, w)| !w.is_finite() || *w < 0.0)
    .map(|(name, w)| {
        ValidationError::new(
            ValidationErrorKind::InvalidWeight,
            format!("Weight '{name}' must be a non-negative number, got {w}"),
        )
    })
    .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_targets<K: fmt::Debug>(
    teacher_id: &str,
    dimension: &str,
    targets: &BTreeMap<K, LevelTarget>,
    errors: &mut Vec<ValidationError>,
) {
    for (band, target) in targets {
        let in_range = (0.0..=100.0).contains(&target.preferred_pct)
            && (0.0..=100.0).contains(&target.max_pct);
        if !in_range || target.preferred_pct > target.max_pct {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidTeacherProfile,
                format!(
                    "Teacher '{teacher_id}' {dimension} target {band:?} must satisfy 0 <= preferred <= max <= 100"
                ),
            ));
        }
    }
}

fn constraint_label(c: &Constraint, idx: usize) -> String {
    if c.id.is_empty() {
        format!("#{idx}")
    } else {
        format!("'{}'", c.id)
    }
}
