//! Placement domain models.
//!
//! Core data types for a placement run. Every value here is built fresh
//! from the caller's input snapshot and is discarded after the run.
//!
//! | Type | Role |
//! |------|------|
//! | `Student` | Unit being placed |
//! | `Constraint` | Grouping rule, teacher preference, or distribution directive |
//! | `ClassBucket` | One target classroom and its computed scores |
//! | `TeacherProfile` | Declared class-composition preferences |

mod class;
mod constraint;
mod student;
mod teacher;

pub use class::{BalanceScores, ClassBucket, ClassCapacity};
pub use constraint::{BalanceFactor, Constraint, ConstraintKind, Priority};
pub use student::{Gender, Level, LevelBand, Student, SupportPlan};
pub use teacher::{
    ClassSizePreference, GenderPreference, LevelTarget, SpecialEdCapacity, TeacherProfile,
};
