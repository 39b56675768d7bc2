//! Error types for placement runs.

use thiserror::Error;

use crate::validation::ValidationError;

/// Main error type for placement operations.
///
/// Raised before any placement work starts; a failed run never yields a
/// partial placement.
#[derive(Debug, Error)]
pub enum PlacementError {
    /// Malformed or missing input.
    #[error("invalid placement input: {}", summarize(.0))]
    Validation(Vec<ValidationError>),

    /// A student pair is required both together and apart.
    #[error("students '{first}' and '{second}' are required together and apart")]
    Conflict { first: String, second: String },

    /// The data source returned no students for the requested grade.
    #[error("no students found for grade {grade}")]
    NoStudents { grade: u8 },

    /// The data source failed to produce its snapshot.
    #[error("data source error: {0}")]
    Source(String),
}

impl PlacementError {
    /// Shorthand for a single validation failure.
    pub fn invalid(error: ValidationError) -> Self {
        Self::Validation(vec![error])
    }
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for placement operations.
pub type Result<T> = std::result::Result<T, PlacementError>;
