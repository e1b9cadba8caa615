//! Error types for pattern configuration and digitization.
//!
//! Structural errors (`InvalidCount`, `IncompleteRule`, `UnknownQuestion`) are
//! raised before any state is committed. `StudentNotFound` is recoverable: the
//! grader corrects the roll number and retries.

use thiserror::Error;

use crate::model::ExamId;

/// Errors raised by the pattern grid, choice rules and digitization session.
#[derive(Debug, Error)]
pub enum SheetError {
    /// A grid was requested with fewer than one question.
    #[error("a pattern needs at least one question, got {0}")]
    InvalidCount(i64),

    /// A question number outside the generated grid was addressed.
    #[error("question {0} is not part of the grid")]
    UnknownQuestion(u32),

    /// A choice rule was submitted with a missing or blank field.
    #[error("choice rule is incomplete: {field} is missing")]
    IncompleteRule { field: &'static str },

    /// The exam's pattern could not be resolved.
    #[error("no pattern configured for exam {0}")]
    ConfigNotFound(ExamId),

    /// No roster student's roll identifier ends with the given suffix.
    #[error("student with roll number suffix \"{suffix}\" not found in this batch")]
    StudentNotFound { suffix: String },

    /// `save` or `edit_mark` was called with no sheet being verified.
    #[error("no answer sheet is currently captured")]
    NoCaptureInFlight,

    /// The record store could not be reached.
    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

impl SheetError {
    /// Returns `true` if the grader can fix the input and retry the same step.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SheetError::StudentNotFound { .. } | SheetError::NoCaptureInFlight
        )
    }
}

/// Failures reported by a [`RecordStore`](crate::traits::RecordStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be read or written.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A record with the same natural key already exists.
    #[error("duplicate record: {0}")]
    Duplicate(String),
}

impl From<StoreError> for SheetError {
    fn from(err: StoreError) -> Self {
        SheetError::Unavailable(err.to_string())
    }
}
