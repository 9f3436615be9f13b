//! Error taxonomy and domain validation errors for the task board.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Coarse failure category shared by every board layer.
///
/// Callers decide recovery by kind: validation failures stay local, missing
/// tasks trigger a resync, and unavailable or conflicting stores are reported
/// and rolled back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A required field was missing or malformed.
    ValidationFailed,
    /// The target task no longer exists.
    NotFound,
    /// The backing store could not be reached or failed internally.
    StoreUnavailable,
    /// A concurrent writer changed the task first.
    Conflict,
}

impl ErrorKind {
    /// Returns the canonical snake-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValidationFailed => "validation_failed",
            Self::NotFound => "not_found",
            Self::StoreUnavailable => "store_unavailable",
            Self::Conflict => "conflict",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned while constructing board domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BoardDomainError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// No due date was supplied.
    #[error("task due date is required")]
    MissingDueDate,

    /// Progress outside the 0..=100 range.
    #[error("invalid progress {0}, expected a percentage between 0 and 100")]
    InvalidProgress(u8),

    /// A person name is empty after trimming.
    #[error("person name must not be empty")]
    EmptyPersonName,
}

impl BoardDomainError {
    /// Every domain error is a validation failure.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::ValidationFailed
    }
}

/// Error returned while parsing lanes from persistence or user input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown lane: {0}")]
pub struct ParseLaneError(pub String);
