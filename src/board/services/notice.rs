//! User-visible notices raised instead of propagating failures.

use crate::board::domain::{ErrorKind, TaskId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A failure message the board shows to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    kind: ErrorKind,
    message: String,
    task_id: Option<TaskId>,
}

impl Notice {
    /// Creates a notice about the board as a whole.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            task_id: None,
        }
    }

    /// Creates a notice about one task.
    #[must_use]
    pub fn for_task(kind: ErrorKind, task_id: TaskId, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            task_id: Some(task_id),
        }
    }

    /// Failure category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Text shown to the user.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Task the notice refers to, if any.
    #[must_use]
    pub const fn task_id(&self) -> Option<TaskId> {
        self.task_id
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
