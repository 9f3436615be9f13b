//! Status lanes and the single column view rendered per lane.

use super::{ParseLaneError, Task};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the three fixed status lanes a task can occupy.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Lane {
    /// Work that has been planned but not started.
    #[default]
    Upcoming,
    /// Work that is ready to be picked up.
    Todo,
    /// Finished work.
    Completed,
}

impl Lane {
    /// All lanes in board order, left to right.
    pub const ALL: [Self; 3] = [Self::Upcoming, Self::Todo, Self::Completed];

    /// Returns the display and storage name of the lane.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Upcoming => "Upcoming",
            Self::Todo => "Todo",
            Self::Completed => "Completed",
        }
    }

    /// Position of the lane within [`Lane::ALL`].
    #[must_use]
    pub const fn ordinal(self) -> usize {
        match self {
            Self::Upcoming => 0,
            Self::Todo => 1,
            Self::Completed => 2,
        }
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Lane {
    type Error = ParseLaneError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "upcoming" => Ok(Self::Upcoming),
            "todo" => Ok(Self::Todo),
            "completed" => Ok(Self::Completed),
            _ => Err(ParseLaneError(value.to_owned())),
        }
    }
}

/// Read-only view of one lane's tasks, in render order.
///
/// The same type backs every lane; callers parameterize by [`Lane`] instead
/// of keeping one renderer per column.
#[derive(Debug, Clone, Copy)]
pub struct Column<'a> {
    lane: Lane,
    tasks: &'a [Task],
}

impl<'a> Column<'a> {
    pub(crate) const fn new(lane: Lane, tasks: &'a [Task]) -> Self {
        Self { lane, tasks }
    }

    /// Lane this column renders.
    #[must_use]
    pub const fn lane(&self) -> Lane {
        self.lane
    }

    /// Column heading.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        self.lane.as_str()
    }

    /// Tasks in render order.
    #[must_use]
    pub const fn tasks(&self) -> &'a [Task] {
        self.tasks
    }

    /// Number of tasks in the column.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns `true` when the column holds no tasks.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
