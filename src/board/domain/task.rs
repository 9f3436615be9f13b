//! Task entity and the validated payload used to create one.

use super::{BoardDomainError, Lane, Person, TaskId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Completion percentage shown on an expanded task card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Progress(u8);

impl Progress {
    /// Largest accepted percentage.
    pub const MAX: u8 = 100;

    /// Creates a validated percentage.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::InvalidProgress`] above 100.
    pub const fn new(value: u8) -> Result<Self, BoardDomainError> {
        if value > Self::MAX {
            return Err(BoardDomainError::InvalidProgress(value));
        }
        Ok(Self(value))
    }

    /// Returns the percentage.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// A card on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    title: String,
    description: Option<String>,
    due_date: NaiveDate,
    lane: Lane,
    assignees: Vec<Person>,
    created_by: Person,
    progress: Progress,
    rank: u32,
    version: u64,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted title.
    pub title: String,
    /// Persisted description, if any.
    pub description: Option<String>,
    /// Persisted due date.
    pub due_date: NaiveDate,
    /// Persisted lane.
    pub lane: Lane,
    /// Resolved assignees.
    pub assignees: Vec<Person>,
    /// Resolved creator.
    pub created_by: Person,
    /// Persisted progress.
    pub progress: Progress,
    /// Persisted position within the lane.
    pub rank: u32,
    /// Persisted mutation counter.
    pub version: u64,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Reconstructs a task from persisted storage.
    ///
    /// Assignees are de-duplicated by id, keeping the first occurrence.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        let mut assignees: Vec<Person> = Vec::with_capacity(data.assignees.len());
        for person in data.assignees {
            if !assignees.iter().any(|known| known.id() == person.id()) {
                assignees.push(person);
            }
        }

        Self {
            id: data.id,
            title: data.title,
            description: data.description,
            due_date: data.due_date,
            lane: data.lane,
            assignees,
            created_by: data.created_by,
            progress: data.progress,
            rank: data.rank,
            version: data.version,
            created_at: data.created_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the due date.
    #[must_use]
    pub const fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    /// Returns the lane the task currently renders in.
    #[must_use]
    pub const fn lane(&self) -> Lane {
        self.lane
    }

    /// Returns the assignees.
    #[must_use]
    pub fn assignees(&self) -> &[Person] {
        &self.assignees
    }

    /// Returns the creator.
    #[must_use]
    pub const fn created_by(&self) -> &Person {
        &self.created_by
    }

    /// Returns the progress percentage.
    #[must_use]
    pub const fn progress(&self) -> Progress {
        self.progress
    }

    /// Returns the persisted position within the lane.
    #[must_use]
    pub const fn rank(&self) -> u32 {
        self.rank
    }

    /// Returns the persisted mutation counter.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Moves the local projection to another lane without touching the
    /// persisted counters.
    pub(crate) const fn relocate(&mut self, lane: Lane) {
        self.lane = lane;
    }
}

/// Validated payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    title: String,
    description: Option<String>,
    due_date: NaiveDate,
    lane: Lane,
    progress: Progress,
    created_by: UserId,
}

impl NewTask {
    /// Creates a payload from the required fields.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::EmptyTitle`] for a blank title and
    /// [`BoardDomainError::MissingDueDate`] when no due date is given.
    pub fn new(
        title: impl Into<String>,
        due_date: Option<NaiveDate>,
        created_by: UserId,
    ) -> Result<Self, BoardDomainError> {
        let raw = title.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(BoardDomainError::EmptyTitle);
        }
        let due = due_date.ok_or(BoardDomainError::MissingDueDate)?;

        Ok(Self {
            title: trimmed.to_owned(),
            description: None,
            due_date: due,
            lane: Lane::default(),
            progress: Progress::default(),
            created_by,
        })
    }

    /// Sets the description. Blank descriptions are dropped.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let raw = description.into();
        let trimmed = raw.trim();
        self.description = (!trimmed.is_empty()).then(|| trimmed.to_owned());
        self
    }

    /// Sets the starting lane.
    #[must_use]
    pub const fn with_lane(mut self, lane: Lane) -> Self {
        self.lane = lane;
        self
    }

    /// Sets the starting progress.
    #[must_use]
    pub const fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the due date.
    #[must_use]
    pub const fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    /// Returns the starting lane.
    #[must_use]
    pub const fn lane(&self) -> Lane {
        self.lane
    }

    /// Returns the starting progress.
    #[must_use]
    pub const fn progress(&self) -> Progress {
        self.progress
    }

    /// Returns the creator's identifier.
    #[must_use]
    pub const fn created_by(&self) -> UserId {
        self.created_by
    }
}
