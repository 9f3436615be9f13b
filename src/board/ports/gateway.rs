//! Persistence port for tasks, assignment links and the user directory.

use crate::board::domain::{
    BoardDomainError, ErrorKind, Lane, NewTask, Person, Task, TaskId, UserId,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Request to persist a task's lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneChange {
    /// Task to update.
    pub task_id: TaskId,
    /// New lane.
    pub lane: Lane,
    /// Version the caller last observed; `None` skips the check.
    pub expected_version: Option<u64>,
}

impl LaneChange {
    /// Creates an unchecked lane change.
    #[must_use]
    pub const fn new(task_id: TaskId, lane: Lane) -> Self {
        Self {
            task_id,
            lane,
            expected_version: None,
        }
    }

    /// Requires the stored version to equal `version`.
    #[must_use]
    pub const fn expecting_version(mut self, version: u64) -> Self {
        self.expected_version = Some(version);
        self
    }
}

/// Durable storage contract used by the board.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Returns every task visible to the current identity, with assignees
    /// resolved, ordered by lane rank and then creation time.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Unavailable`] on connectivity or auth errors.
    async fn fetch_tasks(&self) -> GatewayResult<Vec<Task>>;

    /// Creates a task at the end of its lane.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Validation`] when required fields are
    /// rejected, [`GatewayError::Unavailable`] otherwise.
    async fn create_task(&self, task: &NewTask) -> GatewayResult<Task>;

    /// Links users to a task. Either every link is stored or none is.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] for an unknown task and
    /// [`GatewayError::UnknownUser`] for an unknown user.
    async fn assign_users(&self, task_id: TaskId, user_ids: &[UserId]) -> GatewayResult<()>;

    /// Persists a lane and returns the stored task.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] when the task no longer exists and
    /// [`GatewayError::Conflict`] when the expected version is stale.
    async fn set_lane(&self, change: &LaneChange) -> GatewayResult<Task>;

    /// Persists the position of a task within `lane`, clamping `index` to
    /// the lane length, and returns the stored task.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] when the task no longer exists.
    async fn reorder(&self, task_id: TaskId, lane: Lane, index: usize) -> GatewayResult<Task>;

    /// Deletes a task and its assignment links.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] when the task no longer exists.
    async fn delete_task(&self, task_id: TaskId) -> GatewayResult<()>;

    /// Lists people that can be assigned to tasks.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Unavailable`] when the directory cannot be
    /// read.
    async fn list_assignable_users(&self) -> GatewayResult<Vec<Person>>;
}

/// Errors returned by gateway implementations.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The stored version differs from the one the caller observed.
    #[error("task {task_id} was modified concurrently (expected version {expected}, found {actual})")]
    Conflict {
        /// Task identifier.
        task_id: TaskId,
        /// Version the caller expected.
        expected: u64,
        /// Version currently stored.
        actual: u64,
    },

    /// The payload was rejected.
    #[error(transparent)]
    Validation(#[from] BoardDomainError),

    /// An assignee is not in the user directory.
    #[error("unknown user: {0}")]
    UnknownUser(UserId),

    /// The call did not complete in time.
    #[error("persistence call timed out after {0:?}")]
    Timeout(Duration),

    /// Persistence-layer failure.
    #[error("store unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl GatewayError {
    /// Wraps a backend error.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }

    /// Failure category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Validation(_) | Self::UnknownUser(_) => ErrorKind::ValidationFailed,
            Self::Timeout(_) | Self::Unavailable(_) => ErrorKind::StoreUnavailable,
        }
    }
}

/// Runs a gateway call under a deadline; running out of time is a failure.
///
/// Expiry only drops the future. Work an adapter has already handed to
/// another thread keeps running, so adapters that do so must enforce the same
/// limit themselves; `PostgresGateway::connect` rolls back writes that finish
/// late.
///
/// # Errors
///
/// Returns the call's own error, or [`GatewayError::Timeout`].
pub async fn with_deadline<T>(
    limit: Duration,
    call: impl Future<Output = GatewayResult<T>>,
) -> GatewayResult<T> {
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| GatewayError::Timeout(limit))?
}
