//! In-memory persistence gateway for tests and local sessions.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use mockable::{Clock, DefaultClock};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::board::{
    domain::{Lane, NewTask, PersistedTaskData, Person, Progress, Task, TaskId, UserId},
    ports::{GatewayError, GatewayResult, LaneChange, PersistenceGateway},
};

/// Gateway operations, used to script failures and count calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayOperation {
    /// [`PersistenceGateway::fetch_tasks`].
    FetchTasks,
    /// [`PersistenceGateway::create_task`].
    CreateTask,
    /// [`PersistenceGateway::assign_users`].
    AssignUsers,
    /// [`PersistenceGateway::set_lane`].
    SetLane,
    /// [`PersistenceGateway::reorder`].
    Reorder,
    /// [`PersistenceGateway::delete_task`].
    DeleteTask,
    /// [`PersistenceGateway::list_assignable_users`].
    ListAssignableUsers,
}

/// Scripted misbehaviour for the next call of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScriptedFault {
    Unavailable,
    Hang,
}

/// Thread-safe in-memory gateway.
///
/// Tasks are kept in insertion order and returned sorted by lane rank, which
/// mirrors the `ORDER BY rank, created_at` of the `PostgreSQL` adapter.
#[derive(Debug, Clone)]
pub struct InMemoryGateway<C = DefaultClock>
where
    C: Clock + Send + Sync,
{
    state: Arc<RwLock<InMemoryBoardState>>,
    clock: Arc<C>,
}

#[derive(Debug, Default)]
struct InMemoryBoardState {
    tasks: Vec<StoredTask>,
    assignments: HashMap<TaskId, Vec<UserId>>,
    users: Vec<Person>,
    faults: HashMap<GatewayOperation, ScriptedFault>,
    offline: bool,
    calls: HashMap<GatewayOperation, usize>,
    next_sequence: u64,
}

#[derive(Debug, Clone)]
struct StoredTask {
    id: TaskId,
    title: String,
    description: Option<String>,
    due_date: NaiveDate,
    lane: Lane,
    progress: Progress,
    created_by: UserId,
    rank: u32,
    version: u64,
    created_at: DateTime<Utc>,
    sequence: u64,
}

impl InMemoryGateway<DefaultClock> {
    /// Creates an empty gateway using the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(DefaultClock))
    }
}

impl Default for InMemoryGateway<DefaultClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> InMemoryGateway<C>
where
    C: Clock + Send + Sync,
{
    /// Creates an empty gateway stamping tasks with `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<C>) -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryBoardState::default())),
            clock,
        }
    }

    /// Adds a person to the user directory.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Unavailable`] when lock acquisition fails.
    pub fn add_user(&self, person: Person) -> GatewayResult<()> {
        let mut state = self.write()?;
        state.users.retain(|known| known.id() != person.id());
        state.users.push(person);
        Ok(())
    }

    /// Makes the next call of `operation` fail with a store error.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Unavailable`] when lock acquisition fails.
    pub fn fail_next(&self, operation: GatewayOperation) -> GatewayResult<()> {
        self.write()?
            .faults
            .insert(operation, ScriptedFault::Unavailable);
        Ok(())
    }

    /// Makes the next call of `operation` never complete.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Unavailable`] when lock acquisition fails.
    pub fn hang_next(&self, operation: GatewayOperation) -> GatewayResult<()> {
        self.write()?.faults.insert(operation, ScriptedFault::Hang);
        Ok(())
    }

    /// Fails every call while `offline` is set.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Unavailable`] when lock acquisition fails.
    pub fn set_offline(&self, offline: bool) -> GatewayResult<()> {
        self.write()?.offline = offline;
        Ok(())
    }

    /// Number of calls made to `operation`, failed ones included.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Unavailable`] when lock acquisition fails.
    pub fn calls(&self, operation: GatewayOperation) -> GatewayResult<usize> {
        Ok(self.read()?.calls.get(&operation).copied().unwrap_or(0))
    }

    /// Moves a task as another session would, bumping its version.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] for an unknown task.
    pub fn force_lane(&self, task_id: TaskId, lane: Lane) -> GatewayResult<()> {
        let mut state = self.write()?;
        state.apply_lane(task_id, lane)?;
        Ok(())
    }

    /// Deletes a task as another session would.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] for an unknown task.
    pub fn force_delete(&self, task_id: TaskId) -> GatewayResult<()> {
        self.write()?.remove(task_id)
    }

    fn read(&self) -> GatewayResult<RwLockReadGuard<'_, InMemoryBoardState>> {
        self.state
            .read()
            .map_err(|err| GatewayError::unavailable(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> GatewayResult<RwLockWriteGuard<'_, InMemoryBoardState>> {
        self.state
            .write()
            .map_err(|err| GatewayError::unavailable(std::io::Error::other(err.to_string())))
    }

    /// Records the call and applies any scripted fault.
    async fn enter(&self, operation: GatewayOperation) -> GatewayResult<()> {
        let fault = {
            let mut state = self.write()?;
            *state.calls.entry(operation).or_insert(0) += 1;
            if state.offline {
                Some(ScriptedFault::Unavailable)
            } else {
                state.faults.remove(&operation)
            }
        };

        match fault {
            None => Ok(()),
            Some(ScriptedFault::Unavailable) => Err(GatewayError::unavailable(
                std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "store offline"),
            )),
            Some(ScriptedFault::Hang) => {
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }
}

impl InMemoryBoardState {
    fn find_mut(&mut self, task_id: TaskId) -> GatewayResult<&mut StoredTask> {
        self.tasks
            .iter_mut()
            .find(|stored| stored.id == task_id)
            .ok_or(GatewayError::NotFound(task_id))
    }

    fn next_rank(&self, lane: Lane, excluding: Option<TaskId>) -> u32 {
        self.tasks
            .iter()
            .filter(|stored| stored.lane == lane && Some(stored.id) != excluding)
            .map(|stored| stored.rank.saturating_add(1))
            .max()
            .unwrap_or(0)
    }

    fn apply_lane(&mut self, task_id: TaskId, lane: Lane) -> GatewayResult<()> {
        let rank = self.next_rank(lane, Some(task_id));
        let stored = self.find_mut(task_id)?;
        if stored.lane != lane {
            stored.lane = lane;
            stored.rank = rank;
        }
        stored.version = stored.version.saturating_add(1);
        Ok(())
    }

    fn remove(&mut self, task_id: TaskId) -> GatewayResult<()> {
        let before = self.tasks.len();
        self.tasks.retain(|stored| stored.id != task_id);
        if self.tasks.len() == before {
            return Err(GatewayError::NotFound(task_id));
        }
        self.assignments.remove(&task_id);
        Ok(())
    }

    fn person(&self, user_id: UserId) -> Option<&Person> {
        self.users.iter().find(|person| person.id() == user_id)
    }

    fn resolve(&self, stored: &StoredTask) -> GatewayResult<Task> {
        let created_by = self
            .person(stored.created_by)
            .cloned()
            .ok_or(GatewayError::UnknownUser(stored.created_by))?;
        let assignees = self
            .assignments
            .get(&stored.id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.person(*id).cloned())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Task::from_persisted(PersistedTaskData {
            id: stored.id,
            title: stored.title.clone(),
            description: stored.description.clone(),
            due_date: stored.due_date,
            lane: stored.lane,
            assignees,
            created_by,
            progress: stored.progress,
            rank: stored.rank,
            version: stored.version,
            created_at: stored.created_at,
        }))
    }

    fn resolve_id(&self, task_id: TaskId) -> GatewayResult<Task> {
        let stored = self
            .tasks
            .iter()
            .find(|stored| stored.id == task_id)
            .ok_or(GatewayError::NotFound(task_id))?;
        self.resolve(stored)
    }

    fn check_version(&self, change: &LaneChange) -> GatewayResult<()> {
        let Some(expected) = change.expected_version else {
            return Ok(());
        };
        let stored = self
            .tasks
            .iter()
            .find(|stored| stored.id == change.task_id)
            .ok_or(GatewayError::NotFound(change.task_id))?;
        if stored.version != expected {
            return Err(GatewayError::Conflict {
                task_id: change.task_id,
                expected,
                actual: stored.version,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl<C> PersistenceGateway for InMemoryGateway<C>
where
    C: Clock + Send + Sync,
{
    async fn fetch_tasks(&self) -> GatewayResult<Vec<Task>> {
        self.enter(GatewayOperation::FetchTasks).await?;
        let state = self.read()?;
        let mut ordered: Vec<&StoredTask> = state.tasks.iter().collect();
        ordered.sort_by_key(|stored| (stored.rank, stored.created_at, stored.sequence));
        ordered
            .into_iter()
            .map(|stored| state.resolve(stored))
            .collect()
    }

    async fn create_task(&self, task: &NewTask) -> GatewayResult<Task> {
        self.enter(GatewayOperation::CreateTask).await?;
        let mut state = self.write()?;
        if state.person(task.created_by()).is_none() {
            return Err(GatewayError::UnknownUser(task.created_by()));
        }

        let sequence = state.next_sequence;
        state.next_sequence = sequence.saturating_add(1);
        let stored = StoredTask {
            id: TaskId::new(),
            title: task.title().to_owned(),
            description: task.description().map(str::to_owned),
            due_date: task.due_date(),
            lane: task.lane(),
            progress: task.progress(),
            created_by: task.created_by(),
            rank: state.next_rank(task.lane(), None),
            version: 1,
            created_at: self.clock.utc(),
            sequence,
        };
        let created = state.resolve(&stored)?;
        state.tasks.push(stored);
        Ok(created)
    }

    async fn assign_users(&self, task_id: TaskId, user_ids: &[UserId]) -> GatewayResult<()> {
        self.enter(GatewayOperation::AssignUsers).await?;
        let mut state = self.write()?;
        state.find_mut(task_id)?;
        if let Some(unknown) = user_ids.iter().find(|id| state.person(**id).is_none()) {
            return Err(GatewayError::UnknownUser(*unknown));
        }

        let links = state.assignments.entry(task_id).or_default();
        let mut seen: HashSet<UserId> = links.iter().copied().collect();
        for user_id in user_ids {
            if seen.insert(*user_id) {
                links.push(*user_id);
            }
        }
        Ok(())
    }

    async fn set_lane(&self, change: &LaneChange) -> GatewayResult<Task> {
        self.enter(GatewayOperation::SetLane).await?;
        let mut state = self.write()?;
        state.check_version(change)?;
        state.apply_lane(change.task_id, change.lane)?;
        state.resolve_id(change.task_id)
    }

    async fn reorder(&self, task_id: TaskId, lane: Lane, index: usize) -> GatewayResult<Task> {
        self.enter(GatewayOperation::Reorder).await?;
        let mut state = self.write()?;
        state.find_mut(task_id)?;

        let mut siblings: Vec<(u32, u64, TaskId)> = state
            .tasks
            .iter()
            .filter(|stored| stored.lane == lane && stored.id != task_id)
            .map(|stored| (stored.rank, stored.sequence, stored.id))
            .collect();
        siblings.sort_unstable();
        let mut order: Vec<TaskId> = siblings.into_iter().map(|(_, _, id)| id).collect();
        order.insert(index.min(order.len()), task_id);

        for (rank, id) in (0_u32..).zip(order) {
            let stored = state.find_mut(id)?;
            stored.rank = rank;
            if id == task_id {
                stored.lane = lane;
                stored.version = stored.version.saturating_add(1);
            }
        }
        state.resolve_id(task_id)
    }

    async fn delete_task(&self, task_id: TaskId) -> GatewayResult<()> {
        self.enter(GatewayOperation::DeleteTask).await?;
        self.write()?.remove(task_id)
    }

    async fn list_assignable_users(&self) -> GatewayResult<Vec<Person>> {
        self.enter(GatewayOperation::ListAssignableUsers).await?;
        let mut users = self.read()?.users.clone();
        users.sort_by(|left, right| left.name().cmp(right.name()));
        Ok(users)
    }
}
