//! `PostgreSQL` gateway implementation for board storage.

use super::{
    models::{AssigneeRow, NewTaskRow, ProfileRow, TaskRow},
    pool::StatementTimeout,
    schema::{profiles, task_assignees, tasks},
};
use crate::board::{
    domain::{Lane, NewTask, PersistedTaskData, Person, Progress, Task, TaskId, UserId},
    ports::{GatewayError, GatewayResult, LaneChange, PersistenceGateway},
};
use crate::config::BoardConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use mockable::{Clock, DefaultClock};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// `PostgreSQL` connection pool type used by the board gateway.
pub type BoardPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed persistence gateway.
#[derive(Debug, Clone)]
pub struct PostgresGateway<C = DefaultClock>
where
    C: Clock + Send + Sync,
{
    pool: BoardPgPool,
    clock: Arc<C>,
    call_timeout: Option<Duration>,
}

impl PostgresGateway<DefaultClock> {
    /// Creates a gateway from a connection pool using the system clock.
    #[must_use]
    pub fn new(pool: BoardPgPool) -> Self {
        Self::with_clock(pool, Arc::new(DefaultClock))
    }

    /// Connects to `database_url` with calls bounded by the session timeout.
    ///
    /// Every pooled connection carries a matching `statement_timeout`, and
    /// writes that finish after the deadline roll back, so a call the session
    /// already reported as timed out never commits afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Unavailable`] when the pool cannot be built.
    pub fn connect(database_url: &str, config: &BoardConfig) -> GatewayResult<Self> {
        let limit = config.persistence_timeout;
        let manager = ConnectionManager::<PgConnection>::new(database_url);
        let pool = Pool::builder()
            .connection_customizer(Box::new(StatementTimeout::new(limit)))
            .build(manager)
            .map_err(GatewayError::unavailable)?;
        Ok(Self::new(pool).with_call_timeout(limit))
    }
}

impl<C> PostgresGateway<C>
where
    C: Clock + Send + Sync,
{
    /// Creates a gateway stamping new tasks with `clock`.
    #[must_use]
    pub const fn with_clock(pool: BoardPgPool, clock: Arc<C>) -> Self {
        Self {
            pool,
            clock,
            call_timeout: None,
        }
    }

    /// Rolls back writes still running once `limit` has passed.
    #[must_use]
    pub const fn with_call_timeout(mut self, limit: Duration) -> Self {
        self.call_timeout = Some(limit);
        self
    }

    async fn run_blocking<F, T>(&self, f: F) -> GatewayResult<T>
    where
        F: FnOnce(&mut PgConnection) -> GatewayResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        let deadline = self.call_timeout.map(|limit| (Instant::now(), limit));
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(GatewayError::unavailable)?;
            check_deadline(deadline)?;
            f(&mut connection)
        })
        .await
        .map_err(GatewayError::unavailable)?
    }

    async fn run_transaction<F, T>(&self, f: F) -> GatewayResult<T>
    where
        F: FnOnce(&mut PgConnection) -> GatewayResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let deadline = self.call_timeout.map(|limit| (Instant::now(), limit));
        self.run_blocking(move |connection| {
            connection.transaction::<_, GatewayError, _>(|conn| {
                let value = f(conn)?;
                check_deadline(deadline)?;
                Ok(value)
            })
        })
        .await
    }
}

impl From<DieselError> for GatewayError {
    fn from(err: DieselError) -> Self {
        Self::unavailable(err)
    }
}

#[async_trait]
impl<C> PersistenceGateway for PostgresGateway<C>
where
    C: Clock + Send + Sync,
{
    async fn fetch_tasks(&self) -> GatewayResult<Vec<Task>> {
        self.run_blocking(|connection| {
            let rows = tasks::table
                .order((tasks::rank.asc(), tasks::created_at.asc()))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?;
            let links = task_assignees::table
                .select(AssigneeRow::as_select())
                .load::<AssigneeRow>(connection)?;
            let directory = load_directory(connection)?;
            let assignments = group_assignments(links);

            rows.into_iter()
                .map(|row| row_to_task(row, &directory, &assignments))
                .collect()
        })
        .await
    }

    async fn create_task(&self, task: &NewTask) -> GatewayResult<Task> {
        let new_task = task.clone();
        let task_id = TaskId::new().into_inner();
        let created_at = self.clock.utc();

        self.run_transaction(move |conn| {
            // Pre-check for a semantic error; the foreign key still guards
            // the insert itself.
            ensure_profile(conn, new_task.created_by())?;
            let rank = next_rank(conn, new_task.lane(), None)?;
            let row = to_new_row(task_id, &new_task, rank, created_at);

            diesel::insert_into(tasks::table)
                .values(&row)
                .execute(conn)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                        GatewayError::UnknownUser(new_task.created_by())
                    }
                    other => GatewayError::unavailable(other),
                })?;
            load_task(conn, task_id)
        })
        .await
    }

    async fn assign_users(&self, task_id: TaskId, user_ids: &[UserId]) -> GatewayResult<()> {
        let task_uuid = task_id.into_inner();
        let mut users: Vec<Uuid> = Vec::with_capacity(user_ids.len());
        for user_id in user_ids {
            if !users.contains(&user_id.into_inner()) {
                users.push(user_id.into_inner());
            }
        }

        self.run_transaction(move |conn| {
            lock_task(conn, task_uuid)?;
            let known: Vec<Uuid> = profiles::table
                .filter(profiles::id.eq_any(users.clone()))
                .select(profiles::id)
                .load(conn)?;
            if let Some(unknown) = users.iter().find(|id| !known.contains(id)) {
                return Err(GatewayError::UnknownUser(UserId::from_uuid(*unknown)));
            }

            let rows: Vec<AssigneeRow> = users
                .iter()
                .map(|user_id| AssigneeRow {
                    task_id: task_uuid,
                    user_id: *user_id,
                })
                .collect();
            diesel::insert_into(task_assignees::table)
                .values(&rows)
                .on_conflict_do_nothing()
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    async fn set_lane(&self, change: &LaneChange) -> GatewayResult<Task> {
        let request = *change;
        let task = self
            .run_transaction(move |conn| {
                let row = lock_task(conn, request.task_id.into_inner())?;
                if let Some(expected) = request.expected_version {
                    let actual = to_u64(row.version)?;
                    if actual != expected {
                        return Err(GatewayError::Conflict {
                            task_id: request.task_id,
                            expected,
                            actual,
                        });
                    }
                }

                let rank = if row.lane == request.lane.as_str() {
                    row.rank
                } else {
                    next_rank(conn, request.lane, Some(row.id))?
                };
                diesel::update(tasks::table.find(row.id))
                    .set((
                        tasks::lane.eq(request.lane.as_str()),
                        tasks::rank.eq(rank),
                        tasks::version.eq(tasks::version + 1_i64),
                    ))
                    .execute(conn)?;
                load_task(conn, row.id)
            })
            .await?;

        tracing::debug!(
            task_id = %task.id(),
            lane = %task.lane(),
            version = task.version(),
            "lane persisted"
        );
        Ok(task)
    }

    async fn reorder(&self, task_id: TaskId, lane: Lane, index: usize) -> GatewayResult<Task> {
        let task_uuid = task_id.into_inner();
        self.run_transaction(move |conn| {
            lock_task(conn, task_uuid)?;
            let siblings: Vec<Uuid> = tasks::table
                .filter(tasks::lane.eq(lane.as_str()))
                .filter(tasks::id.ne(task_uuid))
                .order((tasks::rank.asc(), tasks::created_at.asc()))
                .select(tasks::id)
                .load(conn)?;

            for (rank, id) in (0_i32..).zip(splice_order(siblings, task_uuid, index)) {
                diesel::update(tasks::table.find(id))
                    .set(tasks::rank.eq(rank))
                    .execute(conn)?;
            }
            diesel::update(tasks::table.find(task_uuid))
                .set((
                    tasks::lane.eq(lane.as_str()),
                    tasks::version.eq(tasks::version + 1_i64),
                ))
                .execute(conn)?;
            load_task(conn, task_uuid)
        })
        .await
    }

    async fn delete_task(&self, task_id: TaskId) -> GatewayResult<()> {
        let task_uuid = task_id.into_inner();
        self.run_transaction(move |conn| {
            diesel::delete(task_assignees::table.filter(task_assignees::task_id.eq(task_uuid)))
                .execute(conn)?;
            let deleted = diesel::delete(tasks::table.find(task_uuid)).execute(conn)?;
            if deleted == 0 {
                return Err(GatewayError::NotFound(task_id));
            }
            Ok(())
        })
        .await
    }

    async fn list_assignable_users(&self) -> GatewayResult<Vec<Person>> {
        self.run_blocking(|connection| {
            profiles::table
                .order(profiles::full_name.asc())
                .select(ProfileRow::as_select())
                .load::<ProfileRow>(connection)?
                .into_iter()
                .map(profile_to_person)
                .collect()
        })
        .await
    }
}

fn check_deadline(deadline: Option<(Instant, Duration)>) -> GatewayResult<()> {
    match deadline {
        Some((started, limit)) if started.elapsed() >= limit => Err(GatewayError::Timeout(limit)),
        _ => Ok(()),
    }
}

fn lock_task(connection: &mut PgConnection, task_id: Uuid) -> GatewayResult<TaskRow> {
    tasks::table
        .find(task_id)
        .select(TaskRow::as_select())
        .for_update()
        .first::<TaskRow>(connection)
        .optional()?
        .ok_or(GatewayError::NotFound(TaskId::from_uuid(task_id)))
}

fn load_task(connection: &mut PgConnection, task_id: Uuid) -> GatewayResult<Task> {
    let row = tasks::table
        .find(task_id)
        .select(TaskRow::as_select())
        .first::<TaskRow>(connection)
        .optional()?
        .ok_or(GatewayError::NotFound(TaskId::from_uuid(task_id)))?;
    let links = task_assignees::table
        .filter(task_assignees::task_id.eq(task_id))
        .select(AssigneeRow::as_select())
        .load::<AssigneeRow>(connection)?;
    let directory = load_directory(connection)?;
    row_to_task(row, &directory, &group_assignments(links))
}

fn ensure_profile(connection: &mut PgConnection, user_id: UserId) -> GatewayResult<()> {
    let found = profiles::table
        .find(user_id.into_inner())
        .select(profiles::id)
        .first::<Uuid>(connection)
        .optional()?;
    found
        .map(|_| ())
        .ok_or(GatewayError::UnknownUser(user_id))
}

fn next_rank(
    connection: &mut PgConnection,
    lane: Lane,
    excluding: Option<Uuid>,
) -> GatewayResult<i32> {
    let mut query = tasks::table
        .filter(tasks::lane.eq(lane.as_str()))
        .into_boxed();
    if let Some(task_id) = excluding {
        query = query.filter(tasks::id.ne(task_id));
    }
    let highest: Option<i32> = query
        .select(diesel::dsl::max(tasks::rank))
        .first(connection)?;
    Ok(highest.map_or(0, |rank| rank.saturating_add(1)))
}

fn load_directory(connection: &mut PgConnection) -> GatewayResult<HashMap<Uuid, Person>> {
    profiles::table
        .select(ProfileRow::as_select())
        .load::<ProfileRow>(connection)?
        .into_iter()
        .map(|row| {
            let id = row.id;
            profile_to_person(row).map(|person| (id, person))
        })
        .collect()
}

fn profile_to_person(row: ProfileRow) -> GatewayResult<Person> {
    Person::new(UserId::from_uuid(row.id), row.full_name).map_err(GatewayError::unavailable)
}

fn group_assignments(links: Vec<AssigneeRow>) -> HashMap<Uuid, Vec<Uuid>> {
    let mut grouped: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for link in links {
        grouped.entry(link.task_id).or_default().push(link.user_id);
    }
    grouped
}

/// Inserts `task_id` among its ordered lane siblings at a clamped index.
fn splice_order(mut siblings: Vec<Uuid>, task_id: Uuid, index: usize) -> Vec<Uuid> {
    siblings.retain(|id| *id != task_id);
    siblings.insert(index.min(siblings.len()), task_id);
    siblings
}

fn to_u64(value: i64) -> GatewayResult<u64> {
    u64::try_from(value).map_err(GatewayError::unavailable)
}

fn to_new_row(
    task_id: Uuid,
    task: &NewTask,
    rank: i32,
    created_at: DateTime<Utc>,
) -> NewTaskRow {
    NewTaskRow {
        id: task_id,
        title: task.title().to_owned(),
        description: task.description().map(str::to_owned),
        due_date: task.due_date(),
        lane: task.lane().as_str().to_owned(),
        progress: i16::from(task.progress().value()),
        rank,
        version: 1,
        created_by: task.created_by().into_inner(),
        created_at,
    }
}

fn row_to_task(
    row: TaskRow,
    directory: &HashMap<Uuid, Person>,
    assignments: &HashMap<Uuid, Vec<Uuid>>,
) -> GatewayResult<Task> {
    let TaskRow {
        id,
        title,
        description,
        due_date,
        lane: persisted_lane,
        progress: persisted_progress,
        rank: persisted_rank,
        version: persisted_version,
        created_by: creator_id,
        created_at,
    } = row;

    let lane = Lane::try_from(persisted_lane.as_str()).map_err(GatewayError::unavailable)?;
    let percentage = u8::try_from(persisted_progress).map_err(GatewayError::unavailable)?;
    let progress = Progress::new(percentage).map_err(GatewayError::unavailable)?;
    let rank = u32::try_from(persisted_rank).map_err(GatewayError::unavailable)?;
    let version = to_u64(persisted_version)?;
    let created_by = directory
        .get(&creator_id)
        .cloned()
        .ok_or(GatewayError::UnknownUser(UserId::from_uuid(creator_id)))?;
    let assignees = assignments
        .get(&id)
        .map(|user_ids| {
            user_ids
                .iter()
                .filter_map(|user_id| directory.get(user_id).cloned())
                .collect()
        })
        .unwrap_or_default();

    Ok(Task::from_persisted(PersistedTaskData {
        id: TaskId::from_uuid(id),
        title,
        description,
        due_date,
        lane,
        assignees,
        created_by,
        progress,
        rank,
        version,
        created_at,
    }))
}
