//! Shared helpers for `PostgreSQL` board gateway tests.

use chrono::NaiveDate;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use pg_embedded_setup_unpriv::TestCluster;
use taskboard::board::{
    adapters::postgres::PostgresGateway,
    domain::{Lane, NewTask, Person, Task, UserId},
    ports::PersistenceGateway,
};
use taskboard::config::BoardConfig;
use tokio::runtime::Runtime;

/// Board schema applied to the template database.
pub const CREATE_BOARD_SQL: &str =
    include_str!("../../migrations/2026-10-01-000000_create_board/up.sql");

/// Template database name for the pre-migrated schema.
pub const TEMPLATE_DB: &str = "taskboard_test_template";

/// Creates a runtime for driving the async gateway from sync tests.
pub fn test_runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to create test runtime")
}

/// Ensures the template database exists with the board schema applied.
///
/// # Errors
///
/// Returns an error if the template cannot be created or migrated.
pub fn ensure_template(cluster: &TestCluster) -> eyre::Result<()> {
    cluster
        .ensure_template_exists(TEMPLATE_DB, |db_name| {
            let url = cluster.connection().database_url(db_name);
            let mut conn = PgConnection::establish(&url).map_err(|e| eyre::eyre!("{e}"))?;
            conn.batch_execute(CREATE_BOARD_SQL)
                .map_err(|e| eyre::eyre!("apply board schema: {e}"))?;
            Ok(())
        })
        .map_err(|e| eyre::eyre!("template setup: {e}"))
}

/// Drops the per-test database even when the test panics.
pub struct CleanupGuard {
    cluster: &'static TestCluster,
    db_name: String,
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if let Err(e) = self.cluster.drop_database(self.db_name.as_str()) {
            eprintln!("Warning: failed to drop test database {}: {e}", self.db_name);
        }
    }
}

/// A migrated database with two registered people.
pub struct PreparedBoard {
    pub gateway: PostgresGateway,
    pub url: String,
    pub owner: Person,
    pub teammate: Person,
    _cleanup: CleanupGuard,
}

/// Creates a fresh database from the template and connects a gateway.
///
/// # Errors
///
/// Returns an error if database creation, seeding or connection fails.
pub fn prepare_board(
    cluster: &'static TestCluster,
    prefix: &str,
    config: &BoardConfig,
) -> eyre::Result<PreparedBoard> {
    ensure_template(cluster)?;
    let db_name = format!("{prefix}_{}", uuid::Uuid::new_v4().simple());
    cluster
        .create_database_from_template(db_name.as_str(), TEMPLATE_DB)
        .map_err(|e| eyre::eyre!("create database: {e}"))?;
    let cleanup = CleanupGuard {
        cluster,
        db_name: db_name.clone(),
    };
    let url = cluster.connection().database_url(&db_name);

    let owner = Person::new(UserId::new(), "Ada Lovelace")?;
    let teammate = Person::new(UserId::new(), "Grace Hopper")?;
    insert_profile(&url, &owner)?;
    insert_profile(&url, &teammate)?;

    let gateway = PostgresGateway::connect(&url, config)?;
    Ok(PreparedBoard {
        gateway,
        url,
        owner,
        teammate,
        _cleanup: cleanup,
    })
}

/// Registers `person` in the profile directory.
///
/// # Errors
///
/// Returns an error if the connection or insert fails.
pub fn insert_profile(url: &str, person: &Person) -> eyre::Result<()> {
    let mut conn = PgConnection::establish(url).map_err(|e| eyre::eyre!("{e}"))?;
    diesel::sql_query("INSERT INTO profiles (id, full_name) VALUES ($1, $2)")
        .bind::<diesel::sql_types::Uuid, _>(person.id().into_inner())
        .bind::<diesel::sql_types::Text, _>(person.name())
        .execute(&mut conn)
        .map_err(|e| eyre::eyre!("insert profile: {e}"))?;
    Ok(())
}

/// Fixed due date used by every seeded task.
///
/// # Errors
///
/// Returns an error if the literal date is invalid.
pub fn due() -> eyre::Result<NaiveDate> {
    NaiveDate::from_ymd_opt(2026, 12, 1).ok_or_else(|| eyre::eyre!("invalid due date"))
}

/// Creates a task in `lane` owned by `owner`.
///
/// # Errors
///
/// Returns an error if validation or the gateway rejects the task.
pub async fn create_in<G>(
    gateway: &G,
    owner: &Person,
    lane: Lane,
    title: &str,
) -> eyre::Result<Task>
where
    G: PersistenceGateway,
{
    let payload = NewTask::new(title, Some(due()?), owner.id())?.with_lane(lane);
    gateway
        .create_task(&payload)
        .await
        .map_err(|err| eyre::eyre!("create {title:?}: {err}"))
}

/// Titles of `lane` in fetch order.
#[must_use]
pub fn titles_in(tasks: &[Task], lane: Lane) -> Vec<String> {
    tasks
        .iter()
        .filter(|task| task.lane() == lane)
        .map(|task| task.title().to_owned())
        .collect()
}
