//! Deadline behaviour of the `PostgreSQL` gateway.

use super::helpers::{create_in, prepare_board, test_runtime, titles_in};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use pg_embedded_setup_unpriv::TestCluster;
use pg_embedded_setup_unpriv::test_support::shared_test_cluster;
use rstest::rstest;
use std::time::Duration;
use taskboard::board::{
    adapters::postgres::StatementTimeout,
    domain::{ErrorKind, Lane},
    ports::{LaneChange, PersistenceGateway, with_deadline},
};
use taskboard::config::BoardConfig;

#[derive(diesel::QueryableByName)]
struct TimeoutSetting {
    #[diesel(sql_type = diesel::sql_types::Text)]
    statement_timeout: String,
}

#[rstest]
fn pooled_connections_carry_statement_timeout(shared_test_cluster: &'static TestCluster) {
    let prepared = prepare_board(shared_test_cluster, "board_stmt_timeout", &BoardConfig::default())
        .expect("board database");
    let manager = ConnectionManager::<PgConnection>::new(prepared.url.clone());
    let pool = Pool::builder()
        .max_size(1)
        .connection_customizer(Box::new(StatementTimeout::new(Duration::from_millis(250))))
        .build(manager)
        .expect("pool");
    let mut conn = pool.get().expect("pooled connection");

    let setting = diesel::sql_query("SHOW statement_timeout")
        .get_result::<TimeoutSetting>(&mut conn)
        .expect("show setting");

    assert_eq!(setting.statement_timeout, "250ms");
}

#[rstest]
fn timed_out_lane_change_never_commits_later(shared_test_cluster: &'static TestCluster) {
    let limit = Duration::from_millis(200);
    let config = BoardConfig::default().with_timeout(limit);
    let prepared =
        prepare_board(shared_test_cluster, "board_late_commit", &config).expect("board database");
    let gateway = &prepared.gateway;
    let rt = test_runtime();
    let task = rt
        .block_on(create_in(gateway, &prepared.owner, Lane::Todo, "Fix login"))
        .expect("create task");

    let mut holder = PgConnection::establish(&prepared.url).expect("lock holder");
    holder
        .batch_execute(&format!(
            "BEGIN; SELECT id FROM tasks WHERE id = '{}' FOR UPDATE;",
            task.id()
        ))
        .expect("hold row lock");

    let change = LaneChange::new(task.id(), Lane::Completed).expecting_version(1);
    let result = rt.block_on(with_deadline(limit, gateway.set_lane(&change)));
    assert_eq!(
        result.map(|_| ()).map_err(|err| err.kind()),
        Err(ErrorKind::StoreUnavailable)
    );

    holder.batch_execute("COMMIT").expect("release row lock");
    std::thread::sleep(limit * 3);

    let fetched = rt.block_on(gateway.fetch_tasks()).expect("fetch");
    assert_eq!(titles_in(&fetched, Lane::Todo), vec!["Fix login"]);
    assert!(fetched.iter().all(|stored| stored.version() == 1));
}
