//! Persistence contract tests for the `PostgreSQL` gateway.

use super::helpers::{PreparedBoard, create_in, prepare_board, test_runtime, titles_in};
use pg_embedded_setup_unpriv::TestCluster;
use pg_embedded_setup_unpriv::test_support::shared_test_cluster;
use rstest::rstest;
use taskboard::board::{
    domain::{ErrorKind, Lane, Person, TaskId, UserId},
    ports::{GatewayError, LaneChange, PersistenceGateway},
};
use taskboard::config::BoardConfig;

fn board(cluster: &'static TestCluster, prefix: &str) -> PreparedBoard {
    prepare_board(cluster, prefix, &BoardConfig::default()).expect("board database")
}

#[rstest]
fn created_tasks_are_ranked_within_their_lane(shared_test_cluster: &'static TestCluster) {
    let prepared = board(shared_test_cluster, "board_ranks");
    let gateway = &prepared.gateway;
    let rt = test_runtime();

    let first = rt
        .block_on(create_in(gateway, &prepared.owner, Lane::Todo, "Fix login"))
        .expect("create first");
    let second = rt
        .block_on(create_in(gateway, &prepared.owner, Lane::Todo, "Write docs"))
        .expect("create second");
    let other = rt
        .block_on(create_in(gateway, &prepared.owner, Lane::Upcoming, "Plan"))
        .expect("create other");

    assert_eq!((first.rank(), second.rank(), other.rank()), (0, 1, 0));
    assert_eq!(first.version(), 1);
    assert_eq!(first.created_by(), &prepared.owner);
    let fetched = rt.block_on(gateway.fetch_tasks()).expect("fetch");
    assert_eq!(titles_in(&fetched, Lane::Todo), vec!["Fix login", "Write docs"]);
}

#[rstest]
fn create_rejects_unknown_creator(shared_test_cluster: &'static TestCluster) {
    let prepared = board(shared_test_cluster, "board_creator");
    let stranger = Person::new(UserId::new(), "Nobody").expect("valid person");
    let rt = test_runtime();

    let result = rt.block_on(create_in(&prepared.gateway, &stranger, Lane::Todo, "Orphan"));

    assert!(result.is_err());
    let fetched = rt.block_on(prepared.gateway.fetch_tasks()).expect("fetch");
    assert!(fetched.is_empty());
}

#[rstest]
fn set_lane_appends_to_new_lane_and_bumps_version(shared_test_cluster: &'static TestCluster) {
    let prepared = board(shared_test_cluster, "board_set_lane");
    let gateway = &prepared.gateway;
    let rt = test_runtime();
    rt.block_on(create_in(gateway, &prepared.owner, Lane::Completed, "Set up CI"))
        .expect("create done task");
    let task = rt
        .block_on(create_in(gateway, &prepared.owner, Lane::Todo, "Fix login"))
        .expect("create task");

    let change = LaneChange::new(task.id(), Lane::Completed).expecting_version(1);
    let moved = rt.block_on(gateway.set_lane(&change)).expect("set lane");

    assert_eq!(moved.lane(), Lane::Completed);
    assert_eq!(moved.rank(), 1);
    assert_eq!(moved.version(), 2);
}

#[rstest]
fn stale_version_is_a_conflict(shared_test_cluster: &'static TestCluster) {
    let prepared = board(shared_test_cluster, "board_conflict");
    let gateway = &prepared.gateway;
    let rt = test_runtime();
    let task = rt
        .block_on(create_in(gateway, &prepared.owner, Lane::Todo, "Fix login"))
        .expect("create task");
    rt.block_on(gateway.set_lane(&LaneChange::new(task.id(), Lane::Upcoming).expecting_version(1)))
        .expect("first writer wins");

    let result = rt.block_on(
        gateway.set_lane(&LaneChange::new(task.id(), Lane::Completed).expecting_version(1)),
    );

    let Err(GatewayError::Conflict {
        expected, actual, ..
    }) = &result
    else {
        panic!("expected a conflict, got {result:?}");
    };
    assert_eq!((*expected, *actual), (1, 2));
    let fetched = rt.block_on(gateway.fetch_tasks()).expect("fetch");
    assert_eq!(titles_in(&fetched, Lane::Upcoming), vec!["Fix login"]);
}

#[rstest]
fn operations_on_missing_task_are_not_found(shared_test_cluster: &'static TestCluster) {
    let prepared = board(shared_test_cluster, "board_missing");
    let gateway = &prepared.gateway;
    let missing = TaskId::new();
    let rt = test_runtime();

    let kinds = [
        rt.block_on(gateway.set_lane(&LaneChange::new(missing, Lane::Todo)))
            .map(|_| ())
            .map_err(|err| err.kind()),
        rt.block_on(gateway.reorder(missing, Lane::Todo, 0))
            .map(|_| ())
            .map_err(|err| err.kind()),
        rt.block_on(gateway.assign_users(missing, &[prepared.teammate.id()]))
            .map_err(|err| err.kind()),
        rt.block_on(gateway.delete_task(missing))
            .map_err(|err| err.kind()),
    ];

    assert_eq!(kinds, [Err(ErrorKind::NotFound); 4]);
}

#[rstest]
fn assignment_is_all_or_nothing(shared_test_cluster: &'static TestCluster) {
    let prepared = board(shared_test_cluster, "board_assign");
    let gateway = &prepared.gateway;
    let rt = test_runtime();
    let task = rt
        .block_on(create_in(gateway, &prepared.owner, Lane::Todo, "Fix login"))
        .expect("create task");
    let stranger = UserId::new();

    let rejected =
        rt.block_on(gateway.assign_users(task.id(), &[prepared.teammate.id(), stranger]));
    assert!(matches!(rejected, Err(GatewayError::UnknownUser(id)) if id == stranger));
    let untouched = rt.block_on(gateway.fetch_tasks()).expect("fetch");
    assert!(untouched.iter().all(|stored| stored.assignees().is_empty()));

    rt.block_on(gateway.assign_users(task.id(), &[prepared.teammate.id(), prepared.teammate.id()]))
        .expect("assign teammate");
    let assigned = rt.block_on(gateway.fetch_tasks()).expect("fetch");
    let assignees: Vec<&Person> = assigned.iter().flat_map(|stored| stored.assignees()).collect();
    assert_eq!(assignees, vec![&prepared.teammate]);
}

#[rstest]
fn reorder_renumbers_lane_and_clamps_index(shared_test_cluster: &'static TestCluster) {
    let prepared = board(shared_test_cluster, "board_reorder");
    let gateway = &prepared.gateway;
    let rt = test_runtime();
    let first = rt
        .block_on(create_in(gateway, &prepared.owner, Lane::Todo, "Fix login"))
        .expect("create first");
    rt.block_on(create_in(gateway, &prepared.owner, Lane::Todo, "Write docs"))
        .expect("create second");
    let third = rt
        .block_on(create_in(gateway, &prepared.owner, Lane::Todo, "Cut release"))
        .expect("create third");

    let lifted = rt
        .block_on(gateway.reorder(third.id(), Lane::Todo, 0))
        .expect("reorder to front");
    assert_eq!((lifted.rank(), lifted.version()), (0, 2));
    let fetched = rt.block_on(gateway.fetch_tasks()).expect("fetch");
    assert_eq!(
        titles_in(&fetched, Lane::Todo),
        vec!["Cut release", "Fix login", "Write docs"]
    );

    let sunk = rt
        .block_on(gateway.reorder(first.id(), Lane::Todo, 99))
        .expect("reorder past the end");
    assert_eq!(sunk.rank(), 2);
    let refetched = rt.block_on(gateway.fetch_tasks()).expect("fetch");
    assert_eq!(
        titles_in(&refetched, Lane::Todo),
        vec!["Cut release", "Write docs", "Fix login"]
    );
}

#[rstest]
fn delete_removes_task_and_its_assignees(shared_test_cluster: &'static TestCluster) {
    let prepared = board(shared_test_cluster, "board_delete");
    let gateway = &prepared.gateway;
    let rt = test_runtime();
    let task = rt
        .block_on(create_in(gateway, &prepared.owner, Lane::Todo, "Fix login"))
        .expect("create task");
    rt.block_on(gateway.assign_users(task.id(), &[prepared.teammate.id()]))
        .expect("assign teammate");

    rt.block_on(gateway.delete_task(task.id())).expect("delete");

    assert!(rt.block_on(gateway.fetch_tasks()).expect("fetch").is_empty());
    let again = rt.block_on(gateway.delete_task(task.id()));
    assert!(matches!(again, Err(GatewayError::NotFound(id)) if id == task.id()));
}

#[rstest]
fn assignable_users_are_sorted_by_name(shared_test_cluster: &'static TestCluster) {
    let prepared = board(shared_test_cluster, "board_users");
    let rt = test_runtime();

    let people = rt
        .block_on(prepared.gateway.list_assignable_users())
        .expect("list users");

    let names: Vec<&str> = people.iter().map(Person::name).collect();
    assert_eq!(names, vec!["Ada Lovelace", "Grace Hopper"]);
}
