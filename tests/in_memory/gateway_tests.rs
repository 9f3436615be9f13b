//! In-memory integration tests for the persistence gateway contract.

use super::helpers::{SeededBoard, create_in, seeded};
use rstest::rstest;
use taskboard::board::{
    domain::{ErrorKind, Lane, Person, TaskId, UserId},
    ports::{GatewayError, LaneChange, PersistenceGateway},
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn created_tasks_are_ranked_within_their_lane(seeded: SeededBoard) -> Result<(), eyre::Report> {
    let first = create_in(&seeded.gateway, &seeded.owner, Lane::Todo, "Fix login").await?;
    let second = create_in(&seeded.gateway, &seeded.owner, Lane::Todo, "Write docs").await?;
    let other = create_in(&seeded.gateway, &seeded.owner, Lane::Upcoming, "Plan").await?;

    assert_eq!((first.rank(), second.rank(), other.rank()), (0, 1, 0));
    assert_eq!(first.version(), 1);
    assert_eq!(first.created_by(), &seeded.owner);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_rejects_unknown_creator(seeded: SeededBoard) {
    let stranger = Person::new(UserId::new(), "Nobody")
        .expect("valid person");

    let result = create_in(&seeded.gateway, &stranger, Lane::Todo, "Orphan").await;

    assert!(result.is_err());
    assert!(seeded.gateway.fetch_tasks().await.expect("fetch").is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn set_lane_appends_to_new_lane_and_bumps_version(
    seeded: SeededBoard,
) -> Result<(), eyre::Report> {
    create_in(&seeded.gateway, &seeded.owner, Lane::Completed, "Set up CI").await?;
    let task = create_in(&seeded.gateway, &seeded.owner, Lane::Todo, "Fix login").await?;

    let moved = seeded
        .gateway
        .set_lane(&LaneChange::new(task.id(), Lane::Completed).expecting_version(1))
        .await
        .map_err(|err| eyre::eyre!("set lane: {err}"))?;

    assert_eq!(moved.lane(), Lane::Completed);
    assert_eq!(moved.rank(), 1);
    assert_eq!(moved.version(), 2);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stale_version_is_a_conflict(seeded: SeededBoard) -> Result<(), eyre::Report> {
    let task = create_in(&seeded.gateway, &seeded.owner, Lane::Todo, "Fix login").await?;
    seeded
        .gateway
        .set_lane(&LaneChange::new(task.id(), Lane::Upcoming))
        .await
        .map_err(|err| eyre::eyre!("first move: {err}"))?;

    let result = seeded
        .gateway
        .set_lane(&LaneChange::new(task.id(), Lane::Completed).expecting_version(1))
        .await;

    let Err(GatewayError::Conflict {
        expected, actual, ..
    }) = &result
    else {
        return Err(eyre::eyre!("expected a conflict, got {result:?}"));
    };
    assert_eq!((*expected, *actual), (1, 2));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn operations_on_missing_tasks_report_not_found(seeded: SeededBoard) {
    let missing = TaskId::new();

    let lane = seeded
        .gateway
        .set_lane(&LaneChange::new(missing, Lane::Todo))
        .await;
    let reorder = seeded.gateway.reorder(missing, Lane::Todo, 0).await;
    let delete = seeded.gateway.delete_task(missing).await;
    let assign = seeded.gateway.assign_users(missing, &[seeded.teammate.id()]).await;

    assert_eq!(lane.err().map(|err| err.kind()), Some(ErrorKind::NotFound));
    assert_eq!(reorder.err().map(|err| err.kind()), Some(ErrorKind::NotFound));
    assert_eq!(delete.err().map(|err| err.kind()), Some(ErrorKind::NotFound));
    assert_eq!(assign.err().map(|err| err.kind()), Some(ErrorKind::NotFound));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn assignment_is_all_or_nothing(seeded: SeededBoard) -> Result<(), eyre::Report> {
    let task = create_in(&seeded.gateway, &seeded.owner, Lane::Todo, "Fix login").await?;
    let stranger = UserId::new();

    let result = seeded
        .gateway
        .assign_users(task.id(), &[seeded.teammate.id(), stranger])
        .await;

    assert!(matches!(result, Err(GatewayError::UnknownUser(id)) if id == stranger));
    let stored = seeded
        .gateway
        .fetch_tasks()
        .await
        .map_err(|err| eyre::eyre!("fetch: {err}"))?;
    assert!(stored.iter().all(|task| task.assignees().is_empty()));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reorder_clamps_index_and_renumbers(seeded: SeededBoard) -> Result<(), eyre::Report> {
    create_in(&seeded.gateway, &seeded.owner, Lane::Todo, "A").await?;
    create_in(&seeded.gateway, &seeded.owner, Lane::Todo, "B").await?;
    let moving = create_in(&seeded.gateway, &seeded.owner, Lane::Upcoming, "C").await?;

    let placed = seeded
        .gateway
        .reorder(moving.id(), Lane::Todo, 40)
        .await
        .map_err(|err| eyre::eyre!("reorder: {err}"))?;

    assert_eq!(placed.lane(), Lane::Todo);
    assert_eq!(placed.rank(), 2);
    let ordered: Vec<String> = seeded
        .gateway
        .fetch_tasks()
        .await
        .map_err(|err| eyre::eyre!("fetch: {err}"))?
        .into_iter()
        .filter(|task| task.lane() == Lane::Todo)
        .map(|task| task.title().to_owned())
        .collect();
    assert_eq!(ordered, vec!["A", "B", "C"]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn delete_removes_assignment_links(seeded: SeededBoard) -> Result<(), eyre::Report> {
    let task = create_in(&seeded.gateway, &seeded.owner, Lane::Todo, "Fix login").await?;
    seeded
        .gateway
        .assign_users(task.id(), &[seeded.teammate.id()])
        .await
        .map_err(|err| eyre::eyre!("assign: {err}"))?;

    seeded
        .gateway
        .delete_task(task.id())
        .await
        .map_err(|err| eyre::eyre!("delete: {err}"))?;

    let again = seeded.gateway.delete_task(task.id()).await;
    assert!(matches!(again, Err(GatewayError::NotFound(id)) if id == task.id()));
    Ok(())
}
