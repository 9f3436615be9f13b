//! Drag transition engine: turns a completed gesture into a persisted lane
//! change and keeps the board consistent with the store.
//!
//! The engine applies a move optimistically, then asks the gateway to
//! persist it. A rejected write restores the pre-gesture snapshot and
//! resynchronizes from the gateway; failures become [`Notice`]s and are never
//! returned as errors.

use super::Notice;
use crate::board::{
    domain::{BoardStore, DragEvent, DragLocation, DragMove, DragPlan, ErrorKind, Task, TaskId},
    ports::{GatewayError, GatewayResult, LaneChange, PersistenceGateway, with_deadline},
};
use crate::config::{BoardConfig, OrderPersistence, RefreshStrategy};
use std::sync::Arc;

/// Result of handling one drag-completion event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragOutcome {
    /// The gesture did not land on a lane.
    Abandoned,
    /// The task was dropped where it already was; nothing was written.
    Unchanged,
    /// The lane change was persisted.
    Moved {
        /// Moved task.
        task_id: TaskId,
        /// Slot the task occupies once the board has settled; `None` when
        /// the refreshed board no longer holds it.
        location: Option<DragLocation>,
        /// Whether the board was re-fetched afterwards.
        resynced: bool,
        /// Set when the position or the follow-up refresh could not be
        /// completed.
        notice: Option<Notice>,
    },
    /// The move was not persisted and the board was restored.
    Rejected {
        /// Task the gesture referred to.
        task_id: TaskId,
        /// Message for the user.
        notice: Notice,
        /// Whether the board was re-fetched after restoring it.
        resynced: bool,
    },
}

impl DragOutcome {
    /// Notice raised while handling the gesture, if any.
    #[must_use]
    pub const fn notice(&self) -> Option<&Notice> {
        match self {
            Self::Abandoned | Self::Unchanged => None,
            Self::Moved { notice, .. } => notice.as_ref(),
            Self::Rejected { notice, .. } => Some(notice),
        }
    }

    /// Failure category when the move was rejected.
    #[must_use]
    pub const fn rejection(&self) -> Option<ErrorKind> {
        match self {
            Self::Rejected { notice, .. } => Some(notice.kind()),
            _ => None,
        }
    }

    /// Returns `true` when a lane change was persisted.
    #[must_use]
    pub const fn is_moved(&self) -> bool {
        matches!(self, Self::Moved { .. })
    }
}

/// Converts drag gestures into validated, persisted lane transitions.
#[derive(Clone)]
pub struct DragTransitionEngine<G>
where
    G: PersistenceGateway,
{
    gateway: Arc<G>,
    config: BoardConfig,
}

impl<G> DragTransitionEngine<G>
where
    G: PersistenceGateway,
{
    /// Creates an engine writing through `gateway`.
    #[must_use]
    pub const fn new(gateway: Arc<G>, config: BoardConfig) -> Self {
        Self { gateway, config }
    }

    /// Handles a completed drag gesture against `store`.
    ///
    /// Abandoned gestures and drops onto the original slot never reach the
    /// gateway. Every other drop ends with the task's lane in `store` equal
    /// to the gateway's value, unless the gateway is unreachable for both
    /// the write and the resync, in which case the pre-gesture board is kept.
    pub async fn handle_drag_complete(
        &self,
        store: &mut BoardStore,
        event: &DragEvent,
    ) -> DragOutcome {
        let movement = match event.plan() {
            DragPlan::Abandoned => {
                tracing::debug!(task_id = %event.task_id, "drag abandoned outside any lane");
                return DragOutcome::Abandoned;
            }
            DragPlan::Unchanged => return DragOutcome::Unchanged,
            DragPlan::Move(movement) => movement,
        };

        let Some(task) = store.get(movement.task_id).cloned() else {
            return self.reject_unknown(store, movement).await;
        };
        let before = store.position_of(task.id());
        let snapshot = store.clone();
        let Some(landed) = store.move_task(task.id(), movement.to.lane, movement.to.index) else {
            return self.reject_unknown(store, movement).await;
        };

        // A stale source index can make a real drop resolve to the slot the
        // task already occupies.
        if before == Some(landed) {
            *store = snapshot;
            return DragOutcome::Unchanged;
        }

        match self.write_lane(&task, landed).await {
            Ok(confirmed) => {
                let (confirmed, order_notice) = self.write_rank(confirmed, landed).await;
                self.confirm(store, confirmed, landed, order_notice).await
            }
            Err(err) => self.roll_back(store, snapshot, &task, landed, &err).await,
        }
    }

    async fn write_lane(&self, task: &Task, landed: DragLocation) -> GatewayResult<Task> {
        let mut change = LaneChange::new(task.id(), landed.lane);
        if self.config.check_versions {
            change = change.expecting_version(task.version());
        }
        with_deadline(self.config.persistence_timeout, self.gateway.set_lane(&change)).await
    }

    /// Stores the drop index once the lane is committed.
    ///
    /// A failed rank write keeps the lane change and yields a notice with the
    /// lane-confirmed task.
    async fn write_rank(&self, confirmed: Task, landed: DragLocation) -> (Task, Option<Notice>) {
        if self.config.order_persistence == OrderPersistence::Ephemeral {
            return (confirmed, None);
        }

        let ranked = with_deadline(
            self.config.persistence_timeout,
            self.gateway.reorder(confirmed.id(), landed.lane, landed.index),
        )
        .await;
        match ranked {
            Ok(task) => (task, None),
            Err(err) => {
                tracing::warn!(
                    task_id = %confirmed.id(),
                    lane = %landed.lane,
                    error = %err,
                    "lane persisted but position was not"
                );
                let notice = Notice::for_task(
                    err.kind(),
                    confirmed.id(),
                    format!(
                        "Moved \"{}\" to {}, but its position could not be saved: {err}",
                        confirmed.title(),
                        landed.lane
                    ),
                );
                (confirmed, Some(notice))
            }
        }
    }

    async fn confirm(
        &self,
        store: &mut BoardStore,
        confirmed: Task,
        landed: DragLocation,
        order_notice: Option<Notice>,
    ) -> DragOutcome {
        let task_id = confirmed.id();
        tracing::debug!(task_id = %task_id, lane = %confirmed.lane(), "lane change accepted");

        if self.config.refresh == RefreshStrategy::Splice {
            store.upsert_one(confirmed);
            return DragOutcome::Moved {
                task_id,
                location: store.position_of(task_id),
                resynced: false,
                notice: order_notice,
            };
        }

        match self.fetch().await {
            Ok(tasks) => {
                store.replace_all(tasks);
                let location = match self.config.order_persistence {
                    OrderPersistence::Ephemeral => reapply_drop(store, task_id, landed),
                    OrderPersistence::Ranked => store.position_of(task_id),
                };
                DragOutcome::Moved {
                    task_id,
                    location,
                    resynced: true,
                    notice: order_notice,
                }
            }
            Err(err) => {
                tracing::warn!(
                    task_id = %task_id,
                    error = %err,
                    "refresh after lane change failed"
                );
                let notice = Notice::for_task(
                    err.kind(),
                    task_id,
                    format!(
                        "Moved \"{}\", but the board could not be refreshed: {err}",
                        confirmed.title()
                    ),
                );
                store.upsert_one(confirmed);
                DragOutcome::Moved {
                    task_id,
                    location: store.position_of(task_id),
                    resynced: false,
                    notice: Some(notice),
                }
            }
        }
    }

    async fn roll_back(
        &self,
        store: &mut BoardStore,
        snapshot: BoardStore,
        task: &Task,
        landed: DragLocation,
        err: &GatewayError,
    ) -> DragOutcome {
        tracing::warn!(
            task_id = %task.id(),
            lane = %landed.lane,
            error = %err,
            "lane change rejected, restoring board"
        );
        *store = snapshot;
        if err.kind() == ErrorKind::NotFound {
            store.remove(task.id());
        }

        let notice = Notice::for_task(
            err.kind(),
            task.id(),
            format!("Could not move \"{}\" to {}: {err}", task.title(), landed.lane),
        );
        let resynced = self.resync(store).await;
        DragOutcome::Rejected {
            task_id: task.id(),
            notice,
            resynced,
        }
    }

    async fn reject_unknown(&self, store: &mut BoardStore, movement: DragMove) -> DragOutcome {
        tracing::warn!(task_id = %movement.task_id, "dragged task is not on the board");
        let notice = Notice::for_task(
            ErrorKind::NotFound,
            movement.task_id,
            "That task is no longer on the board.",
        );
        let resynced = self.resync(store).await;
        DragOutcome::Rejected {
            task_id: movement.task_id,
            notice,
            resynced,
        }
    }

    /// Replaces the board with the gateway's tasks; keeps it on failure.
    pub(crate) async fn resync(&self, store: &mut BoardStore) -> bool {
        match self.fetch().await {
            Ok(tasks) => {
                store.replace_all(tasks);
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "board resync failed, keeping last known state");
                false
            }
        }
    }

    async fn fetch(&self) -> GatewayResult<Vec<Task>> {
        with_deadline(self.config.persistence_timeout, self.gateway.fetch_tasks()).await
    }
}

/// Splices a re-fetched task back to the dropped index.
///
/// Without stored ranks the fetch order ignores the gesture. The lane comes
/// from the fetch; a task that another session moved elsewhere stays put.
fn reapply_drop(
    store: &mut BoardStore,
    task_id: TaskId,
    landed: DragLocation,
) -> Option<DragLocation> {
    let fetched = store.position_of(task_id)?;
    if fetched.lane != landed.lane {
        return Some(fetched);
    }
    store.move_task(task_id, fetched.lane, landed.index)
}
