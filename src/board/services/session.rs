//! Board session: the single owner of one signed-in user's board.

use super::{DragOutcome, DragTransitionEngine, FormError, Notice, TaskFormController};
use crate::board::{
    domain::{BoardStore, CurrentIdentity, DragEvent, ErrorKind, Person, Task, TaskId},
    ports::{PersistenceGateway, with_deadline},
};
use crate::config::BoardConfig;
use std::sync::Arc;

/// Everything one authenticated board needs, behind a single writer.
///
/// All board mutations (drags, creation, deletion, refreshes) take
/// `&mut self`, so two gestures in the same session never interleave.
pub struct BoardSession<G>
where
    G: PersistenceGateway,
{
    gateway: Arc<G>,
    identity: CurrentIdentity,
    config: BoardConfig,
    store: BoardStore,
    engine: DragTransitionEngine<G>,
    form: TaskFormController,
    notices: Vec<Notice>,
}

impl<G> BoardSession<G>
where
    G: PersistenceGateway,
{
    /// Opens a session and loads the board.
    ///
    /// A failed initial fetch leaves the board empty and raises a notice.
    pub async fn open(gateway: Arc<G>, identity: CurrentIdentity, config: BoardConfig) -> Self {
        let engine = DragTransitionEngine::new(Arc::clone(&gateway), config);
        let mut session = Self {
            gateway,
            identity,
            config,
            store: BoardStore::new(),
            engine,
            form: TaskFormController::new(config.persistence_timeout),
            notices: Vec::new(),
        };
        session.refresh().await;
        session
    }

    /// Signed-in identity that owns this board.
    #[must_use]
    pub const fn identity(&self) -> &CurrentIdentity {
        &self.identity
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// Current board projection.
    #[must_use]
    pub const fn store(&self) -> &BoardStore {
        &self.store
    }

    /// Create-task dialog.
    #[must_use]
    pub const fn form(&self) -> &TaskFormController {
        &self.form
    }

    /// Mutable create-task dialog for input handlers.
    pub const fn form_mut(&mut self) -> &mut TaskFormController {
        &mut self.form
    }

    /// Notices raised so far.
    #[must_use]
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Drains the raised notices.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Replaces the board with the gateway's tasks.
    ///
    /// Returns `false` and raises a notice when the fetch fails; the board
    /// keeps its previous state.
    pub async fn refresh(&mut self) -> bool {
        let fetched =
            with_deadline(self.config.persistence_timeout, self.gateway.fetch_tasks()).await;
        match fetched {
            Ok(tasks) => {
                self.store.replace_all(tasks);
                tracing::debug!(tasks = self.store.len(), "board refreshed");
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "board refresh failed");
                self.notices.push(Notice::new(
                    err.kind(),
                    format!("Could not load tasks: {err}"),
                ));
                false
            }
        }
    }

    /// Applies a completed drag gesture.
    pub async fn handle_drag_complete(&mut self, event: &DragEvent) -> DragOutcome {
        let outcome = self
            .engine
            .handle_drag_complete(&mut self.store, event)
            .await;
        if let Some(notice) = outcome.notice() {
            self.notices.push(notice.clone());
        }
        outcome
    }

    /// Submits the create-task dialog.
    ///
    /// The new task is shown expanded. The board is refreshed afterwards so
    /// assignees appear resolved.
    ///
    /// # Errors
    ///
    /// Returns [`FormError`] when validation or persistence fails; the draft
    /// is kept and a notice is raised.
    pub async fn create_task(&mut self) -> Result<Task, FormError> {
        match self.form.submit(&*self.gateway, &self.identity).await {
            Ok(task) => {
                let task_id = task.id();
                tracing::debug!(task_id = %task_id, lane = %task.lane(), "task created");
                self.store.upsert_one(task.clone());
                self.store.set_expanded(task_id, true);
                self.refresh().await;
                Ok(task)
            }
            Err(err) => {
                self.notices
                    .push(Notice::new(err.kind(), format!("Could not create task: {err}")));
                Err(err)
            }
        }
    }

    /// Deletes a task.
    ///
    /// Returns `true` when the task is gone from the board. A task that was
    /// already deleted elsewhere is dropped locally and the board resynced;
    /// other failures keep the task and raise a notice.
    pub async fn delete_task(&mut self, task_id: TaskId) -> bool {
        let deleted = with_deadline(
            self.config.persistence_timeout,
            self.gateway.delete_task(task_id),
        )
        .await;

        match deleted {
            Ok(()) => {
                self.store.remove(task_id);
                true
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                self.store.remove(task_id);
                self.engine.resync(&mut self.store).await;
                true
            }
            Err(err) => {
                tracing::warn!(task_id = %task_id, error = %err, "task deletion failed");
                self.notices.push(Notice::for_task(
                    err.kind(),
                    task_id,
                    format!("Could not delete task: {err}"),
                ));
                false
            }
        }
    }

    /// Flips a task card between collapsed and expanded.
    pub fn toggle_expansion(&mut self, task_id: TaskId) -> bool {
        self.store.toggle_expansion(task_id)
    }

    /// Lists people for the assignee selector.
    ///
    /// Returns an empty list and raises a notice when the directory cannot
    /// be read.
    pub async fn list_assignable_users(&mut self) -> Vec<Person> {
        let listed = with_deadline(
            self.config.persistence_timeout,
            self.gateway.list_assignable_users(),
        )
        .await;
        listed.unwrap_or_else(|err| {
            tracing::warn!(error = %err, "user directory unavailable");
            self.notices.push(Notice::new(
                err.kind(),
                format!("Could not load assignable users: {err}"),
            ));
            Vec::new()
        })
    }
}
