//! Create-task dialog state and submission.

use crate::board::{
    domain::{BoardDomainError, CurrentIdentity, ErrorKind, Lane, NewTask, Progress, Task, UserId},
    ports::{GatewayError, PersistenceGateway, with_deadline},
};
use chrono::NaiveDate;
use std::time::Duration;
use thiserror::Error;

/// Unvalidated input collected by the create-task dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    /// Title as typed.
    pub title: String,
    /// Description as typed; blank means none.
    pub description: String,
    /// Chosen due date.
    pub due_date: Option<NaiveDate>,
    /// Starting lane.
    pub lane: Lane,
    /// Starting progress percentage.
    pub progress: u8,
    /// Selected assignees.
    pub assignees: Vec<UserId>,
}

impl TaskDraft {
    /// Validates the draft into a creation payload.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError`] when the title is blank, the due date is
    /// missing or the progress is above 100.
    pub fn to_new_task(&self, created_by: UserId) -> Result<NewTask, BoardDomainError> {
        let progress = Progress::new(self.progress)?;
        Ok(NewTask::new(self.title.as_str(), self.due_date, created_by)?
            .with_description(self.description.as_str())
            .with_lane(self.lane)
            .with_progress(progress))
    }
}

/// Errors reported by [`TaskFormController::submit`].
#[derive(Debug, Clone, Error)]
pub enum FormError {
    /// The draft is incomplete.
    #[error(transparent)]
    Validation(#[from] BoardDomainError),
    /// The gateway rejected the task or its assignees.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl FormError {
    /// Failure category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(err) => err.kind(),
            Self::Gateway(err) => err.kind(),
        }
    }
}

/// State machine behind the create-task dialog.
///
/// The draft survives every failure and is only cleared by a successful
/// submission or an explicit [`TaskFormController::discard`].
#[derive(Debug, Clone)]
pub struct TaskFormController {
    draft: TaskDraft,
    open: bool,
    last_error: Option<FormError>,
    timeout: Duration,
}

impl TaskFormController {
    /// Creates a closed dialog with an empty draft.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            draft: TaskDraft::default(),
            open: false,
            last_error: None,
            timeout,
        }
    }

    /// Opens the dialog, keeping any draft from a previous attempt.
    pub fn open(&mut self) {
        self.open = true;
        self.last_error = None;
    }

    /// Closes the dialog without discarding the draft.
    pub const fn close(&mut self) {
        self.open = false;
    }

    /// Clears the draft and any reported error.
    pub fn discard(&mut self) {
        self.draft = TaskDraft::default();
        self.last_error = None;
    }

    /// Returns `true` while the dialog is shown.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }

    /// Current draft.
    #[must_use]
    pub const fn draft(&self) -> &TaskDraft {
        &self.draft
    }

    /// Mutable access for input handlers.
    pub const fn draft_mut(&mut self) -> &mut TaskDraft {
        &mut self.draft
    }

    /// Error from the last failed submission.
    #[must_use]
    pub const fn last_error(&self) -> Option<&FormError> {
        self.last_error.as_ref()
    }

    /// Validates and persists the draft.
    ///
    /// On success the draft is cleared and the dialog closed. When assigning
    /// users fails, the created task is deleted again so that creation stays
    /// all-or-nothing.
    ///
    /// # Errors
    ///
    /// Returns [`FormError`] on validation or gateway failure; the dialog
    /// stays open with the draft intact.
    pub async fn submit<G>(
        &mut self,
        gateway: &G,
        identity: &CurrentIdentity,
    ) -> Result<Task, FormError>
    where
        G: PersistenceGateway + ?Sized,
    {
        match self.persist(gateway, identity).await {
            Ok(task) => {
                self.draft = TaskDraft::default();
                self.open = false;
                self.last_error = None;
                Ok(task)
            }
            Err(err) => {
                tracing::debug!(error = %err, "task submission failed, keeping draft");
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    async fn persist<G>(&self, gateway: &G, identity: &CurrentIdentity) -> Result<Task, FormError>
    where
        G: PersistenceGateway + ?Sized,
    {
        let new_task = self.draft.to_new_task(identity.id())?;
        let created = with_deadline(self.timeout, gateway.create_task(&new_task)).await?;
        if self.draft.assignees.is_empty() {
            return Ok(created);
        }

        let assigned = with_deadline(
            self.timeout,
            gateway.assign_users(created.id(), &self.draft.assignees),
        )
        .await;
        if let Err(err) = assigned {
            let undo = with_deadline(self.timeout, gateway.delete_task(created.id())).await;
            if let Err(undo_err) = undo {
                tracing::warn!(
                    task_id = %created.id(),
                    error = %undo_err,
                    "could not remove task after failed assignment"
                );
            }
            return Err(err.into());
        }
        Ok(created)
    }
}
