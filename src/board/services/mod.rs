//! Application services for the task board.

mod drag;
mod form;
mod notice;
mod session;

pub use drag::{DragOutcome, DragTransitionEngine};
pub use form::{FormError, TaskDraft, TaskFormController};
pub use notice::Notice;
pub use session::BoardSession;
