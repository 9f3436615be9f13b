//! Domain model for the task board.
//!
//! Lanes, tasks, people and the lane-partitioned [`BoardStore`] live here,
//! together with the pure classification of drag gestures. Nothing in this
//! module performs I/O.

mod drag;
mod error;
mod ids;
mod lane;
mod person;
mod store;
mod task;

pub use drag::{DragEvent, DragLocation, DragMove, DragPlan};
pub use error::{BoardDomainError, ErrorKind, ParseLaneError};
pub use ids::{TaskId, UserId};
pub use lane::{Column, Lane};
pub use person::{AvatarColor, AvatarIdentity, Person};
pub use store::BoardStore;
pub use task::{NewTask, PersistedTaskData, Progress, Task};

/// The signed-in identity supplied by the authentication collaborator.
pub type CurrentIdentity = Person;
