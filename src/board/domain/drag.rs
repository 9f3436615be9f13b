//! Drag-completion events and the pure plan derived from them.

use super::{Lane, TaskId};
use serde::{Deserialize, Serialize};

/// A lane and a zero-based index inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DragLocation {
    /// Lane of the slot.
    pub lane: Lane,
    /// Zero-based index within the lane.
    pub index: usize,
}

impl DragLocation {
    /// Creates a location.
    #[must_use]
    pub const fn new(lane: Lane, index: usize) -> Self {
        Self { lane, index }
    }
}

/// A finished drag gesture: which task, where it started, where it landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragEvent {
    /// Task being dragged.
    pub task_id: TaskId,
    /// Slot the gesture started from.
    pub source: DragLocation,
    /// Slot the gesture ended on, or `None` when dropped outside every lane.
    pub destination: Option<DragLocation>,
}

impl DragEvent {
    /// Creates an event for a drop onto a lane.
    #[must_use]
    pub const fn dropped(task_id: TaskId, source: DragLocation, destination: DragLocation) -> Self {
        Self {
            task_id,
            source,
            destination: Some(destination),
        }
    }

    /// Creates an event for a gesture released outside every lane.
    #[must_use]
    pub const fn abandoned(task_id: TaskId, source: DragLocation) -> Self {
        Self {
            task_id,
            source,
            destination: None,
        }
    }

    /// Classifies the gesture without looking at board state.
    #[must_use]
    pub fn plan(&self) -> DragPlan {
        match self.destination {
            None => DragPlan::Abandoned,
            Some(destination) if destination == self.source => DragPlan::Unchanged,
            Some(destination) => DragPlan::Move(DragMove {
                task_id: self.task_id,
                from: self.source,
                to: destination,
            }),
        }
    }
}

/// What a drag gesture asks the board to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPlan {
    /// Nothing was hit; leave everything alone.
    Abandoned,
    /// Dropped back on its own slot; never write.
    Unchanged,
    /// Move the task to a different slot.
    Move(DragMove),
}

/// A requested relocation of one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragMove {
    /// Task being moved.
    pub task_id: TaskId,
    /// Slot reported by the gesture source.
    pub from: DragLocation,
    /// Target slot.
    pub to: DragLocation,
}

impl DragMove {
    /// Returns `true` when the task leaves its lane.
    #[must_use]
    pub fn changes_lane(&self) -> bool {
        self.from.lane != self.to.lane
    }
}
