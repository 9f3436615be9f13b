//! In-memory, lane-partitioned projection of the board.

use super::{Column, DragLocation, Lane, Task, TaskId};
use std::collections::HashSet;

/// Tasks of the current session grouped by lane, plus per-task UI state.
///
/// Each task lives in exactly one lane vector, the one matching
/// [`Task::lane`]. Expansion flags exist only for tasks held by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardStore {
    upcoming: Vec<Task>,
    todo: Vec<Task>,
    completed: Vec<Task>,
    expanded: HashSet<TaskId>,
}

impl BoardStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from tasks in fetch order.
    #[must_use]
    pub fn from_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let mut store = Self::new();
        store.replace_all(tasks);
        store
    }

    /// Replaces every task at once.
    ///
    /// Later duplicates of an id overwrite earlier ones. Expansion flags of
    /// tasks that are gone are dropped.
    pub fn replace_all(&mut self, tasks: impl IntoIterator<Item = Task>) {
        let mut next = Self {
            expanded: HashSet::new(),
            ..Self::default()
        };
        for task in tasks {
            next.upsert_one(task);
        }
        next.expanded = self
            .expanded
            .iter()
            .copied()
            .filter(|id| next.contains(*id))
            .collect();
        *self = next;
    }

    /// Inserts a task at the end of its lane, or overwrites it by id.
    ///
    /// An overwrite that keeps the lane keeps the position; a lane change
    /// appends the task to its new lane. Returns the previous value.
    pub fn upsert_one(&mut self, task: Task) -> Option<Task> {
        let Some(location) = self.position_of(task.id()) else {
            self.lane_mut(task.lane()).push(task);
            return None;
        };

        if location.lane == task.lane()
            && let Some(slot) = self.lane_mut(location.lane).get_mut(location.index)
        {
            return Some(std::mem::replace(slot, task));
        }

        let previous = self.lane_mut(location.lane).remove(location.index);
        self.lane_mut(task.lane()).push(task);
        Some(previous)
    }

    /// Deletes a task and its expansion flag.
    pub fn remove(&mut self, task_id: TaskId) -> Option<Task> {
        self.expanded.remove(&task_id);
        let location = self.position_of(task_id)?;
        Some(self.lane_mut(location.lane).remove(location.index))
    }

    /// Tasks of one lane in render order.
    #[must_use]
    pub fn by_lane(&self, lane: Lane) -> &[Task] {
        match lane {
            Lane::Upcoming => &self.upcoming,
            Lane::Todo => &self.todo,
            Lane::Completed => &self.completed,
        }
    }

    /// One column view per lane, left to right.
    #[must_use]
    pub fn columns(&self) -> [Column<'_>; 3] {
        Lane::ALL.map(|lane| Column::new(lane, self.by_lane(lane)))
    }

    /// Iterates all tasks, lane by lane.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.upcoming
            .iter()
            .chain(self.todo.iter())
            .chain(self.completed.iter())
    }

    /// Looks up a task by id.
    #[must_use]
    pub fn get(&self, task_id: TaskId) -> Option<&Task> {
        self.tasks().find(|task| task.id() == task_id)
    }

    /// Returns `true` when the task is on the board.
    #[must_use]
    pub fn contains(&self, task_id: TaskId) -> bool {
        self.get(task_id).is_some()
    }

    /// Current lane and index of a task.
    #[must_use]
    pub fn position_of(&self, task_id: TaskId) -> Option<DragLocation> {
        Lane::ALL.into_iter().find_map(|lane| {
            self.by_lane(lane)
                .iter()
                .position(|task| task.id() == task_id)
                .map(|index| DragLocation::new(lane, index))
        })
    }

    /// Total number of tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.upcoming.len() + self.todo.len() + self.completed.len()
    }

    /// Returns `true` when the board holds no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Splices a task into `lane` at `index`, clamped to the lane length.
    ///
    /// Returns where the task ended up, or `None` for an unknown id.
    pub fn move_task(&mut self, task_id: TaskId, lane: Lane, index: usize) -> Option<DragLocation> {
        let current = self.position_of(task_id)?;
        let mut task = self.lane_mut(current.lane).remove(current.index);
        task.relocate(lane);

        let target = self.lane_mut(lane);
        let landed = index.min(target.len());
        target.insert(landed, task);
        Some(DragLocation::new(lane, landed))
    }

    /// Flips the expansion flag and returns the new value.
    ///
    /// Unknown ids stay collapsed.
    pub fn toggle_expansion(&mut self, task_id: TaskId) -> bool {
        let expanded = !self.is_expanded(task_id);
        self.set_expanded(task_id, expanded);
        self.is_expanded(task_id)
    }

    /// Sets the expansion flag of a task on the board.
    pub fn set_expanded(&mut self, task_id: TaskId, expanded: bool) {
        if expanded && self.contains(task_id) {
            self.expanded.insert(task_id);
        } else {
            self.expanded.remove(&task_id);
        }
    }

    /// Returns `true` when the task card is expanded.
    #[must_use]
    pub fn is_expanded(&self, task_id: TaskId) -> bool {
        self.expanded.contains(&task_id)
    }

    /// Number of expanded cards.
    #[must_use]
    pub fn expanded_count(&self) -> usize {
        self.expanded.len()
    }

    fn lane_mut(&mut self, lane: Lane) -> &mut Vec<Task> {
        match lane {
            Lane::Upcoming => &mut self.upcoming,
            Lane::Todo => &mut self.todo,
            Lane::Completed => &mut self.completed,
        }
    }
}
