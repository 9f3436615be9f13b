//! Diesel row models for board persistence.

use super::schema::{profiles, task_assignees, tasks};
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Display title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Due date.
    pub due_date: NaiveDate,
    /// Lane name.
    pub lane: String,
    /// Completion percentage.
    pub progress: i16,
    /// Position within the lane.
    pub rank: i32,
    /// Mutation counter.
    pub version: i64,
    /// Creator profile.
    pub created_by: uuid::Uuid,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert model for task records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Display title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Due date.
    pub due_date: NaiveDate,
    /// Lane name.
    pub lane: String,
    /// Completion percentage.
    pub progress: i16,
    /// Position within the lane.
    pub rank: i32,
    /// Mutation counter.
    pub version: i64,
    /// Creator profile.
    pub created_by: uuid::Uuid,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Row linking a task to an assigned profile.
#[derive(Debug, Clone, Copy, Queryable, Selectable, Insertable)]
#[diesel(table_name = task_assignees)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AssigneeRow {
    /// Assigned task.
    pub task_id: uuid::Uuid,
    /// Assigned profile.
    pub user_id: uuid::Uuid,
}

/// User directory row.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProfileRow {
    /// Profile identifier.
    pub id: uuid::Uuid,
    /// Display name.
    pub full_name: String,
}
