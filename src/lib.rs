//! Taskboard: a three-lane kanban board with drag-and-drop transitions.
//!
//! The crate keeps an in-memory projection of a user's tasks consistent with
//! a persistence store while lane changes are applied optimistically and
//! rolled back when the store rejects them.
//!
//! # Architecture
//!
//! Taskboard follows hexagonal architecture principles:
//!
//! - **Domain**: Pure board logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for persistence
//! - **Adapters**: Concrete implementations of ports (memory, `PostgreSQL`)
//!
//! # Modules
//!
//! - [`board`]: Lanes, tasks, the drag engine and board sessions
//! - [`config`]: Session configuration and environment overrides

pub mod board;
pub mod config;
