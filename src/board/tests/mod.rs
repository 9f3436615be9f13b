//! Unit tests for the board module.
//!
//! Tests are grouped by concern: domain values, the board store, the drag
//! transition engine, the create-task dialog and the board session.
