//! Kanban board for a signed-in user.
//!
//! Tasks sit in three fixed lanes and move between them by drag and drop.
//! The module follows hexagonal architecture:
//!
//! - Domain types and the lane-partitioned board store in [`domain`]
//! - The persistence gateway contract in [`ports`]
//! - In-memory and `PostgreSQL` gateways in [`adapters`]
//! - The drag engine, create-task dialog and board session in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
