//! Port contracts for the task board.
//!
//! Ports define infrastructure-agnostic interfaces used by board services.

pub mod gateway;

pub use gateway::{
    GatewayError, GatewayResult, LaneChange, PersistenceGateway, with_deadline,
};

#[cfg(test)]
pub use gateway::MockPersistenceGateway;
