//! In-memory adapters for the task board.

mod gateway;

pub use gateway::{GatewayOperation, InMemoryGateway};
