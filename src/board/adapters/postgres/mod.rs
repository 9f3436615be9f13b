//! `PostgreSQL` adapter for board persistence.

mod gateway;
mod models;
mod pool;
mod schema;

pub use gateway::{BoardPgPool, PostgresGateway};
pub use pool::StatementTimeout;
