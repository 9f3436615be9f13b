//! Connection settings applied to every pooled `PostgreSQL` connection.

use diesel::connection::SimpleConnection;
use diesel::pg::PgConnection;
use diesel::r2d2::{CustomizeConnection, Error as PoolError};
use std::time::Duration;

/// Sets `statement_timeout` on each connection the pool hands out.
///
/// The server cancels any statement, including a wait on a row lock, that
/// outlives the limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatementTimeout {
    limit: Duration,
}

impl StatementTimeout {
    /// Creates a customizer for `limit`, truncated to whole milliseconds.
    #[must_use]
    pub const fn new(limit: Duration) -> Self {
        Self { limit }
    }

    /// The `SET` statement issued on acquire.
    #[must_use]
    pub fn statement(&self) -> String {
        // Zero would disable the timeout altogether.
        let millis = self.limit.as_millis().max(1);
        format!("SET statement_timeout = {millis}")
    }
}

impl CustomizeConnection<PgConnection, PoolError> for StatementTimeout {
    fn on_acquire(&self, connection: &mut PgConnection) -> Result<(), PoolError> {
        connection
            .batch_execute(&self.statement())
            .map_err(PoolError::QueryError)
    }
}
