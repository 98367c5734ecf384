//! PostgreSQL-backed `EventLog` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::NewEvent;
use crate::domain::ports::{EventLog, EventLogError};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::diesel_helpers::append_event;
use super::pool::{DbPool, PoolError};

/// Diesel-backed implementation of the `EventLog` port.
#[derive(Clone)]
pub struct DieselEventLog {
    pool: DbPool,
}

impl DieselEventLog {
    /// Create a new event log with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> EventLogError {
    map_basic_pool_error(error, EventLogError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> EventLogError {
    map_basic_diesel_error(error, EventLogError::query, EventLogError::connection)
}

#[async_trait]
impl EventLog for DieselEventLog {
    async fn append(&self, event: &NewEvent, at: DateTime<Utc>) -> Result<(), EventLogError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        append_event(&mut conn, event, at)
            .await
            .map_err(map_diesel_error)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn serialization_failures_are_insert_errors() {
        let err = diesel::result::Error::SerializationError("bad payload".into());

        let mapped = map_diesel_error(err);

        assert!(matches!(mapped, EventLogError::Query { .. }));
    }
}
