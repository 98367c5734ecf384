//! Port for appending standalone audit events.
//!
//! Events that belong to a larger mutation are written by the owning
//! repository inside its transaction; this port covers follow-up events such
//! as level-ups and streak milestones.
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::NewEvent;

use super::define_port_error;

define_port_error! {
    /// Errors raised by event log adapters.
    pub enum EventLogError {
        /// Repository connection could not be established.
        Connection { message: String } => "event log connection failed: {message}",
        /// Insert failed during execution.
        Query { message: String } => "event log insert failed: {message}",
    }
}

/// Append-only event sink.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Append one event.
    async fn append(&self, event: &NewEvent, at: DateTime<Utc>) -> Result<(), EventLogError>;
}
