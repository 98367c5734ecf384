//! Port for the bulk updates run by scheduled jobs.
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::UserId;

use super::define_port_error;

define_port_error! {
    /// Errors raised by maintenance adapters.
    pub enum MaintenanceRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "maintenance repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "maintenance repository query failed: {message}",
    }
}

/// Half-open activity window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Result of one streak pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreakSweep {
    /// Users whose streak grew, with the new length.
    pub extended: Vec<(UserId, u32)>,
    /// Number of streaks reset to zero.
    pub reset: usize,
}

/// Port for scheduled bulk mutations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MaintenanceRepository: Send + Sync {
    /// Set every user's hearts to `max_hearts`.
    async fn refill_hearts(&self, max_hearts: u32) -> Result<usize, MaintenanceRepositoryError>;

    /// Extend streaks of users with a pass inside `window` and reset stale
    /// ones.
    ///
    /// Extended users get `last_active_date = now`. Users without a pass in
    /// the window whose last activity precedes `window.start` lose their
    /// streak unless they hold a FREEZE_STREAK booster active at `now`.
    async fn update_streaks(
        &self,
        window: ActivityWindow,
        now: DateTime<Utc>,
    ) -> Result<StreakSweep, MaintenanceRepositoryError>;

    /// Delete boosters that expired before `now`.
    async fn purge_expired_boosters(
        &self,
        now: DateTime<Utc>,
    ) -> Result<usize, MaintenanceRepositoryError>;

    /// Deactivate flash quests that ended before `now`.
    async fn deactivate_expired_flash_quests(
        &self,
        now: DateTime<Utc>,
    ) -> Result<usize, MaintenanceRepositoryError>;
}
