//! Port for progress aggregates and heart restoration.
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{ActiveBooster, DomainProgress, EarnedBadge, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by progress repository adapters.
    pub enum ProgressRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "progress repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "progress repository query failed: {message}",
        /// The gem balance no longer covers the cost.
        InsufficientGems => "not enough gems",
        /// Hearts reached the maximum meanwhile.
        HeartsFull => "hearts already full",
    }
}

/// Balances after a heart was bought back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartRestored {
    pub hearts: u32,
    pub gems: u32,
}

/// Port for progress reads and the restore-heart mutation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Per-domain aggregates of a user.
    async fn domain_progress(
        &self,
        user: &UserId,
    ) -> Result<Vec<DomainProgress>, ProgressRepositoryError>;

    /// Badges held by a user, newest first.
    async fn earned_badges(&self, user: &UserId)
    -> Result<Vec<EarnedBadge>, ProgressRepositoryError>;

    /// Boosters of a user that are unexpired at `now`.
    async fn active_boosters(
        &self,
        user: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Vec<ActiveBooster>, ProgressRepositoryError>;

    /// Spend `cost` gems for one heart as a single conditional update.
    async fn restore_heart(
        &self,
        user: &UserId,
        cost: u32,
        max_hearts: u32,
        at: DateTime<Utc>,
    ) -> Result<HeartRestored, ProgressRepositoryError>;
}
