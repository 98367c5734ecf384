//! Port for badge definitions and awards.
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Badge, BadgeId, BadgeStats, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by badge repository adapters.
    pub enum BadgeRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "badge repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "badge repository query failed: {message}",
    }
}

/// Port for the badge catalog and user awards.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BadgeRepository: Send + Sync {
    /// Every badge definition.
    async fn catalog(&self) -> Result<Vec<Badge>, BadgeRepositoryError>;

    /// Identifiers of badges the user holds.
    async fn held_badge_ids(&self, user: &UserId) -> Result<Vec<BadgeId>, BadgeRepositoryError>;

    /// Current figures for criteria evaluation; `None` for unknown users.
    async fn stats(&self, user: &UserId) -> Result<Option<BadgeStats>, BadgeRepositoryError>;

    /// Award a badge together with its BADGE_EARNED event.
    ///
    /// Returns `false` when the user already held the badge.
    async fn award(
        &self,
        user: &UserId,
        badge: &Badge,
        at: DateTime<Utc>,
    ) -> Result<bool, BadgeRepositoryError>;
}
