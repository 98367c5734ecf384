//! Port for the directed follow graph between users.
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{FollowStats, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by follow graph adapters.
    pub enum SocialRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "social repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "social repository query failed: {message}",
        /// The edge already exists.
        AlreadyFollowing => "already following this user",
    }
}

/// Port for follow edges.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SocialRepository: Send + Sync {
    /// Counts and summaries of followers and followed users.
    async fn follow_stats(&self, user: &UserId) -> Result<FollowStats, SocialRepositoryError>;

    /// Whether `follower` follows `following`.
    async fn is_following(
        &self,
        follower: &UserId,
        following: &UserId,
    ) -> Result<bool, SocialRepositoryError>;

    /// Insert a follow edge.
    async fn follow(
        &self,
        follower: &UserId,
        following: &UserId,
        at: DateTime<Utc>,
    ) -> Result<(), SocialRepositoryError>;

    /// Remove a follow edge, returning whether one existed.
    async fn unfollow(
        &self,
        follower: &UserId,
        following: &UserId,
    ) -> Result<bool, SocialRepositoryError>;
}
