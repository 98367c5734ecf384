//! Driving port for the follow graph.

use async_trait::async_trait;

use crate::domain::{Error, FollowStats, User, UserId};

/// Domain use-case port for following other players.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SocialService: Send + Sync {
    /// Follower and following figures of any user.
    async fn follow_stats(&self, user: &UserId) -> Result<FollowStats, Error>;

    /// Whether `follower` follows `target`.
    async fn is_following(&self, follower: &UserId, target: &UserId) -> Result<bool, Error>;

    /// Make the caller follow `target`.
    async fn follow(&self, actor: &User, target: &UserId) -> Result<(), Error>;

    /// Make the caller stop following `target`.
    async fn unfollow(&self, actor: &User, target: &UserId) -> Result<(), Error>;
}
