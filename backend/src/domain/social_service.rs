//! Follow graph use cases.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::ports::{
    SocialRepository, SocialRepositoryError, SocialService, UserRepository, UserRepositoryError,
};
use crate::domain::{Error, FollowStats, User, UserId};

fn map_repository_error(error: SocialRepositoryError) -> Error {
    match error {
        SocialRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("social repository unavailable: {message}"))
        }
        SocialRepositoryError::Query { message } => {
            Error::internal(format!("social repository error: {message}"))
        }
        SocialRepositoryError::AlreadyFollowing => {
            Error::invalid_request("Already following this user")
        }
    }
}

fn map_user_error(error: UserRepositoryError) -> Error {
    match error {
        UserRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        other => Error::internal(format!("user repository error: {other}")),
    }
}

/// Social service implementing [`SocialService`].
#[derive(Clone)]
pub struct SocialServiceImpl<R> {
    repo: Arc<R>,
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
}

impl<R> SocialServiceImpl<R> {
    /// Create the service.
    pub fn new(repo: Arc<R>, users: Arc<dyn UserRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, users, clock }
    }

    async fn ensure_user_exists(&self, user: &UserId) -> Result<(), Error> {
        self.users
            .find_by_id(user)
            .await
            .map_err(map_user_error)?
            .map(|_| ())
            .ok_or_else(|| Error::not_found("User not found"))
    }
}

#[async_trait]
impl<R> SocialService for SocialServiceImpl<R>
where
    R: SocialRepository,
{
    async fn follow_stats(&self, user: &UserId) -> Result<FollowStats, Error> {
        self.ensure_user_exists(user).await?;
        self.repo
            .follow_stats(user)
            .await
            .map_err(map_repository_error)
    }

    async fn is_following(&self, follower: &UserId, target: &UserId) -> Result<bool, Error> {
        self.repo
            .is_following(follower, target)
            .await
            .map_err(map_repository_error)
    }

    async fn follow(&self, actor: &User, target: &UserId) -> Result<(), Error> {
        if actor.id == *target {
            return Err(Error::invalid_request("Cannot follow yourself"));
        }
        self.ensure_user_exists(target).await?;
        self.repo
            .follow(&actor.id, target, self.clock.utc())
            .await
            .map_err(map_repository_error)?;
        info!(follower = %actor.id, following = %target, "user followed");
        Ok(())
    }

    async fn unfollow(&self, actor: &User, target: &UserId) -> Result<(), Error> {
        let removed = self
            .repo
            .unfollow(&actor.id, target)
            .await
            .map_err(map_repository_error)?;
        if !removed {
            return Err(Error::not_found("Not following this user"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "social_service_tests.rs"]
mod tests;
