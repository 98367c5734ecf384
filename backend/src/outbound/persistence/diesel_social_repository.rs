//! PostgreSQL-backed `SocialRepository` implementation using Diesel ORM.
//!
//! Follow edges are keyed by `(follower_id, following_id)`, so a repeated
//! follow surfaces as a primary-key violation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{SocialRepository, SocialRepositoryError};
use crate::domain::{FollowStats, UserId, UserSummary};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::diesel_helpers::{collect_rows, violated_unique_constraint};
use super::models::UserSummaryRow;
use super::pool::{DbPool, PoolError};
use super::schema::{follows, users};

/// Diesel-backed implementation of the `SocialRepository` port.
#[derive(Clone)]
pub struct DieselSocialRepository {
    pool: DbPool,
}

impl DieselSocialRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> SocialRepositoryError {
    map_basic_pool_error(error, SocialRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> SocialRepositoryError {
    if violated_unique_constraint(&error).is_some() {
        return SocialRepositoryError::already_following();
    }
    map_basic_diesel_error(
        error,
        SocialRepositoryError::query,
        SocialRepositoryError::connection,
    )
}

fn summaries(rows: Vec<UserSummaryRow>) -> Result<Vec<UserSummary>, SocialRepositoryError> {
    collect_rows(
        rows.into_iter().map(UserSummaryRow::into_summary),
        SocialRepositoryError::query,
    )
}

fn count(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

#[async_trait]
impl SocialRepository for DieselSocialRepository {
    async fn follow_stats(&self, user: &UserId) -> Result<FollowStats, SocialRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let followers: Vec<UserSummaryRow> = users::table
            .filter(
                users::id.eq_any(
                    follows::table
                        .filter(follows::following_id.eq(user.as_uuid()))
                        .select(follows::follower_id),
                ),
            )
            .order_by(users::name)
            .select(UserSummaryRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let following: Vec<UserSummaryRow> = users::table
            .filter(
                users::id.eq_any(
                    follows::table
                        .filter(follows::follower_id.eq(user.as_uuid()))
                        .select(follows::following_id),
                ),
            )
            .order_by(users::name)
            .select(UserSummaryRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let followers = summaries(followers)?;
        let following = summaries(following)?;
        Ok(FollowStats {
            followers_count: count(followers.len()),
            following_count: count(following.len()),
            followers,
            following,
        })
    }

    async fn is_following(
        &self,
        follower: &UserId,
        following: &UserId,
    ) -> Result<bool, SocialRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::select(diesel::dsl::exists(
            follows::table.find((follower.as_uuid(), following.as_uuid())),
        ))
        .get_result(&mut conn)
        .await
        .map_err(map_diesel_error)
    }

    async fn follow(
        &self,
        follower: &UserId,
        following: &UserId,
        at: DateTime<Utc>,
    ) -> Result<(), SocialRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(follows::table)
            .values((
                follows::follower_id.eq(follower.as_uuid()),
                follows::following_id.eq(following.as_uuid()),
                follows::created_at.eq(at),
            ))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn unfollow(
        &self,
        follower: &UserId,
        following: &UserId,
    ) -> Result<bool, SocialRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let removed = diesel::delete(follows::table.find((follower.as_uuid(), following.as_uuid())))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(removed > 0)
    }
}
