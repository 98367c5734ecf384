//! PostgreSQL-backed `BadgeRepository` implementation using Diesel ORM.
//!
//! Awards insert into `user_badges` with `ON CONFLICT DO NOTHING`; only a
//! fresh award writes the `BADGE_EARNED` event.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::AsyncConnection as _;
use diesel_async::RunQueryDsl;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use uuid::Uuid;

use crate::domain::ports::{BadgeRepository, BadgeRepositoryError};
use crate::domain::{Badge, BadgeId, BadgeStats, EventPayload, NewEvent, UserId};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::diesel_helpers::{append_event, collect_rows, from_db_i32, from_db_i64};
use super::models::{BadgeRow, DomainProgressRow};
use super::pool::{DbPool, PoolError};
use super::schema::{badges, domain_progress, user_badges, users};

/// Diesel-backed implementation of the `BadgeRepository` port.
#[derive(Clone)]
pub struct DieselBadgeRepository {
    pool: DbPool,
}

impl DieselBadgeRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> BadgeRepositoryError {
    map_basic_pool_error(error, BadgeRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> BadgeRepositoryError {
    map_basic_diesel_error(
        error,
        BadgeRepositoryError::query,
        BadgeRepositoryError::connection,
    )
}

#[async_trait]
impl BadgeRepository for DieselBadgeRepository {
    async fn catalog(&self) -> Result<Vec<Badge>, BadgeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<BadgeRow> = badges::table
            .order_by(badges::title)
            .select(BadgeRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        collect_rows(
            rows.into_iter().map(BadgeRow::into_badge),
            BadgeRepositoryError::query,
        )
    }

    async fn held_badge_ids(&self, user: &UserId) -> Result<Vec<BadgeId>, BadgeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let ids: Vec<Uuid> = user_badges::table
            .filter(user_badges::user_id.eq(user.as_uuid()))
            .select(user_badges::badge_id)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(ids.into_iter().map(BadgeId::from_uuid).collect())
    }

    async fn stats(&self, user: &UserId) -> Result<Option<BadgeStats>, BadgeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let counters: Option<(i32, i64)> = users::table
            .find(user.as_uuid())
            .select((users::streak, users::xp_total))
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        let Some((streak, xp_total)) = counters else {
            return Ok(None);
        };

        let rows: Vec<DomainProgressRow> = domain_progress::table
            .filter(domain_progress::user_id.eq(user.as_uuid()))
            .select(DomainProgressRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let domains = collect_rows(
            rows.into_iter().map(DomainProgressRow::into_progress),
            BadgeRepositoryError::query,
        )?;

        Ok(Some(BadgeStats::new(
            from_db_i32(streak),
            from_db_i64(xp_total),
            domains,
        )))
    }

    async fn award(
        &self,
        user: &UserId,
        badge: &Badge,
        at: DateTime<Utc>,
    ) -> Result<bool, BadgeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let event = NewEvent::for_user(
            *user,
            EventPayload::BadgeEarned {
                badge_id: badge.id,
                title: badge.title.clone(),
            },
        );

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                let inserted = diesel::insert_into(user_badges::table)
                    .values((
                        user_badges::user_id.eq(user.as_uuid()),
                        user_badges::badge_id.eq(badge.id.as_uuid()),
                        user_badges::earned_at.eq(at),
                    ))
                    .on_conflict_do_nothing()
                    .execute(conn)
                    .await?;
                if inserted == 0 {
                    return Ok(false);
                }
                append_event(conn, &event, at).await?;
                Ok(true)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }
}
