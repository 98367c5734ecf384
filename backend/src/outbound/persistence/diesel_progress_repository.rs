//! PostgreSQL-backed `ProgressRepository` implementation using Diesel ORM.
//!
//! Heart restoration is a conditional update guarded by the gem balance and
//! the heart cap, so two concurrent restores cannot overspend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::AsyncConnection as _;
use diesel_async::RunQueryDsl;
use diesel_async::scoped_futures::ScopedFutureExt as _;

use crate::domain::ports::{HeartRestored, ProgressRepository, ProgressRepositoryError};
use crate::domain::{ActiveBooster, DomainProgress, EarnedBadge, EventPayload, NewEvent, UserId};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::diesel_helpers::{TxError, append_event, collect_rows, from_db_i32, to_db_i32};
use super::models::{ActiveBoosterRow, BadgeRow, DomainProgressRow};
use super::pool::{DbPool, PoolError};
use super::schema::{active_boosters, badges, domain_progress, user_badges, users};

/// Diesel-backed implementation of the `ProgressRepository` port.
#[derive(Clone)]
pub struct DieselProgressRepository {
    pool: DbPool,
}

impl DieselProgressRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ProgressRepositoryError {
    map_basic_pool_error(error, ProgressRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> ProgressRepositoryError {
    map_basic_diesel_error(
        error,
        ProgressRepositoryError::query,
        ProgressRepositoryError::connection,
    )
}

/// Explain why a guarded restore touched no row.
fn restore_refusal(
    balances: Option<(i32, i32)>,
    cost: u32,
    max_hearts: u32,
) -> ProgressRepositoryError {
    match balances {
        None => ProgressRepositoryError::query("user not found"),
        Some((hearts, _)) if from_db_i32(hearts) >= max_hearts => {
            ProgressRepositoryError::hearts_full()
        }
        Some((_, gems)) if from_db_i32(gems) < cost => ProgressRepositoryError::insufficient_gems(),
        Some(_) => ProgressRepositoryError::query("heart restore lost a concurrent update"),
    }
}

#[async_trait]
impl ProgressRepository for DieselProgressRepository {
    async fn domain_progress(
        &self,
        user: &UserId,
    ) -> Result<Vec<DomainProgress>, ProgressRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<DomainProgressRow> = domain_progress::table
            .filter(domain_progress::user_id.eq(user.as_uuid()))
            .order_by(domain_progress::domain)
            .select(DomainProgressRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        collect_rows(
            rows.into_iter().map(DomainProgressRow::into_progress),
            ProgressRepositoryError::query,
        )
    }

    async fn earned_badges(
        &self,
        user: &UserId,
    ) -> Result<Vec<EarnedBadge>, ProgressRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<(BadgeRow, DateTime<Utc>)> = user_badges::table
            .inner_join(badges::table)
            .filter(user_badges::user_id.eq(user.as_uuid()))
            .order_by(user_badges::earned_at.desc())
            .select((BadgeRow::as_select(), user_badges::earned_at))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        collect_rows(
            rows.into_iter().map(|(badge, earned_at)| {
                Ok(EarnedBadge {
                    badge: badge.into_badge()?,
                    earned_at,
                })
            }),
            ProgressRepositoryError::query,
        )
    }

    async fn active_boosters(
        &self,
        user: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Vec<ActiveBooster>, ProgressRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<ActiveBoosterRow> = active_boosters::table
            .filter(active_boosters::user_id.eq(user.as_uuid()))
            .filter(active_boosters::expires_at.gt(now))
            .order_by(active_boosters::expires_at)
            .select(ActiveBoosterRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        collect_rows(
            rows.into_iter().map(ActiveBoosterRow::into_booster),
            ProgressRepositoryError::query,
        )
    }

    async fn restore_heart(
        &self,
        user: &UserId,
        cost: u32,
        max_hearts: u32,
        at: DateTime<Utc>,
    ) -> Result<HeartRestored, ProgressRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let event = NewEvent::for_user(*user, EventPayload::HeartRestored { gems_spent: cost });
        let cost_db = to_db_i32(cost);
        let max_db = to_db_i32(max_hearts);

        let (hearts, gems) = conn
            .transaction::<_, TxError<ProgressRepositoryError>, _>(|conn| {
                async move {
                    let updated: Option<(i32, i32)> = diesel::update(
                        users::table
                            .find(user.as_uuid())
                            .filter(users::gems.ge(cost_db))
                            .filter(users::hearts.lt(max_db)),
                    )
                    .set((
                        users::hearts.eq(users::hearts + 1),
                        users::gems.eq(users::gems - cost_db),
                    ))
                    .returning((users::hearts, users::gems))
                    .get_result(conn)
                    .await
                    .optional()?;

                    let Some(balances) = updated else {
                        let current: Option<(i32, i32)> = users::table
                            .find(user.as_uuid())
                            .select((users::hearts, users::gems))
                            .first(conn)
                            .await
                            .optional()?;
                        return Err(TxError::Rejected(restore_refusal(current, cost, max_hearts)));
                    };

                    append_event(conn, &event, at).await?;
                    Ok(balances)
                }
                .scope_boxed()
            })
            .await
            .map_err(|err| err.into_repository_error(map_diesel_error))?;

        Ok(HeartRestored {
            hearts: from_db_i32(hearts),
            gems: from_db_i32(gems),
        })
    }
}
