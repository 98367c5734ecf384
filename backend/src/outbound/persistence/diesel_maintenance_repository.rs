//! PostgreSQL-backed `MaintenanceRepository` implementation using Diesel ORM.
//!
//! Each operation is a set-based statement; the streak pass runs its extend
//! and reset statements in one transaction so a user is never both extended
//! and reset by the same run.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::{exists, not};
use diesel::prelude::*;
use diesel_async::AsyncConnection as _;
use diesel_async::RunQueryDsl;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use uuid::Uuid;

use crate::domain::ports::{
    ActivityWindow, MaintenanceRepository, MaintenanceRepositoryError, StreakSweep,
};
use crate::domain::{AttemptResult, BoosterKind, UserId};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::diesel_helpers::{from_db_i32, to_db_i32};
use super::pool::{DbPool, PoolError};
use super::schema::{active_boosters, flash_quests, lesson_attempts, users};

/// Diesel-backed implementation of the `MaintenanceRepository` port.
#[derive(Clone)]
pub struct DieselMaintenanceRepository {
    pool: DbPool,
}

impl DieselMaintenanceRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> MaintenanceRepositoryError {
    map_basic_pool_error(error, MaintenanceRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> MaintenanceRepositoryError {
    map_basic_diesel_error(
        error,
        MaintenanceRepositoryError::query,
        MaintenanceRepositoryError::connection,
    )
}

fn extended_streaks(rows: Vec<(Uuid, i32)>) -> Vec<(UserId, u32)> {
    rows.into_iter()
        .map(|(id, streak)| (UserId::from_uuid(id), from_db_i32(streak)))
        .collect()
}

#[async_trait]
impl MaintenanceRepository for DieselMaintenanceRepository {
    async fn refill_hearts(&self, max_hearts: u32) -> Result<usize, MaintenanceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let max_hearts = to_db_i32(max_hearts);

        diesel::update(users::table.filter(users::hearts.ne(max_hearts)))
            .set(users::hearts.eq(max_hearts))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)
    }

    async fn update_streaks(
        &self,
        window: ActivityWindow,
        now: DateTime<Utc>,
    ) -> Result<StreakSweep, MaintenanceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let (extended, reset) = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                async move {
                    let active_users = lesson_attempts::table
                        .filter(lesson_attempts::result.eq(AttemptResult::Pass.as_str()))
                        .filter(lesson_attempts::created_at.ge(window.start))
                        .filter(lesson_attempts::created_at.lt(window.end))
                        .select(lesson_attempts::user_id);

                    let extended: Vec<(Uuid, i32)> =
                        diesel::update(users::table.filter(users::id.eq_any(active_users)))
                            .set((
                                users::streak.eq(users::streak + 1),
                                users::last_active_date.eq(Some(now)),
                            ))
                            .returning((users::id, users::streak))
                            .get_results(conn)
                            .await?;
                    let extended_ids: Vec<Uuid> = extended.iter().map(|(id, _)| *id).collect();

                    let frozen = active_boosters::table
                        .filter(active_boosters::user_id.eq(users::id))
                        .filter(active_boosters::booster_type.eq(BoosterKind::FreezeStreak.as_str()))
                        .filter(active_boosters::expires_at.gt(now));

                    let reset = diesel::update(
                        users::table
                            .filter(users::streak.gt(0))
                            .filter(not(users::id.eq_any(&extended_ids)))
                            .filter(
                                users::last_active_date
                                    .is_null()
                                    .or(users::last_active_date.lt(window.start)),
                            )
                            .filter(not(exists(frozen))),
                    )
                    .set(users::streak.eq(0))
                    .execute(conn)
                    .await?;

                    Ok((extended, reset))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        Ok(StreakSweep {
            extended: extended_streaks(extended),
            reset,
        })
    }

    async fn purge_expired_boosters(
        &self,
        now: DateTime<Utc>,
    ) -> Result<usize, MaintenanceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::delete(active_boosters::table.filter(active_boosters::expires_at.le(now)))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)
    }

    async fn deactivate_expired_flash_quests(
        &self,
        now: DateTime<Utc>,
    ) -> Result<usize, MaintenanceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::update(
            flash_quests::table
                .filter(flash_quests::active.eq(true))
                .filter(flash_quests::ends_at.le(now)),
        )
        .set(flash_quests::active.eq(false))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn extended_rows_keep_the_new_length() {
        let id = Uuid::new_v4();

        let extended = extended_streaks(vec![(id, 7)]);

        assert_eq!(extended, vec![(UserId::from_uuid(id), 7)]);
    }

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let repo_err = map_pool_error(PoolError::checkout("pool exhausted"));

        assert!(matches!(
            repo_err,
            MaintenanceRepositoryError::Connection { .. }
        ));
    }
}
