//! PostgreSQL-backed `LearningRepository` implementation using Diesel ORM.
//!
//! Recording an attempt is a single transaction: the attempt row, the heart
//! and XP deltas on the user, the domain progress upsert for a pass and the
//! lesson event either all commit or none do.

use async_trait::async_trait;
use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::Integer;
use diesel_async::AsyncConnection as _;
use diesel_async::RunQueryDsl;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use uuid::Uuid;

use crate::domain::ports::{
    AttemptApplied, AttemptRecord, LearningRepository, LearningRepositoryError,
};
use crate::domain::{
    AttemptResult, DomainDelta, EventPayload, Lesson, LessonId, LessonInDomain, NewEvent, Unit,
    UnitId, UserId,
};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::diesel_helpers::{
    TxError, append_event, collect_rows, decode_label, from_db_i32, from_db_i64, to_db_i32,
    upsert_domain_progress,
};
use super::models::{DomainProgressRow, LessonAttemptRow, LessonRow, UnitRow};
use super::pool::{DbPool, PoolError};
use super::schema::{lesson_attempts, lessons, units, users};

/// Diesel-backed implementation of the `LearningRepository` port.
#[derive(Clone)]
pub struct DieselLearningRepository {
    pool: DbPool,
    level_size: u64,
}

impl DieselLearningRepository {
    /// Create a new repository; `level_size` is the XP span of one domain level.
    pub fn new(pool: DbPool, level_size: u64) -> Self {
        Self { pool, level_size }
    }
}

fn map_pool_error(error: PoolError) -> LearningRepositoryError {
    map_basic_pool_error(error, LearningRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> LearningRepositoryError {
    map_basic_diesel_error(
        error,
        LearningRepositoryError::query,
        LearningRepositoryError::connection,
    )
}

fn units_from_rows(rows: Vec<UnitRow>) -> Result<Vec<Unit>, LearningRepositoryError> {
    collect_rows(
        rows.into_iter().map(UnitRow::into_unit),
        LearningRepositoryError::query,
    )
}

fn lessons_from_rows(rows: Vec<LessonRow>) -> Result<Vec<Lesson>, LearningRepositoryError> {
    collect_rows(
        rows.into_iter().map(LessonRow::into_lesson),
        LearningRepositoryError::query,
    )
}

fn lesson_event(record: &AttemptRecord) -> NewEvent {
    let lesson_id = record.lesson.lesson.id;
    let payload = if record.outcome.passed {
        EventPayload::LessonCompleted {
            lesson_id,
            domain: record.lesson.domain,
            xp_earned: record.outcome.xp_earned,
        }
    } else {
        EventPayload::LessonFailed {
            lesson_id,
            errors_count: record.errors_count,
            hearts_used: record.outcome.hearts_used,
        }
    };
    NewEvent::for_user(record.user_id, payload)
}

#[async_trait]
impl LearningRepository for DieselLearningRepository {
    async fn list_units(&self) -> Result<Vec<Unit>, LearningRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<UnitRow> = units::table
            .order_by((units::domain, units::sort_order))
            .select(UnitRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        units_from_rows(rows)
    }

    async fn list_lessons(&self) -> Result<Vec<Lesson>, LearningRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<LessonRow> = lessons::table
            .order_by((lessons::unit_id, lessons::sort_order))
            .select(LessonRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        lessons_from_rows(rows)
    }

    async fn find_unit(&self, id: &UnitId) -> Result<Option<Unit>, LearningRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UnitRow> = units::table
            .find(id.as_uuid())
            .select(UnitRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(|row| row.into_unit().map_err(LearningRepositoryError::query))
            .transpose()
    }

    async fn lessons_for_unit(&self, id: &UnitId) -> Result<Vec<Lesson>, LearningRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<LessonRow> = lessons::table
            .filter(lessons::unit_id.eq(id.as_uuid()))
            .order_by(lessons::sort_order)
            .select(LessonRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        lessons_from_rows(rows)
    }

    async fn find_lesson(
        &self,
        id: &LessonId,
    ) -> Result<Option<LessonInDomain>, LearningRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<(LessonRow, String)> = lessons::table
            .inner_join(units::table)
            .filter(lessons::id.eq(id.as_uuid()))
            .select((LessonRow::as_select(), units::domain))
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(|(lesson, domain)| {
            Ok::<_, String>(LessonInDomain {
                lesson: lesson.into_lesson()?,
                domain: decode_label(&domain, "domain")?,
            })
        })
        .transpose()
        .map_err(LearningRepositoryError::query)
    }

    async fn passed_lesson_ids(
        &self,
        user: &UserId,
    ) -> Result<Vec<LessonId>, LearningRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let ids: Vec<Uuid> = lesson_attempts::table
            .filter(lesson_attempts::user_id.eq(user.as_uuid()))
            .filter(lesson_attempts::result.eq(AttemptResult::Pass.as_str()))
            .select(lesson_attempts::lesson_id)
            .distinct()
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(ids.into_iter().map(LessonId::from_uuid).collect())
    }

    async fn record_attempt(
        &self,
        record: &AttemptRecord,
    ) -> Result<AttemptApplied, LearningRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let level_size = self.level_size;

        let result = if record.outcome.passed {
            AttemptResult::Pass
        } else {
            AttemptResult::Fail
        };
        let attempt_row = LessonAttemptRow {
            id: Uuid::new_v4(),
            user_id: *record.user_id.as_uuid(),
            lesson_id: *record.lesson.lesson.id.as_uuid(),
            result: result.as_str().to_owned(),
            errors_count: to_db_i32(record.errors_count),
            xp_earned: to_db_i32(record.outcome.xp_earned),
            hearts_used: to_db_i32(record.outcome.hearts_used),
            answers: record.answers.clone(),
            created_at: record.at,
        };
        let event = lesson_event(record);

        let (attempt, (hearts, xp_total), progress) = conn
            .transaction::<_, TxError<LearningRepositoryError>, _>(|conn| {
                async move {
                    let balances: Option<(i32, i64)> =
                        diesel::update(users::table.find(record.user_id.as_uuid()))
                            .set((
                                users::hearts.eq(sql::<Integer>("GREATEST(hearts - ")
                                    .bind::<Integer, _>(attempt_row.hearts_used)
                                    .sql(", 0)")),
                                users::xp_total
                                    .eq(users::xp_total + i64::from(record.outcome.xp_earned)),
                            ))
                            .returning((users::hearts, users::xp_total))
                            .get_result(conn)
                            .await
                            .optional()?;
                    let Some(balances) = balances else {
                        return Err(TxError::Rejected(LearningRepositoryError::user_not_found()));
                    };

                    let attempt: LessonAttemptRow = diesel::insert_into(lesson_attempts::table)
                        .values(&attempt_row)
                        .returning(LessonAttemptRow::as_returning())
                        .get_result(conn)
                        .await?;

                    let progress: Option<DomainProgressRow> = if record.outcome.passed {
                        let delta =
                            DomainDelta::lesson(record.lesson.domain, record.outcome.xp_earned);
                        Some(upsert_domain_progress(conn, &record.user_id, &delta, level_size).await?)
                    } else {
                        None
                    };

                    append_event(conn, &event, record.at).await?;
                    Ok((attempt, balances, progress))
                }
                .scope_boxed()
            })
            .await
            .map_err(|err| err.into_repository_error(map_diesel_error))?;

        Ok(AttemptApplied {
            attempt: attempt
                .into_attempt()
                .map_err(LearningRepositoryError::query)?,
            hearts: from_db_i32(hearts),
            xp_total: from_db_i64(xp_total),
            domain_progress: progress
                .map(DomainProgressRow::into_progress)
                .transpose()
                .map_err(LearningRepositoryError::query)?,
        })
    }
}
