//! PostgreSQL-backed `MissionRepository` implementation using Diesel ORM.
//!
//! Resolving a submission updates the row only while it is still `PENDING`;
//! the reward deltas, domain progress and `MISSION_VERIFIED` event are written
//! in the same transaction, so a submission pays out at most once.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{MissionRepository, MissionRepositoryError, ResolvedSubmission};
use crate::domain::{
    DomainDelta, EventPayload, Mission, MissionFilter, MissionId, MissionReward, NewEvent,
    NewSubmission, Submission, SubmissionId, SubmissionStatus, TeamId, Verification, Verifier,
};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::diesel_helpers::{
    TxError, append_event, collect_rows, to_db_i32, upsert_domain_progress,
};
use super::models::{DomainProgressRow, MissionRow, SubmissionRow};
use super::pool::{DbPool, PoolError};
use super::schema::{missions, submissions, teams, users};

/// Diesel-backed implementation of the `MissionRepository` port.
#[derive(Clone)]
pub struct DieselMissionRepository {
    pool: DbPool,
    level_size: u64,
}

impl DieselMissionRepository {
    /// Create a new repository; `level_size` is the XP span of one domain level.
    pub fn new(pool: DbPool, level_size: u64) -> Self {
        Self { pool, level_size }
    }
}

fn map_pool_error(error: PoolError) -> MissionRepositoryError {
    map_basic_pool_error(error, MissionRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> MissionRepositoryError {
    map_basic_diesel_error(
        error,
        MissionRepositoryError::query,
        MissionRepositoryError::connection,
    )
}

fn to_submission(row: SubmissionRow) -> Result<Submission, MissionRepositoryError> {
    row.into_submission().map_err(MissionRepositoryError::query)
}

/// Reviewer and CI columns written when a submission is resolved.
#[derive(Debug, Default, PartialEq)]
struct VerifierColumns {
    verifier_id: Option<Uuid>,
    verifier_notes: Option<String>,
    ci_run_id: Option<String>,
    ci_result: Option<serde_json::Value>,
}

impl From<&Verifier> for VerifierColumns {
    fn from(value: &Verifier) -> Self {
        match value {
            Verifier::Reviewer { user_id, notes } => Self {
                verifier_id: Some(*user_id.as_uuid()),
                verifier_notes: notes.clone(),
                ..Self::default()
            },
            Verifier::Ci { run_id, result } => Self {
                ci_run_id: Some(run_id.clone()),
                ci_result: result.clone(),
                ..Self::default()
            },
        }
    }
}

fn verified_event(
    submission: &Submission,
    status: SubmissionStatus,
    reward: &MissionReward,
) -> NewEvent {
    NewEvent::for_user(
        submission.user_id,
        EventPayload::MissionVerified {
            submission_id: submission.id,
            mission_id: submission.mission_id,
            status,
            xp_earned: reward.user_xp,
            gems_earned: reward.user_gems,
            points_earned: reward.team_points,
        },
    )
    .with_team(submission.team_id)
}

/// Credit the team and the submitter; returns the submitter's domain row.
async fn disburse(
    conn: &mut AsyncPgConnection,
    submission: &Submission,
    mission: &Mission,
    reward: &MissionReward,
    level_size: u64,
) -> QueryResult<DomainProgressRow> {
    diesel::update(teams::table.find(submission.team_id.as_uuid()))
        .set((
            teams::total_points.eq(teams::total_points + i64::from(reward.team_points)),
            teams::team_xp.eq(teams::team_xp + i64::from(reward.team_xp)),
        ))
        .execute(conn)
        .await?;
    diesel::update(users::table.find(submission.user_id.as_uuid()))
        .set((
            users::xp_total.eq(users::xp_total + i64::from(reward.user_xp)),
            users::gems.eq(users::gems + to_db_i32(reward.user_gems)),
        ))
        .execute(conn)
        .await?;
    let delta = DomainDelta::mission(mission.category, reward.user_xp);
    upsert_domain_progress(conn, &submission.user_id, &delta, level_size).await
}

#[async_trait]
impl MissionRepository for DieselMissionRepository {
    async fn list(&self, filter: &MissionFilter) -> Result<Vec<Mission>, MissionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut query = missions::table.into_boxed();
        if let Some(domain) = filter.domain {
            query = query.filter(missions::category.eq(domain.as_str()));
        }
        if let Some(status) = filter.status {
            query = query.filter(missions::status.eq(status.as_str()));
        }
        let rows: Vec<MissionRow> = query
            .order_by((missions::category, missions::difficulty, missions::title))
            .select(MissionRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        collect_rows(
            rows.into_iter().map(MissionRow::into_mission),
            MissionRepositoryError::query,
        )
    }

    async fn find(&self, id: &MissionId) -> Result<Option<Mission>, MissionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<MissionRow> = missions::table
            .find(id.as_uuid())
            .select(MissionRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(|row| row.into_mission().map_err(MissionRepositoryError::query))
            .transpose()
    }

    async fn team_submissions(
        &self,
        team: &TeamId,
    ) -> Result<Vec<Submission>, MissionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<SubmissionRow> = submissions::table
            .filter(submissions::team_id.eq(team.as_uuid()))
            .order_by(submissions::created_at.desc())
            .select(SubmissionRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        collect_rows(
            rows.into_iter().map(SubmissionRow::into_submission),
            MissionRepositoryError::query,
        )
    }

    async fn create_submission(
        &self,
        submission: &NewSubmission,
        at: DateTime<Utc>,
    ) -> Result<Submission, MissionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = SubmissionRow {
            id: Uuid::new_v4(),
            team_id: *submission.team_id.as_uuid(),
            mission_id: *submission.mission_id.as_uuid(),
            user_id: *submission.user_id.as_uuid(),
            status: SubmissionStatus::Pending.as_str().to_owned(),
            repository_url: submission.repository_url.clone(),
            notes: submission.notes.clone(),
            ci_run_id: None,
            ci_result: None,
            verifier_id: None,
            verifier_notes: None,
            created_at: at,
            verified_at: None,
        };
        let event = NewEvent::for_user(
            submission.user_id,
            EventPayload::MissionSubmitted {
                submission_id: SubmissionId::from_uuid(row.id),
                mission_id: submission.mission_id,
            },
        )
        .with_team(submission.team_id);

        let created: SubmissionRow = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                async move {
                    let created: SubmissionRow = diesel::insert_into(submissions::table)
                        .values(&row)
                        .returning(SubmissionRow::as_returning())
                        .get_result(conn)
                        .await?;
                    append_event(conn, &event, at).await?;
                    Ok(created)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        to_submission(created)
    }

    async fn find_submission(
        &self,
        id: &SubmissionId,
    ) -> Result<Option<Submission>, MissionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<SubmissionRow> = submissions::table
            .find(id.as_uuid())
            .select(SubmissionRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(to_submission).transpose()
    }

    async fn resolve_submission(
        &self,
        verification: &Verification,
        mission: &Mission,
        reward: &MissionReward,
    ) -> Result<ResolvedSubmission, MissionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let level_size = self.level_size;
        let status = SubmissionStatus::from(verification.decision);
        let columns = VerifierColumns::from(&verification.verifier);

        let (row, progress) = conn
            .transaction::<_, TxError<MissionRepositoryError>, _>(|conn| {
                async move {
                    let row: Option<SubmissionRow> = diesel::update(
                        submissions::table
                            .find(verification.submission_id.as_uuid())
                            .filter(submissions::status.eq(SubmissionStatus::Pending.as_str())),
                    )
                    .set((
                        submissions::status.eq(status.as_str()),
                        submissions::verified_at.eq(Some(verification.at)),
                        submissions::verifier_id.eq(columns.verifier_id),
                        submissions::verifier_notes.eq(columns.verifier_notes),
                        submissions::ci_run_id.eq(columns.ci_run_id),
                        submissions::ci_result.eq(columns.ci_result),
                    ))
                    .returning(SubmissionRow::as_returning())
                    .get_result(conn)
                    .await
                    .optional()?;
                    let Some(row) = row else {
                        return Err(TxError::Rejected(MissionRepositoryError::already_resolved()));
                    };
                    let submission = row
                        .clone()
                        .into_submission()
                        .map_err(|err| TxError::Rejected(MissionRepositoryError::query(err)))?;

                    let progress = if status == SubmissionStatus::Approved {
                        Some(disburse(conn, &submission, mission, reward, level_size).await?)
                    } else {
                        None
                    };

                    let event = verified_event(&submission, status, reward);
                    append_event(conn, &event, verification.at).await?;
                    Ok((row, progress))
                }
                .scope_boxed()
            })
            .await
            .map_err(|err| err.into_repository_error(map_diesel_error))?;

        Ok(ResolvedSubmission {
            submission: to_submission(row)?,
            domain_progress: progress
                .map(DomainProgressRow::into_progress)
                .transpose()
                .map_err(MissionRepositoryError::query)?,
        })
    }
}
