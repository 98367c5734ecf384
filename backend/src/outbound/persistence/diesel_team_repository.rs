//! PostgreSQL-backed `TeamRepository` implementation using Diesel ORM.
//!
//! Membership changes are guarded by `team_id IS NULL` on the user row, so a
//! player can never end up in two teams even under concurrent joins.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{TeamRepository, TeamRepositoryError};
use crate::domain::team::RECENT_SUBMISSIONS;
use crate::domain::{
    EventPayload, InviteCode, NewEvent, NewTeam, RoleSet, Team, TeamDetails, TeamId, TeamListing,
    TeamMember, UserId,
};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::diesel_helpers::{TxError, append_event, collect_rows, violated_unique_constraint};
use super::models::{MemberRow, NewTeamRow, SubmissionRow, TeamRow};
use super::pool::{DbPool, PoolError};
use super::schema::{submissions, teams, users};

/// Diesel-backed implementation of the `TeamRepository` port.
#[derive(Clone)]
pub struct DieselTeamRepository {
    pool: DbPool,
}

impl DieselTeamRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> TeamRepositoryError {
    map_basic_pool_error(error, TeamRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> TeamRepositoryError {
    match violated_unique_constraint(&error) {
        Some("teams_name_key") => return TeamRepositoryError::duplicate_name(),
        Some("teams_invite_code_key") => return TeamRepositoryError::duplicate_invite_code(),
        _ => {}
    }
    map_basic_diesel_error(
        error,
        TeamRepositoryError::query,
        TeamRepositoryError::connection,
    )
}

fn to_team(row: TeamRow) -> Result<Team, TeamRepositoryError> {
    row.into_team().map_err(TeamRepositoryError::query)
}

fn joined_event(user: UserId, team: &Team, created: bool) -> NewEvent {
    NewEvent::for_user(
        user,
        EventPayload::TeamJoined {
            team_id: team.id,
            team_name: team.name.to_string(),
            created,
        },
    )
    .with_team(team.id)
}

/// Attach `user` to `team` unless they already belong to one.
async fn claim_membership(
    conn: &mut AsyncPgConnection,
    team: &TeamId,
    user: &UserId,
    roles: Option<&RoleSet>,
) -> Result<(), TxError<TeamRepositoryError>> {
    let target = users::table
        .find(user.as_uuid())
        .filter(users::team_id.is_null());
    let updated = match roles {
        Some(roles) => {
            diesel::update(target)
                .set((
                    users::team_id.eq(Some(*team.as_uuid())),
                    users::roles.eq(roles.labels()),
                ))
                .execute(conn)
                .await?
        }
        None => {
            diesel::update(target)
                .set(users::team_id.eq(Some(*team.as_uuid())))
                .execute(conn)
                .await?
        }
    };
    if updated > 0 {
        return Ok(());
    }

    let exists: bool = diesel::select(diesel::dsl::exists(users::table.find(user.as_uuid())))
        .get_result(conn)
        .await?;
    Err(TxError::Rejected(if exists {
        TeamRepositoryError::already_in_team()
    } else {
        TeamRepositoryError::query("user not found")
    }))
}

#[async_trait]
impl TeamRepository for DieselTeamRepository {
    async fn list(&self) -> Result<Vec<TeamListing>, TeamRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<TeamRow> = teams::table
            .order_by((teams::team_xp.desc(), teams::name))
            .select(TeamRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let counts: HashMap<Option<Uuid>, i64> = users::table
            .filter(users::team_id.is_not_null())
            .group_by(users::team_id)
            .select((users::team_id, count_star()))
            .load::<(Option<Uuid>, i64)>(&mut conn)
            .await
            .map_err(map_diesel_error)?
            .into_iter()
            .collect();

        rows.into_iter()
            .map(|row| {
                let members = counts.get(&Some(row.id)).copied().unwrap_or(0);
                Ok(TeamListing {
                    team: to_team(row)?,
                    member_count: u32::try_from(members).unwrap_or(u32::MAX),
                })
            })
            .collect()
    }

    async fn create(&self, team: &NewTeam, at: DateTime<Utc>) -> Result<Team, TeamRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let team_id = TeamId::random();
        let row = NewTeamRow {
            id: *team_id.as_uuid(),
            name: team.name.as_ref(),
            description: team.description.as_deref(),
            invite_code: team.invite_code.as_ref(),
            created_at: at,
        };

        let created: TeamRow = conn
            .transaction::<_, TxError<TeamRepositoryError>, _>(|conn| {
                async move {
                    let created: TeamRow = diesel::insert_into(teams::table)
                        .values(&row)
                        .returning(TeamRow::as_returning())
                        .get_result(conn)
                        .await?;
                    claim_membership(conn, &team_id, &team.captain_id, Some(&team.captain_roles))
                        .await?;
                    let domain_team = created
                        .clone()
                        .into_team()
                        .map_err(|err| TxError::Rejected(TeamRepositoryError::query(err)))?;
                    append_event(conn, &joined_event(team.captain_id, &domain_team, true), at)
                        .await?;
                    Ok(created)
                }
                .scope_boxed()
            })
            .await
            .map_err(|err| err.into_repository_error(map_diesel_error))?;
        to_team(created)
    }

    async fn find(&self, id: &TeamId) -> Result<Option<Team>, TeamRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<TeamRow> = teams::table
            .find(id.as_uuid())
            .select(TeamRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(to_team).transpose()
    }

    async fn find_details(&self, id: &TeamId) -> Result<Option<TeamDetails>, TeamRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<TeamRow> = teams::table
            .find(id.as_uuid())
            .select(TeamRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        let Some(row) = row else {
            return Ok(None);
        };

        let members: Vec<MemberRow> = users::table
            .filter(users::team_id.eq(id.as_uuid()))
            .order_by((users::xp_total.desc(), users::name))
            .select(MemberRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let recent: Vec<SubmissionRow> = submissions::table
            .filter(submissions::team_id.eq(id.as_uuid()))
            .order_by(submissions::created_at.desc())
            .limit(RECENT_SUBMISSIONS)
            .select(SubmissionRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(Some(TeamDetails {
            team: to_team(row)?,
            members: collect_rows(
                members.into_iter().map(MemberRow::into_member),
                TeamRepositoryError::query,
            )?,
            recent_submissions: collect_rows(
                recent.into_iter().map(SubmissionRow::into_submission),
                TeamRepositoryError::query,
            )?,
        }))
    }

    async fn find_by_invite_code(
        &self,
        code: &InviteCode,
    ) -> Result<Option<Team>, TeamRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<TeamRow> = teams::table
            .filter(teams::invite_code.eq(code.as_ref()))
            .select(TeamRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(to_team).transpose()
    }

    async fn join(
        &self,
        team: &Team,
        user: &UserId,
        at: DateTime<Utc>,
    ) -> Result<(), TeamRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let event = joined_event(*user, team, false);

        conn.transaction::<_, TxError<TeamRepositoryError>, _>(|conn| {
            async move {
                claim_membership(conn, &team.id, user, None).await?;
                append_event(conn, &event, at).await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| err.into_repository_error(map_diesel_error))
    }

    async fn member(
        &self,
        team: &TeamId,
        user: &UserId,
    ) -> Result<Option<TeamMember>, TeamRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<MemberRow> = users::table
            .find(user.as_uuid())
            .filter(users::team_id.eq(team.as_uuid()))
            .select(MemberRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(|row| row.into_member().map_err(TeamRepositoryError::query))
            .transpose()
    }

    async fn set_roles(
        &self,
        team: &TeamId,
        user: &UserId,
        roles: &RoleSet,
    ) -> Result<TeamMember, TeamRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: MemberRow = diesel::update(
            users::table
                .find(user.as_uuid())
                .filter(users::team_id.eq(team.as_uuid())),
        )
        .set(users::roles.eq(roles.labels()))
        .returning(MemberRow::as_returning())
        .get_result(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        row.into_member().map_err(TeamRepositoryError::query)
    }
}
