//! PostgreSQL-backed `LeagueRepository` implementation using Diesel ORM.
//!
//! Weekly XP is `xp_total - weekly_xp_baseline`; settlement moves the
//! baseline up to `xp_total` for every user once the week is snapshotted.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::AsyncConnection as _;
use diesel_async::RunQueryDsl;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use uuid::Uuid;

use crate::domain::ports::{LeagueOverview, LeagueRepository, LeagueRepositoryError};
use crate::domain::{
    EventPayload, League, LeaderboardEntry, LeagueMove, LeagueSnapshot, LeagueStanding, NewEvent,
    SettlementOutcome, TeamAggregate, TeamId, UserId,
};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::diesel_helpers::{
    append_event, collect_rows, decode_label, encode_json, from_db_i32, from_db_i64, to_db_i32,
    violated_unique_constraint,
};
use super::models::{NewLeagueSnapshotRow, UserSummaryRow};
use super::pool::{DbPool, PoolError};
use super::schema::{league_snapshots, teams, user_badges, users};

/// Diesel-backed implementation of the `LeagueRepository` port.
#[derive(Clone)]
pub struct DieselLeagueRepository {
    pool: DbPool,
}

impl DieselLeagueRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> LeagueRepositoryError {
    map_basic_pool_error(error, LeagueRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> LeagueRepositoryError {
    if violated_unique_constraint(&error) == Some("league_snapshots_week_key") {
        return LeagueRepositoryError::query("league week already settled");
    }
    map_basic_diesel_error(
        error,
        LeagueRepositoryError::query,
        LeagueRepositoryError::connection,
    )
}

fn count(value: i64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn move_event(movement: &LeagueMove) -> NewEvent {
    let payload = if movement.is_promotion() {
        EventPayload::LeaguePromoted {
            from: movement.from,
            to: movement.to,
        }
    } else {
        EventPayload::LeagueDemoted {
            from: movement.from,
            to: movement.to,
        }
    };
    NewEvent::for_user(movement.user_id, payload)
}

fn snapshot_row(
    snapshot: &LeagueSnapshot,
    at: DateTime<Utc>,
) -> Result<NewLeagueSnapshotRow, diesel::result::Error> {
    Ok(NewLeagueSnapshotRow {
        id: Uuid::new_v4(),
        league: snapshot.league.as_str(),
        iso_year: snapshot.year,
        iso_week: to_db_i32(snapshot.week),
        user_ranks: encode_json(&snapshot.user_ranks)?,
        promoted_users: snapshot.promoted_users.iter().map(|id| *id.as_uuid()).collect(),
        demoted_users: snapshot.demoted_users.iter().map(|id| *id.as_uuid()).collect(),
        created_at: at,
    })
}

/// Columns read for one leaderboard row, before ranking.
type LeaderboardRow = (
    Uuid,
    String,
    Option<String>,
    Option<Uuid>,
    Option<String>,
    i64,
    i32,
    String,
);

fn leaderboard_entries(
    rows: Vec<LeaderboardRow>,
    badges: &HashMap<Uuid, i64>,
) -> Result<Vec<LeaderboardEntry>, String> {
    rows.into_iter()
        .zip(1_u32..)
        .map(
            |((id, name, avatar, team_id, team_name, xp_total, streak, league), rank)| {
                Ok(LeaderboardEntry {
                    rank,
                    user_id: UserId::from_uuid(id),
                    user_name: name,
                    avatar,
                    team_id: team_id.map(TeamId::from_uuid),
                    team_name,
                    xp_total: from_db_i64(xp_total),
                    streak: from_db_i32(streak),
                    league: decode_label(&league, "league")?,
                    badges_count: count(badges.get(&id).copied().unwrap_or(0)),
                })
            },
        )
        .collect()
}

/// Sum member rows into one aggregate per team, keeping memberless teams.
fn aggregate_teams(rows: Vec<(Uuid, String, Option<i64>, Option<i32>)>) -> Vec<TeamAggregate> {
    let mut teams: BTreeMap<Uuid, TeamAggregate> = BTreeMap::new();
    for (id, name, xp, streak) in rows {
        let entry = teams.entry(id).or_insert_with(|| TeamAggregate {
            team_id: TeamId::from_uuid(id),
            name,
            member_count: 0,
            total_xp: 0,
            streak_sum: 0,
        });
        if let (Some(xp), Some(streak)) = (xp, streak) {
            entry.member_count = entry.member_count.saturating_add(1);
            entry.total_xp = entry.total_xp.saturating_add(from_db_i64(xp));
            entry.streak_sum = entry
                .streak_sum
                .saturating_add(u64::from(from_db_i32(streak)));
        }
    }
    teams.into_values().collect()
}

#[async_trait]
impl LeagueRepository for DieselLeagueRepository {
    async fn overview(&self, top: u32) -> Result<Vec<LeagueOverview>, LeagueRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let limit = i64::from(top);

        let counts: HashMap<String, i64> = users::table
            .group_by(users::league)
            .select((users::league, count_star()))
            .load::<(String, i64)>(&mut conn)
            .await
            .map_err(map_diesel_error)?
            .into_iter()
            .collect();

        let mut overview = Vec::with_capacity(League::ALL.len());
        for league in League::ALL {
            let rows: Vec<UserSummaryRow> = users::table
                .filter(users::league.eq(league.as_str()))
                .order_by((users::xp_total.desc(), users::name))
                .limit(limit)
                .select(UserSummaryRow::as_select())
                .load(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            overview.push(LeagueOverview {
                league,
                member_count: count(counts.get(league.as_str()).copied().unwrap_or(0)),
                top_users: collect_rows(
                    rows.into_iter().map(UserSummaryRow::into_summary),
                    LeagueRepositoryError::query,
                )?,
            });
        }
        Ok(overview)
    }

    async fn standings(&self) -> Result<Vec<LeagueStanding>, LeagueRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<(Uuid, String, String, i64)> = users::table
            .order_by(users::id)
            .select((
                users::id,
                users::name,
                users::league,
                users::xp_total - users::weekly_xp_baseline,
            ))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        collect_rows(
            rows.into_iter().map(|(id, name, league, weekly_xp)| {
                Ok(LeagueStanding {
                    user_id: UserId::from_uuid(id),
                    name,
                    league: decode_label(&league, "league")?,
                    weekly_xp: from_db_i64(weekly_xp),
                })
            }),
            LeagueRepositoryError::query,
        )
    }

    async fn apply_settlement(
        &self,
        outcome: &SettlementOutcome,
        at: DateTime<Utc>,
    ) -> Result<(), LeagueRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                for movement in &outcome.moves {
                    diesel::update(users::table.find(movement.user_id.as_uuid()))
                        .set(users::league.eq(movement.to.as_str()))
                        .execute(conn)
                        .await?;
                    append_event(conn, &move_event(movement), at).await?;
                }

                let rows = outcome
                    .snapshots
                    .iter()
                    .map(|snapshot| snapshot_row(snapshot, at))
                    .collect::<Result<Vec<_>, _>>()?;
                if !rows.is_empty() {
                    diesel::insert_into(league_snapshots::table)
                        .values(&rows)
                        .execute(conn)
                        .await?;
                }

                diesel::update(users::table)
                    .set(users::weekly_xp_baseline.eq(users::xp_total))
                    .execute(conn)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn individual_leaderboard(
        &self,
        league: Option<League>,
        limit: u32,
    ) -> Result<Vec<LeaderboardEntry>, LeagueRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut query = users::table.left_join(teams::table).into_boxed();
        if let Some(league) = league {
            query = query.filter(users::league.eq(league.as_str()));
        }
        let rows: Vec<LeaderboardRow> = query
            .order_by((users::xp_total.desc(), users::name))
            .limit(i64::from(limit))
            .select((
                users::id,
                users::name,
                users::avatar,
                users::team_id,
                teams::name.nullable(),
                users::xp_total,
                users::streak,
                users::league,
            ))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let ids: Vec<Uuid> = rows.iter().map(|row| row.0).collect();
        let badges: HashMap<Uuid, i64> = user_badges::table
            .filter(user_badges::user_id.eq_any(&ids))
            .group_by(user_badges::user_id)
            .select((user_badges::user_id, count_star()))
            .load::<(Uuid, i64)>(&mut conn)
            .await
            .map_err(map_diesel_error)?
            .into_iter()
            .collect();

        leaderboard_entries(rows, &badges).map_err(LeagueRepositoryError::query)
    }

    async fn team_aggregates(&self) -> Result<Vec<TeamAggregate>, LeagueRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<(Uuid, String, Option<i64>, Option<i32>)> = teams::table
            .left_join(users::table)
            .select((
                teams::id,
                teams::name,
                users::xp_total.nullable(),
                users::streak.nullable(),
            ))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(aggregate_teams(rows))
    }
}
