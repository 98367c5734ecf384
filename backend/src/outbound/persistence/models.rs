//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations. Conversions into domain types
//! return `Err(String)` when a stored value no longer validates.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    ActiveBooster, AttemptId, Badge, BadgeId, BoosterId, DisplayName, DomainProgress, Email,
    InviteCode, Lesson, LessonAttempt, LessonId, Login, Mission, MissionId, Progression, Role,
    RoleSet, StoreItem, StoreItemId, Submission, SubmissionId, Team, TeamId, TeamMember,
    TeamName, Unit, UnitId, User, UserId, UserSummary,
};

use super::diesel_helpers::{decode_json, decode_label, from_db_i16, from_db_i32, from_db_i64};
use super::schema::{
    active_boosters, badges, domain_progress, event_log, league_snapshots, lesson_attempts,
    lessons, missions, purchases, store_items, submissions, teams, units, users,
};

/// Parse stored role labels into a non-empty role set.
pub(crate) fn decode_roles(labels: &[String]) -> Result<RoleSet, String> {
    let roles = labels
        .iter()
        .map(|label| label.parse::<Role>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| err.to_string())?;
    RoleSet::new(roles).map_err(|err| err.to_string())
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Row struct for reading accounts; the password hash is selected separately.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub login: String,
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
    pub roles: Vec<String>,
    pub hearts: i32,
    pub streak: i32,
    pub xp_total: i64,
    pub gems: i32,
    pub league: String,
    pub last_active_date: Option<DateTime<Utc>>,
    pub team_id: Option<Uuid>,
    pub accessibility_prefs: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    pub(crate) fn into_user(self) -> Result<User, String> {
        Ok(User {
            id: UserId::from_uuid(self.id),
            login: Login::new(self.login).map_err(|err| err.to_string())?,
            name: DisplayName::new(self.name).map_err(|err| err.to_string())?,
            email: Email::new(self.email).map_err(|err| err.to_string())?,
            avatar: self.avatar,
            roles: decode_roles(&self.roles)?,
            progression: Progression {
                hearts: from_db_i32(self.hearts),
                streak: from_db_i32(self.streak),
                xp_total: from_db_i64(self.xp_total),
                gems: from_db_i32(self.gems),
                league: decode_label(&self.league, "league")?,
                last_active_date: self.last_active_date,
            },
            team_id: self.team_id.map(TeamId::from_uuid),
            accessibility_prefs: decode_json(self.accessibility_prefs, "accessibility_prefs")?,
            created_at: self.created_at,
        })
    }
}

/// Insertable struct for creating new user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub login: &'a str,
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub roles: Vec<String>,
    pub hearts: i32,
    pub league: &'a str,
    pub accessibility_prefs: serde_json::Value,
}

/// Public columns shown in follower lists and league overviews.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserSummaryRow {
    pub id: Uuid,
    pub login: String,
    pub name: String,
    pub avatar: Option<String>,
    pub xp_total: i64,
    pub league: String,
}

impl UserSummaryRow {
    pub(crate) fn into_summary(self) -> Result<UserSummary, String> {
        Ok(UserSummary {
            id: UserId::from_uuid(self.id),
            login: self.login,
            name: self.name,
            avatar: self.avatar,
            xp_total: from_db_i64(self.xp_total),
            league: decode_label(&self.league, "league")?,
        })
    }
}

/// Columns describing a team member.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct MemberRow {
    pub id: Uuid,
    pub login: String,
    pub name: String,
    pub avatar: Option<String>,
    pub roles: Vec<String>,
    pub xp_total: i64,
    pub streak: i32,
}

impl MemberRow {
    pub(crate) fn into_member(self) -> Result<TeamMember, String> {
        Ok(TeamMember {
            user_id: UserId::from_uuid(self.id),
            login: self.login,
            name: self.name,
            avatar: self.avatar,
            roles: decode_roles(&self.roles)?,
            xp_total: from_db_i64(self.xp_total),
            streak: from_db_i32(self.streak),
        })
    }
}

// ---------------------------------------------------------------------------
// Teams
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = teams)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TeamRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub total_points: i64,
    pub team_xp: i64,
    pub momentum_score: i64,
    pub invite_code: String,
    pub created_at: DateTime<Utc>,
}

impl TeamRow {
    pub(crate) fn into_team(self) -> Result<Team, String> {
        Ok(Team {
            id: TeamId::from_uuid(self.id),
            name: TeamName::new(self.name).map_err(|err| err.to_string())?,
            description: self.description,
            total_points: from_db_i64(self.total_points),
            team_xp: from_db_i64(self.team_xp),
            momentum_score: self.momentum_score,
            invite_code: InviteCode::from_stored(self.invite_code),
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = teams)]
pub(crate) struct NewTeamRow<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub invite_code: &'a str,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Learning path
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = units)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UnitRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub domain: String,
    pub sort_order: i32,
    pub is_checkpoint: bool,
    pub required_unit_id: Option<Uuid>,
}

impl UnitRow {
    pub(crate) fn into_unit(self) -> Result<Unit, String> {
        Ok(Unit {
            id: UnitId::from_uuid(self.id),
            title: self.title,
            description: self.description,
            domain: decode_label(&self.domain, "domain")?,
            order: self.sort_order,
            is_checkpoint: self.is_checkpoint,
            required_unit_id: self.required_unit_id.map(UnitId::from_uuid),
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = lessons)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct LessonRow {
    pub id: Uuid,
    pub unit_id: Uuid,
    pub title: String,
    pub description: String,
    pub difficulty: i16,
    pub xp_reward: i32,
    pub heart_cost: i32,
    pub sort_order: i32,
    pub content: serde_json::Value,
}

impl LessonRow {
    pub(crate) fn into_lesson(self) -> Result<Lesson, String> {
        Ok(Lesson {
            id: LessonId::from_uuid(self.id),
            unit_id: UnitId::from_uuid(self.unit_id),
            title: self.title,
            description: self.description,
            difficulty: from_db_i16(self.difficulty),
            xp_reward: from_db_i32(self.xp_reward),
            heart_cost: from_db_i32(self.heart_cost),
            order: self.sort_order,
            content: decode_json(self.content, "content")?,
        })
    }
}

/// Lesson attempt row, used for both inserts and reads.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = lesson_attempts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct LessonAttemptRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub lesson_id: Uuid,
    pub result: String,
    pub errors_count: i32,
    pub xp_earned: i32,
    pub hearts_used: i32,
    pub answers: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl LessonAttemptRow {
    pub(crate) fn into_attempt(self) -> Result<LessonAttempt, String> {
        Ok(LessonAttempt {
            id: AttemptId::from_uuid(self.id),
            user_id: UserId::from_uuid(self.user_id),
            lesson_id: LessonId::from_uuid(self.lesson_id),
            result: decode_label(&self.result, "result")?,
            errors_count: from_db_i32(self.errors_count),
            xp_earned: from_db_i32(self.xp_earned),
            hearts_used: from_db_i32(self.hearts_used),
            answers: self.answers,
            timestamp: self.created_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = domain_progress)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct DomainProgressRow {
    pub user_id: Uuid,
    pub domain: String,
    pub xp: i64,
    pub level: i32,
    pub lessons_completed: i32,
    pub missions_completed: i32,
}

impl DomainProgressRow {
    pub(crate) fn into_progress(self) -> Result<DomainProgress, String> {
        Ok(DomainProgress {
            domain: decode_label(&self.domain, "domain")?,
            xp: from_db_i64(self.xp),
            level: from_db_i32(self.level).max(1),
            lessons_completed: from_db_i32(self.lessons_completed),
            missions_completed: from_db_i32(self.missions_completed),
        })
    }
}

// ---------------------------------------------------------------------------
// Missions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = missions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct MissionRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub points: i32,
    pub xp_reward: i32,
    pub gems_reward: i32,
    pub requirements: serde_json::Value,
    pub difficulty: i16,
    pub status: String,
}

impl MissionRow {
    pub(crate) fn into_mission(self) -> Result<Mission, String> {
        Ok(Mission {
            id: MissionId::from_uuid(self.id),
            title: self.title,
            description: self.description,
            category: decode_label(&self.category, "category")?,
            points: from_db_i32(self.points),
            xp_reward: from_db_i32(self.xp_reward),
            gems_reward: from_db_i32(self.gems_reward),
            requirements: decode_json(self.requirements, "requirements")?,
            difficulty: from_db_i16(self.difficulty),
            status: decode_label(&self.status, "status")?,
        })
    }
}

/// Submission row, used for both inserts and reads.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = submissions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SubmissionRow {
    pub id: Uuid,
    pub team_id: Uuid,
    pub mission_id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub repository_url: Option<String>,
    pub notes: Option<String>,
    pub ci_run_id: Option<String>,
    pub ci_result: Option<serde_json::Value>,
    pub verifier_id: Option<Uuid>,
    pub verifier_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
}

impl SubmissionRow {
    pub(crate) fn into_submission(self) -> Result<Submission, String> {
        Ok(Submission {
            id: SubmissionId::from_uuid(self.id),
            team_id: TeamId::from_uuid(self.team_id),
            mission_id: MissionId::from_uuid(self.mission_id),
            user_id: UserId::from_uuid(self.user_id),
            status: decode_label(&self.status, "status")?,
            repository_url: self.repository_url,
            notes: self.notes,
            ci_run_id: self.ci_run_id,
            ci_result: self.ci_result,
            verifier_id: self.verifier_id.map(UserId::from_uuid),
            verifier_notes: self.verifier_notes,
            timestamp: self.created_at,
            verified_at: self.verified_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Badges and the store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = badges)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct BadgeRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub criteria: serde_json::Value,
    pub rarity: String,
}

impl BadgeRow {
    pub(crate) fn into_badge(self) -> Result<Badge, String> {
        Ok(Badge {
            id: BadgeId::from_uuid(self.id),
            title: self.title,
            description: self.description,
            icon: self.icon,
            criteria: decode_json(self.criteria, "criteria")?,
            rarity: decode_label(&self.rarity, "rarity")?,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = store_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct StoreItemRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub item_type: String,
    pub cost_gems: i32,
    pub icon: String,
    pub available: bool,
}

impl StoreItemRow {
    pub(crate) fn into_item(self) -> Result<StoreItem, String> {
        Ok(StoreItem {
            id: StoreItemId::from_uuid(self.id),
            title: self.title,
            description: self.description,
            kind: decode_label(&self.item_type, "item_type")?,
            cost_gems: from_db_i32(self.cost_gems),
            icon: self.icon,
            available: self.available,
        })
    }
}

/// Booster row, used for both inserts and reads.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = active_boosters)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ActiveBoosterRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub booster_type: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl ActiveBoosterRow {
    pub(crate) fn into_booster(self) -> Result<ActiveBooster, String> {
        Ok(ActiveBooster {
            id: BoosterId::from_uuid(self.id),
            kind: decode_label(&self.booster_type, "booster_type")?,
            expires_at: self.expires_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = purchases)]
pub(crate) struct NewPurchaseRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub item_id: Uuid,
    pub cost_gems: i32,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Leagues and the event log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = league_snapshots)]
pub(crate) struct NewLeagueSnapshotRow {
    pub id: Uuid,
    pub league: &'static str,
    pub iso_year: i32,
    pub iso_week: i32,
    pub user_ranks: serde_json::Value,
    pub promoted_users: Vec<Uuid>,
    pub demoted_users: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = event_log)]
pub(crate) struct NewEventRow {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
    pub event_type: &'static str,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
