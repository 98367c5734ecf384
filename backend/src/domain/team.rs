//! Teams, invite codes and membership.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ids::{TeamId, UserId};
use crate::domain::mission::Submission;
use crate::domain::user::{Role, RoleSet};

/// Maximum team name length.
pub const TEAM_NAME_MAX: usize = 64;
/// Length of generated invite codes.
pub const INVITE_CODE_LEN: usize = 8;

// Excludes 0/O and 1/I.
const INVITE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Validation errors for team input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TeamValidationError {
    #[error("team name must not be empty")]
    EmptyName,
    #[error("team name must be at most {max} characters")]
    NameTooLong { max: usize },
    #[error("invite code must not be empty")]
    EmptyInviteCode,
}

/// Unique team name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "Green Coders")]
pub struct TeamName(String);

impl TeamName {
    /// Validate and construct a [`TeamName`].
    pub fn new(raw: impl Into<String>) -> Result<Self, TeamValidationError> {
        let raw = raw.into().trim().to_owned();
        if raw.is_empty() {
            return Err(TeamValidationError::EmptyName);
        }
        if raw.chars().count() > TEAM_NAME_MAX {
            return Err(TeamValidationError::NameTooLong {
                max: TEAM_NAME_MAX,
            });
        }
        Ok(Self(raw))
    }
}

impl AsRef<str> for TeamName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TeamName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<TeamName> for String {
    fn from(value: TeamName) -> Self {
        value.0
    }
}

impl TryFrom<String> for TeamName {
    type Error = TeamValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Token shared with prospective members.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String, example = "K7QX2MPA")]
pub struct InviteCode(String);

impl InviteCode {
    /// Generate a random code from an unambiguous alphabet.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let code = (0..INVITE_CODE_LEN)
            .map(|_| {
                let index = rng.gen_range(0..INVITE_ALPHABET.len());
                char::from(INVITE_ALPHABET[index])
            })
            .collect();
        Self(code)
    }

    /// Normalise a code typed by a user.
    pub fn parse(raw: &str) -> Result<Self, TeamValidationError> {
        let code = raw.trim().to_uppercase();
        if code.is_empty() {
            return Err(TeamValidationError::EmptyInviteCode);
        }
        Ok(Self(code))
    }

    /// Wrap a code loaded from storage.
    pub fn from_stored(raw: String) -> Self {
        Self(raw)
    }
}

impl AsRef<str> for InviteCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Team aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: TeamId,
    pub name: TeamName,
    pub description: Option<String>,
    pub total_points: u64,
    #[serde(rename = "teamXP")]
    pub team_xp: u64,
    pub momentum_score: i64,
    pub invite_code: InviteCode,
    pub created_at: DateTime<Utc>,
}

/// Team plus its member count, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamListing {
    #[serde(flatten)]
    pub team: Team,
    pub member_count: u32,
}

/// Member view inside a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub user_id: UserId,
    pub login: String,
    pub name: String,
    pub avatar: Option<String>,
    #[schema(value_type = Vec<Role>)]
    pub roles: RoleSet,
    pub xp_total: u64,
    pub streak: u32,
}

impl TeamMember {
    /// Whether the member captains the team.
    pub fn is_captain(&self) -> bool {
        self.roles.contains(Role::Captain)
    }
}

/// Team with members and its latest submissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamDetails {
    #[serde(flatten)]
    pub team: Team,
    pub members: Vec<TeamMember>,
    pub recent_submissions: Vec<Submission>,
}

/// Number of submissions shown on a team page.
pub const RECENT_SUBMISSIONS: i64 = 10;

/// New team request after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTeam {
    pub name: TeamName,
    pub description: Option<String>,
    pub invite_code: InviteCode,
    pub captain_id: UserId,
    pub captain_roles: RoleSet,
}
