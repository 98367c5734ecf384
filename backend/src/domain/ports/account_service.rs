//! Driving port for registration, sign-in and the caller's profile.
//!
//! Inbound adapters resolve bearer tokens through this port so handlers never
//! touch token or persistence infrastructure directly.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    AccessibilityPreferences, ActiveBooster, DomainProgress, EarnedBadge, Error, TeamId, User,
};

/// Registration payload.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[schema(example = "ada_l")]
    pub login: String,
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    #[schema(example = "ada@example.org")]
    pub email: String,
    pub password: String,
}

/// Sign-in payload.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

/// Authenticated account with a fresh bearer token.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub user: User,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Team the caller belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamSummary {
    pub id: TeamId,
    pub name: String,
    #[serde(rename = "teamXP")]
    pub team_xp: u64,
}

/// Full profile of the caller.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    pub team: Option<TeamSummary>,
    pub domain_progress: Vec<DomainProgress>,
    pub badges: Vec<EarnedBadge>,
    pub active_boosters: Vec<ActiveBooster>,
}

/// Domain use-case port for accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Create an account and sign it in.
    async fn register(&self, request: RegisterRequest) -> Result<AuthSession, Error>;

    /// Check credentials and issue a token.
    async fn login(&self, request: LoginRequest) -> Result<AuthSession, Error>;

    /// Resolve a bearer token to its user.
    async fn authenticate(&self, token: &str) -> Result<User, Error>;

    /// Profile of the caller.
    async fn profile(&self, user: &User) -> Result<UserProfile, Error>;

    /// Replace the caller's accessibility preferences.
    async fn update_accessibility(
        &self,
        user: &User,
        prefs: AccessibilityPreferences,
    ) -> Result<User, Error>;
}
