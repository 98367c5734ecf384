//! Registration, sign-in, token authentication and profiles.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::ports::{
    AccountService, AuthSession, LoginRequest, PasswordHashError, PasswordHasher,
    ProgressRepository, ProgressRepositoryError, RegisterRequest, TeamRepository,
    TeamRepositoryError, TeamSummary, TokenError, TokenService, UserProfile, UserRepository,
    UserRepositoryError,
};
use crate::domain::{
    AccessibilityPreferences, DisplayName, Email, Error, Login, NewUser, Password, User,
    UserValidationError,
};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

fn map_user_error(error: UserRepositoryError) -> Error {
    match error {
        UserRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserRepositoryError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserRepositoryError::DuplicateLogin => Error::invalid_request("Username already exists"),
        UserRepositoryError::DuplicateEmail => Error::invalid_request("Email already exists"),
    }
}

fn map_progress_error(error: ProgressRepositoryError) -> Error {
    match error {
        ProgressRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("progress repository unavailable: {message}"))
        }
        other => Error::internal(format!("progress repository error: {other}")),
    }
}

fn map_team_error(error: TeamRepositoryError) -> Error {
    match error {
        TeamRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("team repository unavailable: {message}"))
        }
        other => Error::internal(format!("team repository error: {other}")),
    }
}

fn map_hash_error(error: PasswordHashError) -> Error {
    Error::internal(format!("password hashing failed: {error}"))
}

fn map_validation_error(error: UserValidationError) -> Error {
    Error::invalid_request(error.to_string())
}

/// Collaborators of [`AccountServiceImpl`] besides the user repository.
#[derive(Clone)]
pub struct AccountPorts {
    pub hasher: Arc<dyn PasswordHasher>,
    pub tokens: Arc<dyn TokenService>,
    pub progress: Arc<dyn ProgressRepository>,
    pub teams: Arc<dyn TeamRepository>,
}

/// Account service implementing [`AccountService`].
#[derive(Clone)]
pub struct AccountServiceImpl<R> {
    users: Arc<R>,
    ports: AccountPorts,
    clock: Arc<dyn Clock>,
    starting_hearts: u32,
}

impl<R> AccountServiceImpl<R> {
    /// Create the service; new accounts start with `starting_hearts`.
    pub fn new(
        users: Arc<R>,
        ports: AccountPorts,
        clock: Arc<dyn Clock>,
        starting_hearts: u32,
    ) -> Self {
        Self {
            users,
            ports,
            clock,
            starting_hearts,
        }
    }

    fn issue_session(&self, user: User) -> Result<AuthSession, Error> {
        let issued = self
            .ports
            .tokens
            .issue(&user.id, self.clock.utc())
            .map_err(|err| Error::internal(format!("token issuing failed: {err}")))?;
        Ok(AuthSession {
            user,
            token: issued.token,
            expires_at: issued.expires_at,
        })
    }
}

#[async_trait]
impl<R> AccountService for AccountServiceImpl<R>
where
    R: UserRepository,
{
    async fn register(&self, request: RegisterRequest) -> Result<AuthSession, Error> {
        let login = Login::new(request.login).map_err(map_validation_error)?;
        let name = DisplayName::new(request.name).map_err(map_validation_error)?;
        let email = Email::new(request.email).map_err(map_validation_error)?;
        let password = Password::new(request.password).map_err(map_validation_error)?;

        let password_hash = self.ports.hasher.hash(&password).map_err(map_hash_error)?;
        let user = self
            .users
            .create(&NewUser {
                login,
                name,
                email,
                password_hash,
                hearts: self.starting_hearts,
            })
            .await
            .map_err(map_user_error)?;

        info!(user_id = %user.id, "account registered");
        self.issue_session(user)
    }

    async fn login(&self, request: LoginRequest) -> Result<AuthSession, Error> {
        let credentials = self
            .users
            .find_credentials(&request.login)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::unauthorized(INVALID_CREDENTIALS))?;

        let password = Password::presented(request.password);
        let matches = self
            .ports
            .hasher
            .verify(&password, &credentials.password_hash)
            .map_err(map_hash_error)?;
        if !matches {
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        }

        let now = self.clock.utc();
        self.users
            .touch_last_active(&credentials.user.id, now)
            .await
            .map_err(map_user_error)?;

        let mut user = credentials.user;
        user.progression.last_active_date = Some(now);
        self.issue_session(user)
    }

    async fn authenticate(&self, token: &str) -> Result<User, Error> {
        let user_id = self
            .ports
            .tokens
            .verify(token, self.clock.utc())
            .map_err(|err| match err {
                TokenError::Expired => Error::unauthorized("Token expired"),
                TokenError::Invalid { .. } => Error::unauthorized("Invalid token"),
                TokenError::Signing { message } => {
                    Error::internal(format!("token verification failed: {message}"))
                }
            })?;

        self.users
            .find_by_id(&user_id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| {
                warn!(user_id = %user_id, "token references a missing user");
                Error::unauthorized("Invalid token")
            })
    }

    async fn profile(&self, user: &User) -> Result<UserProfile, Error> {
        let domain_progress = self
            .ports
            .progress
            .domain_progress(&user.id)
            .await
            .map_err(map_progress_error)?;
        let badges = self
            .ports
            .progress
            .earned_badges(&user.id)
            .await
            .map_err(map_progress_error)?;
        let active_boosters = self
            .ports
            .progress
            .active_boosters(&user.id, self.clock.utc())
            .await
            .map_err(map_progress_error)?;

        let team = match &user.team_id {
            Some(team_id) => self
                .ports
                .teams
                .find(team_id)
                .await
                .map_err(map_team_error)?
                .map(|team| TeamSummary {
                    id: team.id,
                    name: team.name.to_string(),
                    team_xp: team.team_xp,
                }),
            None => None,
        };

        Ok(UserProfile {
            user: user.clone(),
            team,
            domain_progress,
            badges,
            active_boosters,
        })
    }

    async fn update_accessibility(
        &self,
        user: &User,
        prefs: AccessibilityPreferences,
    ) -> Result<User, Error> {
        self.users
            .update_accessibility(&user.id, &prefs)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::not_found("User not found"))
    }
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
