//! Port abstraction for account persistence adapters and their errors.
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{AccessibilityPreferences, NewUser, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// The login is already taken.
        DuplicateLogin => "login already exists",
        /// The email address is already registered.
        DuplicateEmail => "email already exists",
    }
}

/// Account row together with its stored password hash.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredCredentials {
    pub user: User,
    pub password_hash: String,
}

/// Port for reading and writing user accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account with starting progression.
    async fn create(&self, user: &NewUser) -> Result<User, UserRepositoryError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError>;

    /// Fetch a user and password hash by login.
    async fn find_credentials(
        &self,
        login: &str,
    ) -> Result<Option<StoredCredentials>, UserRepositoryError>;

    /// Record a sign-in.
    async fn touch_last_active(
        &self,
        id: &UserId,
        at: DateTime<Utc>,
    ) -> Result<(), UserRepositoryError>;

    /// Replace accessibility preferences, returning the updated user.
    async fn update_accessibility(
        &self,
        id: &UserId,
        prefs: &AccessibilityPreferences,
    ) -> Result<Option<User>, UserRepositoryError>;
}
