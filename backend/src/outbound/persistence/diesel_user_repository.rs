//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.
//!
//! Registration relies on the `users_login_key` and `users_email_key` unique
//! constraints; violations are reported as duplicate login or email rather
//! than generic query failures.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{StoredCredentials, UserRepository, UserRepositoryError};
use crate::domain::{AccessibilityPreferences, League, NewUser, RoleSet, User, UserId};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::diesel_helpers::{encode_json, to_db_i32, violated_unique_constraint};
use super::models::{NewUserRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserRepositoryError {
    map_basic_pool_error(error, UserRepositoryError::connection)
}

/// Map Diesel errors, translating the account unique constraints.
fn map_diesel_error(error: diesel::result::Error) -> UserRepositoryError {
    match violated_unique_constraint(&error) {
        Some("users_login_key") => return UserRepositoryError::duplicate_login(),
        Some("users_email_key") => return UserRepositoryError::duplicate_email(),
        _ => {}
    }
    map_basic_diesel_error(
        error,
        UserRepositoryError::query,
        UserRepositoryError::connection,
    )
}

fn to_user(row: UserRow) -> Result<User, UserRepositoryError> {
    row.into_user().map_err(UserRepositoryError::query)
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn create(&self, user: &NewUser) -> Result<User, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let prefs = encode_json(&AccessibilityPreferences::default()).map_err(map_diesel_error)?;
        let row = NewUserRow {
            id: Uuid::new_v4(),
            login: user.login.as_ref(),
            name: user.name.as_ref(),
            email: user.email.as_ref(),
            password_hash: &user.password_hash,
            roles: RoleSet::newcomer().labels(),
            hearts: to_db_i32(user.hearts),
            league: League::Bronze.as_str(),
            accessibility_prefs: prefs,
        };

        let created: UserRow = diesel::insert_into(users::table)
            .values(&row)
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        to_user(created)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserRow> = users::table
            .find(id.as_uuid())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(to_user).transpose()
    }

    async fn find_credentials(
        &self,
        login: &str,
    ) -> Result<Option<StoredCredentials>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<(UserRow, String)> = users::table
            .filter(users::login.eq(login))
            .select((UserRow::as_select(), users::password_hash))
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(|(user, password_hash)| {
            Ok(StoredCredentials {
                user: to_user(user)?,
                password_hash,
            })
        })
        .transpose()
    }

    async fn touch_last_active(
        &self,
        id: &UserId,
        at: DateTime<Utc>,
    ) -> Result<(), UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::update(users::table.find(id.as_uuid()))
            .set(users::last_active_date.eq(Some(at)))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update_accessibility(
        &self,
        id: &UserId,
        prefs: &AccessibilityPreferences,
    ) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let document = encode_json(prefs).map_err(map_diesel_error)?;
        let row: Option<UserRow> = diesel::update(users::table.find(id.as_uuid()))
            .set(users::accessibility_prefs.eq(document))
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(to_user).transpose()
    }
}
