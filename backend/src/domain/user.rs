//! User identity, capability roles and progression state.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use zeroize::Zeroizing;

use crate::domain::ids::{TeamId, UserId};
use crate::domain::league::League;

/// Validation errors raised while building user credentials and profile
/// fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    #[error("login must be between {min} and {max} characters")]
    LoginLength { min: usize, max: usize },
    #[error("login may only contain letters, numbers, dots, dashes or underscores")]
    LoginInvalidCharacters,
    #[error("email address is not valid")]
    InvalidEmail,
    #[error("name must not be empty")]
    EmptyName,
    #[error("name must be at most {max} characters")]
    NameTooLong { max: usize },
    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },
    #[error("at least one role is required")]
    EmptyRoles,
    #[error("unknown role: {0}")]
    UnknownRole(String),
}

/// Minimum login length.
pub const LOGIN_MIN: usize = 3;
/// Maximum login length.
pub const LOGIN_MAX: usize = 32;
/// Maximum length of a display name.
pub const NAME_MAX: usize = 64;
/// Minimum password length.
pub const PASSWORD_MIN: usize = 8;

static LOGIN_RE: OnceLock<Regex> = OnceLock::new();
static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn login_regex() -> &'static Regex {
    LOGIN_RE.get_or_init(|| {
        Regex::new("^[A-Za-z0-9_.-]+$")
            .unwrap_or_else(|error| panic!("login regex failed to compile: {error}"))
    })
}

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Unique login handle used to sign in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "ada_l")]
pub struct Login(String);

impl Login {
    /// Validate and construct a [`Login`].
    pub fn new(raw: impl Into<String>) -> Result<Self, UserValidationError> {
        let raw = raw.into();
        let length = raw.chars().count();
        if !(LOGIN_MIN..=LOGIN_MAX).contains(&length) {
            return Err(UserValidationError::LoginLength {
                min: LOGIN_MIN,
                max: LOGIN_MAX,
            });
        }
        if !login_regex().is_match(&raw) {
            return Err(UserValidationError::LoginInvalidCharacters);
        }
        Ok(Self(raw))
    }
}

/// Email address, normalised to lower case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "ada@example.org")]
pub struct Email(String);

impl Email {
    /// Validate and construct an [`Email`].
    pub fn new(raw: impl Into<String>) -> Result<Self, UserValidationError> {
        let raw = raw.into().trim().to_lowercase();
        if !email_regex().is_match(&raw) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(raw))
    }
}

/// Name shown to other players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "Ada Lovelace")]
pub struct DisplayName(String);

impl DisplayName {
    /// Validate and construct a [`DisplayName`].
    pub fn new(raw: impl Into<String>) -> Result<Self, UserValidationError> {
        let raw = raw.into().trim().to_owned();
        if raw.is_empty() {
            return Err(UserValidationError::EmptyName);
        }
        if raw.chars().count() > NAME_MAX {
            return Err(UserValidationError::NameTooLong { max: NAME_MAX });
        }
        Ok(Self(raw))
    }
}

macro_rules! string_newtype_impls {
    ($($name:ident),+) => {
        $(
            impl AsRef<str> for $name {
                fn as_ref(&self) -> &str {
                    self.0.as_str()
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }

            impl From<$name> for String {
                fn from(value: $name) -> Self {
                    value.0
                }
            }

            impl TryFrom<String> for $name {
                type Error = UserValidationError;

                fn try_from(value: String) -> Result<Self, Self::Error> {
                    Self::new(value)
                }
            }
        )+
    };
}

string_newtype_impls!(Login, Email, DisplayName);

/// Plain-text password held only long enough to hash or verify it.
///
/// The buffer is wiped on drop and never printed.
#[derive(Clone)]
pub struct Password(Zeroizing<String>);

impl Password {
    /// Validate a password chosen at registration.
    pub fn new(raw: impl Into<String>) -> Result<Self, UserValidationError> {
        let raw = Zeroizing::new(raw.into());
        if raw.chars().count() < PASSWORD_MIN {
            return Err(UserValidationError::PasswordTooShort { min: PASSWORD_MIN });
        }
        Ok(Self(raw))
    }

    /// Wrap a password presented at login without applying length rules.
    pub fn presented(raw: impl Into<String>) -> Self {
        Self(Zeroizing::new(raw.into()))
    }

    /// Borrow the secret for hashing.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(**redacted**)")
    }
}

/// Capability tag held by a user.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Captain,
    Developer,
    Verifier,
    Pedagogue,
}

impl Role {
    /// Stable storage label.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Captain => "CAPTAIN",
            Self::Developer => "DEVELOPER",
            Self::Verifier => "VERIFIER",
            Self::Pedagogue => "PEDAGOGUE",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CAPTAIN" => Ok(Self::Captain),
            "DEVELOPER" => Ok(Self::Developer),
            "VERIFIER" => Ok(Self::Verifier),
            "PEDAGOGUE" => Ok(Self::Pedagogue),
            other => Err(UserValidationError::UnknownRole(other.to_owned())),
        }
    }
}

/// Non-empty set of roles held by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Role>", into = "Vec<Role>")]
pub struct RoleSet(BTreeSet<Role>);

impl RoleSet {
    /// Build a role set, rejecting an empty collection.
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Result<Self, UserValidationError> {
        let roles: BTreeSet<Role> = roles.into_iter().collect();
        if roles.is_empty() {
            return Err(UserValidationError::EmptyRoles);
        }
        Ok(Self(roles))
    }

    /// Roles granted to a freshly registered account.
    #[must_use]
    pub fn newcomer() -> Self {
        Self(BTreeSet::from([Role::Developer]))
    }

    /// Whether the set contains `role`.
    #[must_use]
    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    /// Whether the holder may decide mission submissions and trigger league
    /// settlement.
    #[must_use]
    pub fn can_verify(&self) -> bool {
        self.contains(Role::Verifier) || self.contains(Role::Captain)
    }

    /// Copy of this set with `role` added.
    #[must_use]
    pub fn with(&self, role: Role) -> Self {
        let mut roles = self.0.clone();
        roles.insert(role);
        Self(roles)
    }

    /// Iterate roles in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }

    /// Storage labels in a stable order.
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.iter().map(|role| role.as_str().to_owned()).collect()
    }
}

impl From<RoleSet> for Vec<Role> {
    fn from(value: RoleSet) -> Self {
        value.0.into_iter().collect()
    }
}

impl TryFrom<Vec<Role>> for RoleSet {
    type Error = UserValidationError;

    fn try_from(value: Vec<Role>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Preferred base font size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
}

/// Display preferences stored with the account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct AccessibilityPreferences {
    pub dyslexia_font: bool,
    pub high_contrast: bool,
    pub reduced_motion: bool,
    pub screen_reader: bool,
    pub font_size: FontSize,
}

/// Mutable progression counters of a user.
///
/// ## Invariants
/// - `hearts` stays within `0..=max_hearts`; the store enforces the bound on
///   every write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Progression {
    pub hearts: u32,
    pub streak: u32,
    pub xp_total: u64,
    pub gems: u32,
    pub league: League,
    pub last_active_date: Option<DateTime<Utc>>,
}

impl Progression {
    /// Starting counters for a new account.
    #[must_use]
    pub fn starting(max_hearts: u32) -> Self {
        Self {
            hearts: max_hearts,
            streak: 0,
            xp_total: 0,
            gems: 0,
            league: League::Bronze,
            last_active_date: None,
        }
    }
}

/// Registered player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub login: Login,
    pub name: DisplayName,
    pub email: Email,
    pub avatar: Option<String>,
    #[schema(value_type = Vec<Role>)]
    pub roles: RoleSet,
    #[serde(flatten)]
    pub progression: Progression,
    pub team_id: Option<TeamId>,
    pub accessibility_prefs: AccessibilityPreferences,
    pub created_at: DateTime<Utc>,
}

/// Validated registration input.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub login: Login,
    pub name: DisplayName,
    pub email: Email,
    pub password_hash: String,
    pub hearts: u32,
}

/// Short public view of a user used in lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub login: String,
    pub name: String,
    pub avatar: Option<String>,
    pub xp_total: u64,
    pub league: League,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            login: user.login.to_string(),
            name: user.name.to_string(),
            avatar: user.avatar.clone(),
            xp_total: user.progression.xp_total,
            league: user.progression.league,
        }
    }
}
