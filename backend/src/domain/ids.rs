//! Strongly typed UUID identifiers for domain entities.
//!
//! Every aggregate gets its own identifier type so a lesson id can never be
//! passed where a mission id is expected.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Error returned when an identifier string is not a UUID.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} id must be a valid UUID")]
pub struct IdParseError {
    /// Entity the identifier belongs to, for example `"lesson"`.
    pub kind: &'static str,
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
            ToSchema,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Parse an identifier from its textual UUID form.
            pub fn new(raw: impl AsRef<str>) -> Result<Self, IdParseError> {
                let raw = raw.as_ref();
                if raw.trim() != raw {
                    return Err(IdParseError { kind: $kind });
                }
                Uuid::parse_str(raw)
                    .map(Self)
                    .map_err(|_| IdParseError { kind: $kind })
            }

            /// Generate a fresh random identifier.
            #[must_use]
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Access the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }
    };
}

define_id!(
    /// Stable user identifier.
    UserId,
    "user"
);
define_id!(
    /// Team identifier.
    TeamId,
    "team"
);
define_id!(
    /// Learning unit identifier.
    UnitId,
    "unit"
);
define_id!(
    /// Lesson identifier.
    LessonId,
    "lesson"
);
define_id!(
    /// Lesson attempt identifier.
    AttemptId,
    "attempt"
);
define_id!(
    /// Mission identifier.
    MissionId,
    "mission"
);
define_id!(
    /// Mission submission identifier.
    SubmissionId,
    "submission"
);
define_id!(
    /// Badge identifier.
    BadgeId,
    "badge"
);
define_id!(
    /// Store item identifier.
    StoreItemId,
    "store item"
);
define_id!(
    /// Active booster identifier.
    BoosterId,
    "booster"
);
