//! Store catalog items and timed boosters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ids::{BoosterId, StoreItemId};
use crate::domain::mission::UnknownLabel;

/// Effect type of a store item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StoreItemKind {
    /// Refill hearts to the maximum.
    RestoreHeart,
    /// Multiply lesson XP while the booster lasts.
    BoostXp,
    /// Shield the streak from the daily reset while the booster lasts.
    FreezeStreak,
    /// Cosmetic or content unlock; the purchase is only recorded.
    ContentUnlock,
}

impl StoreItemKind {
    /// Stable storage label.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RestoreHeart => "RESTORE_HEART",
            Self::BoostXp => "BOOST_XP",
            Self::FreezeStreak => "FREEZE_STREAK",
            Self::ContentUnlock => "CONTENT_UNLOCK",
        }
    }

    /// Booster granted by this item, if it is timed.
    pub const fn booster(self) -> Option<BoosterKind> {
        match self {
            Self::BoostXp => Some(BoosterKind::BoostXp),
            Self::FreezeStreak => Some(BoosterKind::FreezeStreak),
            Self::RestoreHeart | Self::ContentUnlock => None,
        }
    }
}

impl std::str::FromStr for StoreItemKind {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RESTORE_HEART" => Ok(Self::RestoreHeart),
            "BOOST_XP" => Ok(Self::BoostXp),
            "FREEZE_STREAK" => Ok(Self::FreezeStreak),
            "CONTENT_UNLOCK" => Ok(Self::ContentUnlock),
            other => Err(UnknownLabel(other.to_owned())),
        }
    }
}

/// Purchasable item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoreItem {
    pub id: StoreItemId,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: StoreItemKind,
    pub cost_gems: u32,
    pub icon: String,
    pub available: bool,
}

/// Timed booster kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BoosterKind {
    BoostXp,
    FreezeStreak,
}

impl BoosterKind {
    /// Stable storage label, shared with [`StoreItemKind`].
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BoostXp => "BOOST_XP",
            Self::FreezeStreak => "FREEZE_STREAK",
        }
    }
}

impl std::str::FromStr for BoosterKind {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BOOST_XP" => Ok(Self::BoostXp),
            "FREEZE_STREAK" => Ok(Self::FreezeStreak),
            other => Err(UnknownLabel(other.to_owned())),
        }
    }
}

/// Booster granted by a purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActiveBooster {
    pub id: BoosterId,
    #[serde(rename = "type")]
    pub kind: BoosterKind,
    pub expires_at: DateTime<Utc>,
}

impl ActiveBooster {
    /// Whether the booster still applies at `now`.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Whether any booster of `kind` is active at `now`.
pub fn has_active(boosters: &[ActiveBooster], kind: BoosterKind, now: DateTime<Utc>) -> bool {
    boosters
        .iter()
        .any(|booster| booster.kind == kind && booster.is_active_at(now))
}
