//! Badges and automatic criteria evaluation.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ids::BadgeId;
use crate::domain::learning::NirdDomain;
use crate::domain::progress::DomainProgress;

/// Badge scarcity shown in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

/// Unlock rule of a badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BadgeCriteria {
    /// Passed lessons, optionally within one domain.
    LessonsCompleted {
        count: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        domain: Option<NirdDomain>,
    },
    /// Current streak length.
    Streak { days: u32 },
    /// Lifetime XP.
    XpThreshold { xp: u64 },
    /// Approved missions across all domains.
    MissionVerified { count: u32 },
    /// Level reached in one domain.
    DomainMastery { domain: NirdDomain, level: u32 },
}

/// Badge definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub id: BadgeId,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub criteria: BadgeCriteria,
    pub rarity: Rarity,
}

/// Badge held by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EarnedBadge {
    #[serde(flatten)]
    pub badge: Badge,
    pub earned_at: DateTime<Utc>,
}

/// Progress figures the criteria are checked against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BadgeStats {
    pub streak: u32,
    pub xp_total: u64,
    pub domains: HashMap<NirdDomain, DomainProgress>,
}

impl BadgeStats {
    /// Build stats from the user's counters and domain aggregates.
    pub fn new(streak: u32, xp_total: u64, domains: Vec<DomainProgress>) -> Self {
        Self {
            streak,
            xp_total,
            domains: domains.into_iter().map(|d| (d.domain, d)).collect(),
        }
    }

    fn lessons(&self, domain: Option<NirdDomain>) -> u32 {
        match domain {
            Some(domain) => self
                .domains
                .get(&domain)
                .map_or(0, |progress| progress.lessons_completed),
            None => self.domains.values().map(|d| d.lessons_completed).sum(),
        }
    }

    fn missions(&self) -> u32 {
        self.domains.values().map(|d| d.missions_completed).sum()
    }

    fn level(&self, domain: NirdDomain) -> u32 {
        self.domains.get(&domain).map_or(1, |progress| progress.level)
    }
}

impl BadgeCriteria {
    /// Whether `stats` satisfy this rule.
    pub fn is_met(&self, stats: &BadgeStats) -> bool {
        match *self {
            Self::LessonsCompleted { count, domain } => stats.lessons(domain) >= count,
            Self::Streak { days } => stats.streak >= days,
            Self::XpThreshold { xp } => stats.xp_total >= xp,
            Self::MissionVerified { count } => stats.missions() >= count,
            Self::DomainMastery { domain, level } => stats.level(domain) >= level,
        }
    }
}

/// Badges whose criteria are met and which the user does not hold yet.
pub fn newly_earned<'a>(
    catalog: &'a [Badge],
    held: &HashSet<BadgeId>,
    stats: &BadgeStats,
) -> Vec<&'a Badge> {
    catalog
        .iter()
        .filter(|badge| !held.contains(&badge.id) && badge.criteria.is_met(stats))
        .collect()
}
