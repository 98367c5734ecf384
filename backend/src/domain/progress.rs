//! Per-domain progress aggregates and the progress overview.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::badge::EarnedBadge;
use crate::domain::learning::NirdDomain;
use crate::domain::league::League;
use crate::domain::store::ActiveBooster;

/// Level reached with `xp` points when every level spans `level_size` XP.
///
/// Levels start at 1.
///
/// # Examples
/// ```
/// use podium::domain::progress::level_for_xp;
///
/// assert_eq!(level_for_xp(0, 100), 1);
/// assert_eq!(level_for_xp(250, 100), 3);
/// ```
pub fn level_for_xp(xp: u64, level_size: u64) -> u32 {
    let completed = xp.checked_div(level_size).unwrap_or(0);
    u32::try_from(completed).map_or(u32::MAX, |levels| levels.saturating_add(1))
}

/// Aggregate progress of one user in one domain.
///
/// ## Invariants
/// - Counters only grow in normal flow.
/// - The sum of `xp` across domains never exceeds the user's `xp_total`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DomainProgress {
    pub domain: NirdDomain,
    pub xp: u64,
    pub level: u32,
    pub lessons_completed: u32,
    pub missions_completed: u32,
}

/// Increment applied to a domain aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainDelta {
    pub domain: NirdDomain,
    pub xp: u32,
    pub lessons: u32,
    pub missions: u32,
}

impl DomainDelta {
    /// Delta for a passed lesson.
    pub fn lesson(domain: NirdDomain, xp: u32) -> Self {
        Self {
            domain,
            xp,
            lessons: 1,
            missions: 0,
        }
    }

    /// Delta for an approved mission.
    pub fn mission(domain: NirdDomain, xp: u32) -> Self {
        Self {
            domain,
            xp,
            lessons: 0,
            missions: 1,
        }
    }
}

/// Level reached before `delta` was applied to `after`, used to detect
/// level-ups.
pub fn previous_level(after: &DomainProgress, delta: &DomainDelta, level_size: u64) -> u32 {
    level_for_xp(after.xp.saturating_sub(u64::from(delta.xp)), level_size)
}

/// New level when applying `delta` crossed a level boundary.
pub fn level_reached(after: &DomainProgress, delta: &DomainDelta, level_size: u64) -> Option<u32> {
    let level = level_for_xp(after.xp, level_size);
    (level > previous_level(after, delta, level_size)).then_some(level)
}

/// Full progress overview of the authenticated user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressOverview {
    pub hearts: u32,
    pub max_hearts: u32,
    pub streak: u32,
    pub xp_total: u64,
    pub gems: u32,
    pub league: League,
    /// Overall level derived from `xp_total`.
    pub level: u32,
    pub domains: Vec<DomainProgress>,
    pub badges: Vec<EarnedBadge>,
    pub active_boosters: Vec<ActiveBooster>,
}
