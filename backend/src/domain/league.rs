//! League tiers and the weekly promotion/demotion settlement.
//!
//! Users keep their league until the weekly settlement runs. Within every
//! league the standings are ranked by XP earned since the previous
//! settlement; the top share moves up one tier and the bottom share moves
//! down one tier. Bronze has no lower tier and Resilience no higher one, so
//! those moves are skipped. Each run produces one [`LeagueSnapshot`] per
//! populated league for historical display.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ids::UserId;

/// Ordered competitive tier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum League {
    Bronze,
    Silver,
    Gold,
    Platinum,
    Resilience,
}

/// Error raised when a stored league label is unknown.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown league: {0}")]
pub struct UnknownLeague(pub String);

impl League {
    /// Every tier, lowest first.
    pub const ALL: [League; 5] = [
        League::Bronze,
        League::Silver,
        League::Gold,
        League::Platinum,
        League::Resilience,
    ];

    /// Stable storage label.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bronze => "BRONZE",
            Self::Silver => "SILVER",
            Self::Gold => "GOLD",
            Self::Platinum => "PLATINUM",
            Self::Resilience => "RESILIENCE",
        }
    }

    /// The next tier up, if any.
    pub const fn promoted(self) -> Option<Self> {
        match self {
            Self::Bronze => Some(Self::Silver),
            Self::Silver => Some(Self::Gold),
            Self::Gold => Some(Self::Platinum),
            Self::Platinum => Some(Self::Resilience),
            Self::Resilience => None,
        }
    }

    /// The next tier down, if any.
    pub const fn demoted(self) -> Option<Self> {
        match self {
            Self::Bronze => None,
            Self::Silver => Some(Self::Bronze),
            Self::Gold => Some(Self::Silver),
            Self::Platinum => Some(Self::Gold),
            Self::Resilience => Some(Self::Platinum),
        }
    }

    /// Tier shown for a team on the team leaderboard.
    ///
    /// Teams share the user tier labels. Resilience is only reachable
    /// through weekly settlement, so team XP tops out at Platinum.
    ///
    /// # Examples
    /// ```
    /// use podium::domain::League;
    ///
    /// assert_eq!(League::for_team_xp(10_000), League::Bronze);
    /// assert_eq!(League::for_team_xp(10_001), League::Silver);
    /// assert_eq!(League::for_team_xp(60_000), League::Platinum);
    /// ```
    pub const fn for_team_xp(team_xp: u64) -> Self {
        if team_xp > 50_000 {
            Self::Platinum
        } else if team_xp > 25_000 {
            Self::Gold
        } else if team_xp > 10_000 {
            Self::Silver
        } else {
            Self::Bronze
        }
    }
}

impl std::fmt::Display for League {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for League {
    type Err = UnknownLeague;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|league| league.as_str() == s)
            .ok_or_else(|| UnknownLeague(s.to_owned()))
    }
}

/// Weekly standing of one user, input to the settlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeagueStanding {
    pub user_id: UserId,
    pub name: String,
    pub league: League,
    /// XP earned since the previous settlement.
    pub weekly_xp: u64,
}

/// Movement of a user in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trend {
    Up,
    Down,
    Same,
}

/// One ranked row of a league snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeagueRank {
    pub user_id: UserId,
    pub user_name: String,
    pub xp: u64,
    pub rank: u32,
    pub trend: Trend,
}

/// Historical ranking of one league for one ISO week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeagueSnapshot {
    pub league: League,
    pub year: i32,
    pub week: u32,
    pub user_ranks: Vec<LeagueRank>,
    pub promoted_users: Vec<UserId>,
    pub demoted_users: Vec<UserId>,
}

/// A single tier change decided by the settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeagueMove {
    pub user_id: UserId,
    pub from: League,
    pub to: League,
}

impl LeagueMove {
    /// Whether the move goes up a tier.
    pub fn is_promotion(&self) -> bool {
        self.to > self.from
    }
}

/// Result of one weekly settlement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettlementOutcome {
    pub moves: Vec<LeagueMove>,
    pub snapshots: Vec<LeagueSnapshot>,
}

impl SettlementOutcome {
    /// Number of promotions.
    pub fn promoted_count(&self) -> usize {
        self.moves.iter().filter(|m| m.is_promotion()).count()
    }

    /// Number of demotions.
    pub fn demoted_count(&self) -> usize {
        self.moves.len() - self.promoted_count()
    }
}

/// Number of users promoted and demoted in a league of `members` users.
///
/// The share is rounded down and capped at half of the league so nobody is
/// both promoted and demoted.
pub fn movers_per_league(members: usize, percent: u8) -> usize {
    let share = members * usize::from(percent.min(100)) / 100;
    share.min(members / 2)
}

/// Decide promotions and demotions for every league.
///
/// Ties in weekly XP are broken by user id so repeated runs over the same
/// standings give the same result. Users who earned no XP this week are
/// never promoted. A user in the bottom share is only demoted when their
/// weekly XP is strictly below the lowest user who stays, so a tie at the
/// cutoff keeps everyone involved.
pub fn settle_leagues(
    standings: &[LeagueStanding],
    percent: u8,
    now: DateTime<Utc>,
) -> SettlementOutcome {
    let iso = now.iso_week();
    let mut outcome = SettlementOutcome::default();

    for league in League::ALL {
        let mut members: Vec<&LeagueStanding> =
            standings.iter().filter(|s| s.league == league).collect();
        if members.is_empty() {
            continue;
        }
        members.sort_by(|a, b| {
            b.weekly_xp
                .cmp(&a.weekly_xp)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });

        let movers = movers_per_league(members.len(), percent);
        let demote_from = members.len() - movers;
        let lowest_kept_xp = demote_from
            .checked_sub(1)
            .and_then(|index| members.get(index))
            .map(|standing| standing.weekly_xp);
        let mut snapshot = LeagueSnapshot {
            league,
            year: iso.year(),
            week: iso.week(),
            user_ranks: Vec::with_capacity(members.len()),
            promoted_users: Vec::new(),
            demoted_users: Vec::new(),
        };

        for (index, standing) in members.iter().enumerate() {
            let target = if index < movers && standing.weekly_xp > 0 {
                league.promoted()
            } else if index >= demote_from
                && lowest_kept_xp.is_some_and(|kept| standing.weekly_xp < kept)
            {
                league.demoted()
            } else {
                None
            };
            let trend = match target {
                Some(to) => {
                    outcome.moves.push(LeagueMove {
                        user_id: standing.user_id,
                        from: league,
                        to,
                    });
                    if to > league {
                        snapshot.promoted_users.push(standing.user_id);
                        Trend::Up
                    } else {
                        snapshot.demoted_users.push(standing.user_id);
                        Trend::Down
                    }
                }
                None => Trend::Same,
            };
            snapshot.user_ranks.push(LeagueRank {
                user_id: standing.user_id,
                user_name: standing.name.clone(),
                xp: standing.weekly_xp,
                rank: u32::try_from(index + 1).unwrap_or(u32::MAX),
                trend,
            });
        }
        outcome.snapshots.push(snapshot);
    }
    outcome
}
