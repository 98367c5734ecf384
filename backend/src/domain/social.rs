//! Follow graph and public leaderboard views.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ids::{TeamId, UserId};
use crate::domain::league::League;
use crate::domain::user::UserSummary;

/// Follower and following counts with summaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FollowStats {
    pub followers_count: u32,
    pub following_count: u32,
    pub followers: Vec<UserSummary>,
    pub following: Vec<UserSummary>,
}

/// Default number of rows on the individual leaderboard.
pub const LEADERBOARD_DEFAULT_LIMIT: u32 = 50;
/// Largest accepted leaderboard page.
pub const LEADERBOARD_MAX_LIMIT: u32 = 100;

/// Clamp a requested leaderboard size into `1..=LEADERBOARD_MAX_LIMIT`.
pub fn clamp_leaderboard_limit(requested: Option<u32>) -> u32 {
    requested
        .unwrap_or(LEADERBOARD_DEFAULT_LIMIT)
        .clamp(1, LEADERBOARD_MAX_LIMIT)
}

/// One row of the individual leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub user_id: UserId,
    pub user_name: String,
    pub avatar: Option<String>,
    pub team_id: Option<TeamId>,
    pub team_name: Option<String>,
    pub xp_total: u64,
    pub streak: u32,
    pub league: League,
    pub badges_count: u32,
}

/// Member XP aggregated per team, before ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamAggregate {
    pub team_id: TeamId,
    pub name: String,
    pub member_count: u32,
    pub total_xp: u64,
    pub streak_sum: u64,
}

/// One row of the team leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamLeaderboardEntry {
    pub rank: u32,
    pub team_id: TeamId,
    pub team_name: String,
    #[serde(rename = "totalXP")]
    pub total_xp: u64,
    pub member_count: u32,
    pub avg_streak: f64,
    pub tier: League,
}

/// Rank teams by summed member XP, omitting teams without members.
pub fn rank_teams(mut aggregates: Vec<TeamAggregate>) -> Vec<TeamLeaderboardEntry> {
    aggregates.retain(|team| team.member_count > 0);
    aggregates.sort_by(|a, b| {
        b.total_xp
            .cmp(&a.total_xp)
            .then_with(|| a.name.cmp(&b.name))
    });
    aggregates
        .into_iter()
        .zip(1_u32..)
        .map(|(team, rank)| TeamLeaderboardEntry {
            rank,
            avg_streak: team.streak_sum as f64 / f64::from(team.member_count),
            tier: League::for_team_xp(team.total_xp),
            team_id: team.team_id,
            team_name: team.name,
            total_xp: team.total_xp,
            member_count: team.member_count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn aggregate(name: &str, members: u32, xp: u64, streaks: u64) -> TeamAggregate {
        TeamAggregate {
            team_id: TeamId::random(),
            name: name.into(),
            member_count: members,
            total_xp: xp,
            streak_sum: streaks,
        }
    }

    #[rstest]
    fn ranks_by_xp_and_drops_empty_teams() {
        let ranked = rank_teams(vec![
            aggregate("Alpha", 2, 12_000, 6),
            aggregate("Empty", 0, 0, 0),
            aggregate("Beta", 4, 60_000, 10),
        ]);

        let names: Vec<_> = ranked.iter().map(|t| t.team_name.as_str()).collect();
        assert_eq!(names, vec!["Beta", "Alpha"]);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[0].tier, League::Platinum);
        assert!((ranked[0].avg_streak - 2.5).abs() < f64::EPSILON);
        assert_eq!(ranked[1].tier, League::Silver);
    }

    #[rstest]
    #[case(None, 50)]
    #[case(Some(0), 1)]
    #[case(Some(20), 20)]
    #[case(Some(500), 100)]
    fn leaderboard_limits(#[case] requested: Option<u32>, #[case] expected: u32) {
        assert_eq!(clamp_leaderboard_limit(requested), expected);
    }
}
