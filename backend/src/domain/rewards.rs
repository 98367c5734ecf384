//! Reward ledger: pure functions computing XP, heart and gem consequences.
//!
//! Nothing here touches storage. Services call these functions with the
//! current user state and apply the returned deltas atomically in the store.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::Error;
use crate::domain::learning::Lesson;
use crate::domain::mission::{Mission, VerificationDecision};
use crate::domain::store::{BoosterKind, StoreItem, StoreItemKind};

/// Tunable game constants shared by every service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRules {
    /// Heart cap; refills and restores never exceed it.
    pub max_hearts: u32,
    /// Gems charged to restore one heart from the progress page.
    pub restore_heart_cost: u32,
    /// Lifetime of a purchased booster.
    pub booster_duration: Duration,
    /// Lesson XP multiplier while an XP boost is active.
    pub xp_boost_multiplier: u32,
    /// XP span of one domain level.
    pub level_size: u64,
}

impl GameRules {
    /// Rules with the default constants and the given heart cap.
    pub fn with_max_hearts(max_hearts: u32) -> Self {
        Self {
            max_hearts,
            ..Self::default()
        }
    }
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            max_hearts: 5,
            restore_heart_cost: 10,
            booster_duration: Duration::hours(24),
            xp_boost_multiplier: 2,
            level_size: 100,
        }
    }
}

/// Reasons a reward-affecting action is refused before any mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RewardError {
    #[error("Not enough hearts")]
    NotEnoughHearts,
    #[error("Not enough gems")]
    NotEnoughGems,
    #[error("Hearts already full")]
    HeartsFull,
    #[error("Item not found")]
    ItemUnavailable,
}

impl From<RewardError> for Error {
    fn from(value: RewardError) -> Self {
        match value {
            RewardError::ItemUnavailable => Error::not_found(value.to_string()),
            RewardError::NotEnoughHearts
            | RewardError::NotEnoughGems
            | RewardError::HeartsFull => Error::invalid_state(value.to_string()),
        }
    }
}

/// Consequence of a lesson attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LessonOutcome {
    pub passed: bool,
    pub xp_earned: u32,
    pub hearts_used: u32,
}

impl LessonOutcome {
    /// Apply an XP multiplier from an active booster.
    #[must_use]
    pub fn with_multiplier(self, multiplier: u32) -> Self {
        Self {
            xp_earned: self.xp_earned.saturating_mul(multiplier),
            ..self
        }
    }
}

/// Refuse to start a lesson the learner cannot afford.
pub fn check_lesson_start(lesson: &Lesson, current_hearts: u32) -> Result<(), RewardError> {
    if current_hearts < lesson.heart_cost {
        return Err(RewardError::NotEnoughHearts);
    }
    Ok(())
}

/// Evaluate a submitted lesson.
///
/// An attempt passes only without errors. A failed attempt consumes one
/// heart per error, never more than the learner holds, and earns no XP.
///
/// # Examples
/// ```
/// # use podium::domain::{LessonContent, Lesson, LessonId, UnitId};
/// use podium::domain::rewards::evaluate_lesson_attempt;
/// # let lesson = Lesson {
/// #     id: LessonId::random(), unit_id: UnitId::random(), title: "t".into(),
/// #     description: String::new(), difficulty: 1, xp_reward: 10, heart_cost: 1,
/// #     order: 1, content: LessonContent::Reading { body: String::new() },
/// # };
/// let failed = evaluate_lesson_attempt(&lesson, 3, 2);
/// assert!(!failed.passed);
/// assert_eq!(failed.hearts_used, 2);
/// assert_eq!(failed.xp_earned, 0);
/// ```
pub fn evaluate_lesson_attempt(
    lesson: &Lesson,
    errors_count: u32,
    current_hearts: u32,
) -> LessonOutcome {
    if errors_count == 0 {
        LessonOutcome {
            passed: true,
            xp_earned: lesson.xp_reward,
            hearts_used: 0,
        }
    } else {
        LessonOutcome {
            passed: false,
            xp_earned: 0,
            hearts_used: errors_count.min(current_hearts),
        }
    }
}

/// Rewards disbursed when a submission is resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MissionReward {
    pub user_xp: u32,
    pub user_gems: u32,
    pub team_points: u32,
    pub team_xp: u32,
}

impl MissionReward {
    /// Whether anything is disbursed.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Evaluate a verification decision; rejections award nothing.
pub fn evaluate_mission_verification(
    mission: &Mission,
    decision: VerificationDecision,
) -> MissionReward {
    match decision {
        VerificationDecision::Approved => MissionReward {
            user_xp: mission.xp_reward,
            user_gems: mission.gems_reward,
            team_points: mission.points,
            team_xp: mission.xp_reward,
        },
        VerificationDecision::Rejected => MissionReward::default(),
    }
}

/// State change bought with a store purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseEffect {
    /// Set hearts to the given value.
    RefillHearts { hearts: u32 },
    /// Grant a booster expiring at the given time.
    GrantBooster {
        kind: BoosterKind,
        expires_at: DateTime<Utc>,
    },
    /// Nothing beyond recording the purchase.
    RecordOnly,
}

/// Gem spend and effect of buying `item`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurchasePlan {
    pub cost: u32,
    pub effect: PurchaseEffect,
}

/// Evaluate a purchase against the buyer's gem balance.
pub fn evaluate_purchase(
    item: &StoreItem,
    gems: u32,
    rules: &GameRules,
    now: DateTime<Utc>,
) -> Result<PurchasePlan, RewardError> {
    if !item.available {
        return Err(RewardError::ItemUnavailable);
    }
    if gems < item.cost_gems {
        return Err(RewardError::NotEnoughGems);
    }
    let effect = match (item.kind, item.kind.booster()) {
        (StoreItemKind::RestoreHeart, _) => PurchaseEffect::RefillHearts {
            hearts: rules.max_hearts,
        },
        (_, Some(kind)) => PurchaseEffect::GrantBooster {
            kind,
            expires_at: now + rules.booster_duration,
        },
        (_, None) => PurchaseEffect::RecordOnly,
    };
    Ok(PurchasePlan {
        cost: item.cost_gems,
        effect,
    })
}

/// Check that one heart can be bought back with gems.
pub fn evaluate_heart_restore(
    hearts: u32,
    gems: u32,
    rules: &GameRules,
) -> Result<(), RewardError> {
    if hearts >= rules.max_hearts {
        return Err(RewardError::HeartsFull);
    }
    if gems < rules.restore_heart_cost {
        return Err(RewardError::NotEnoughGems);
    }
    Ok(())
}
