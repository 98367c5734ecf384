//! Domain primitives, the gamification engine and its services.
//!
//! Purpose: define strongly typed entities, the pure reward and settlement
//! rules, and the services implementing driving ports. Nothing in this module
//! knows about HTTP, WebSockets or SQL; adapters reach the domain through
//! [`ports`].
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - Typed identifiers (`UserId`, `LessonId`, ...).
//! - Reward ledger ([`rewards`]) and league settlement ([`league`]).
//! - Services (`*ServiceImpl`) and the [`scheduler`] with its jobs.

pub mod badge;
pub mod error;
pub mod event;
pub mod ids;
pub mod league;
pub mod learning;
pub mod mission;
pub mod notification;
pub mod ports;
pub mod progress;
pub mod rewards;
pub mod scheduler;
pub mod social;
pub mod store;
pub mod team;
pub mod trace_id;
pub mod user;

mod account_service;
mod badge_service;
mod learning_path_service;
mod league_service;
mod mission_service;
mod progress_service;
mod social_service;
mod store_service;
mod team_service;

pub use self::account_service::{AccountPorts, AccountServiceImpl};
pub use self::badge::{Badge, BadgeCriteria, BadgeStats, EarnedBadge, Rarity};
pub use self::badge_service::BadgeAwarder;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::event::{EventPayload, NewEvent};
pub use self::ids::{
    AttemptId, BadgeId, BoosterId, IdParseError, LessonId, MissionId, StoreItemId, SubmissionId,
    TeamId, UnitId, UserId,
};
pub use self::learning::{
    AttemptResult, Lesson, LessonAttempt, LessonContent, LessonInDomain, LessonKind, NirdDomain,
    PathLesson, PathUnit, QuizQuestion, StoryChoice, StoryScene, Unit,
};
pub use self::learning_path_service::LearningPathServiceImpl;
pub use self::league::{
    League, LeagueMove, LeagueRank, LeagueSnapshot, LeagueStanding, SettlementOutcome, Trend,
};
pub use self::league_service::{LeaderboardServiceImpl, LeagueServiceImpl};
pub use self::mission::{
    Mission, MissionFilter, MissionRequirement, MissionStatus, NewSubmission, Submission,
    SubmissionStatus, TransitionError, Verification, VerificationDecision, Verifier,
};
pub use self::mission_service::MissionServiceImpl;
pub use self::notification::Notification;
pub use self::progress::{DomainDelta, DomainProgress, ProgressOverview};
pub use self::progress_service::ProgressServiceImpl;
pub use self::rewards::{
    GameRules, LessonOutcome, MissionReward, PurchaseEffect, PurchasePlan, RewardError,
};
pub use self::social::{FollowStats, LeaderboardEntry, TeamAggregate, TeamLeaderboardEntry};
pub use self::social_service::SocialServiceImpl;
pub use self::store::{ActiveBooster, BoosterKind, StoreItem, StoreItemKind};
pub use self::store_service::StoreServiceImpl;
pub use self::team::{
    InviteCode, NewTeam, Team, TeamDetails, TeamListing, TeamMember, TeamName,
    TeamValidationError,
};
pub use self::team_service::TeamServiceImpl;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{
    AccessibilityPreferences, DisplayName, Email, FontSize, Login, NewUser, Password,
    Progression, Role, RoleSet, User, UserSummary, UserValidationError,
};

/// Convenient result alias for driving ports.
///
/// # Examples
/// ```
/// use podium::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<()> {
///     Err(Error::forbidden("nope"))
/// }
/// assert!(handler().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
