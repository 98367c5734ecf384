//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (repositories, hashing, tokens, the notification relay) are
//! implemented by outbound adapters. Driving ports (`*Service` traits) are
//! implemented by domain services and consumed by inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod account_service;
mod badge_repository;
mod event_log;
mod learning_path_service;
mod learning_repository;
mod league_repository;
mod league_service;
mod maintenance_repository;
mod mission_repository;
mod mission_service;
mod notification_relay;
mod password_hasher;
mod progress_repository;
mod progress_service;
mod social_repository;
mod social_service;
mod store_repository;
mod store_service;
mod team_repository;
mod team_service;
mod token_service;
mod user_repository;

#[cfg(test)]
pub use account_service::MockAccountService;
pub use account_service::{
    AccountService, AuthSession, LoginRequest, RegisterRequest, TeamSummary, UserProfile,
};
#[cfg(test)]
pub use badge_repository::MockBadgeRepository;
pub use badge_repository::{BadgeRepository, BadgeRepositoryError};
#[cfg(test)]
pub use event_log::MockEventLog;
pub use event_log::{EventLog, EventLogError};
#[cfg(test)]
pub use learning_path_service::MockLearningPathService;
pub use learning_path_service::{
    LearnerBalances, LearningPathService, LessonSubmission, LessonSubmissionResult,
};
#[cfg(test)]
pub use learning_repository::MockLearningRepository;
pub use learning_repository::{
    AttemptApplied, AttemptRecord, LearningRepository, LearningRepositoryError,
};
#[cfg(test)]
pub use league_repository::MockLeagueRepository;
pub use league_repository::{LeagueOverview, LeagueRepository, LeagueRepositoryError};
#[cfg(test)]
pub use league_service::{MockLeaderboardService, MockLeagueService};
pub use league_service::{LeaderboardService, LeagueService};
#[cfg(test)]
pub use maintenance_repository::MockMaintenanceRepository;
pub use maintenance_repository::{
    ActivityWindow, MaintenanceRepository, MaintenanceRepositoryError, StreakSweep,
};
#[cfg(test)]
pub use mission_repository::MockMissionRepository;
pub use mission_repository::{MissionRepository, MissionRepositoryError, ResolvedSubmission};
#[cfg(test)]
pub use mission_service::MockMissionService;
pub use mission_service::{
    CiReport, MissionService, SubmitMissionRequest, VerificationResult, VerifySubmissionRequest,
};
#[cfg(test)]
pub use notification_relay::MockNotificationRelay;
pub use notification_relay::{NotificationRelay, SilentRelay};
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHashError, PasswordHasher};
#[cfg(test)]
pub use progress_repository::MockProgressRepository;
pub use progress_repository::{HeartRestored, ProgressRepository, ProgressRepositoryError};
#[cfg(test)]
pub use progress_service::MockProgressService;
pub use progress_service::{HeartRestoreResult, ProgressService};
#[cfg(test)]
pub use social_repository::MockSocialRepository;
pub use social_repository::{SocialRepository, SocialRepositoryError};
#[cfg(test)]
pub use social_service::MockSocialService;
pub use social_service::SocialService;
#[cfg(test)]
pub use store_repository::MockStoreRepository;
pub use store_repository::{PurchaseReceipt, StoreRepository, StoreRepositoryError};
#[cfg(test)]
pub use store_service::MockStoreService;
pub use store_service::{PurchaseResult, StoreService};
#[cfg(test)]
pub use team_repository::MockTeamRepository;
pub use team_repository::{TeamRepository, TeamRepositoryError};
#[cfg(test)]
pub use team_service::MockTeamService;
pub use team_service::{CreateTeamRequest, JoinTeamRequest, TeamService, UpdateRolesRequest};
#[cfg(test)]
pub use token_service::MockTokenService;
pub use token_service::{IssuedToken, TokenError, TokenService};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{StoredCredentials, UserRepository, UserRepositoryError};
