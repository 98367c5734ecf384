//! Port for the learning catalog and lesson attempt recording.
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    DomainProgress, Lesson, LessonAttempt, LessonId, LessonInDomain, LessonOutcome, Unit, UnitId,
    UserId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by learning repository adapters.
    pub enum LearningRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "learning repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "learning repository query failed: {message}",
        /// The learner disappeared between lookup and write.
        UserNotFound => "user not found",
    }
}

/// Attempt to persist, already evaluated by the reward ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptRecord {
    pub user_id: UserId,
    pub lesson: LessonInDomain,
    pub errors_count: u32,
    pub outcome: LessonOutcome,
    pub answers: serde_json::Value,
    pub at: DateTime<Utc>,
}

/// State after an attempt was applied.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptApplied {
    pub attempt: LessonAttempt,
    pub hearts: u32,
    pub xp_total: u64,
    /// Updated aggregate of the lesson's domain; `None` for failed attempts.
    pub domain_progress: Option<DomainProgress>,
}

/// Port for units, lessons and attempts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LearningRepository: Send + Sync {
    /// Every unit.
    async fn list_units(&self) -> Result<Vec<Unit>, LearningRepositoryError>;

    /// Every lesson.
    async fn list_lessons(&self) -> Result<Vec<Lesson>, LearningRepositoryError>;

    /// One unit.
    async fn find_unit(&self, id: &UnitId) -> Result<Option<Unit>, LearningRepositoryError>;

    /// Lessons of one unit.
    async fn lessons_for_unit(&self, id: &UnitId) -> Result<Vec<Lesson>, LearningRepositoryError>;

    /// One lesson with the domain of its unit.
    async fn find_lesson(
        &self,
        id: &LessonId,
    ) -> Result<Option<LessonInDomain>, LearningRepositoryError>;

    /// Lessons the user has passed at least once.
    async fn passed_lesson_ids(
        &self,
        user: &UserId,
    ) -> Result<Vec<LessonId>, LearningRepositoryError>;

    /// Persist the attempt, user deltas, domain progress and event log entry
    /// in one transaction.
    async fn record_attempt(
        &self,
        record: &AttemptRecord,
    ) -> Result<AttemptApplied, LearningRepositoryError>;
}
