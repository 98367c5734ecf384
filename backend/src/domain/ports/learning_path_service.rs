//! Driving port for the learning path and lesson attempts.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Badge, Error, Lesson, LessonAttempt, LessonId, PathUnit, UnitId, User};

/// Answers submitted at the end of a lesson.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LessonSubmission {
    #[serde(default)]
    #[schema(value_type = Object)]
    pub answers: serde_json::Value,
    /// Wrong answers given; must not be negative.
    pub errors_count: i64,
}

/// Learner balances after an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LearnerBalances {
    pub hearts: u32,
    pub xp_total: u64,
}

/// Outcome of a submitted lesson.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LessonSubmissionResult {
    pub attempt: LessonAttempt,
    pub passed: bool,
    pub xp_earned: u32,
    pub hearts_used: u32,
    pub user: LearnerBalances,
    pub badges_earned: Vec<Badge>,
}

/// Domain use-case port for learning.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LearningPathService: Send + Sync {
    /// Whole path with completion and lock flags for the caller.
    async fn path(&self, user: &User) -> Result<Vec<PathUnit>, Error>;

    /// One unit of the path.
    async fn unit(&self, user: &User, unit: &UnitId) -> Result<PathUnit, Error>;

    /// Check the caller may start a lesson and return it.
    async fn start_lesson(&self, user: &User, lesson: &LessonId) -> Result<Lesson, Error>;

    /// Evaluate and record a finished lesson.
    async fn submit_lesson(
        &self,
        user: &User,
        lesson: &LessonId,
        submission: LessonSubmission,
    ) -> Result<LessonSubmissionResult, Error>;
}
