//! Learning path use cases: browsing units and playing lessons.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::ports::{
    AttemptRecord, LearnerBalances, LearningPathService, LearningRepository,
    LearningRepositoryError, LessonSubmission, LessonSubmissionResult, ProgressRepository,
    ProgressRepositoryError,
};
use crate::domain::rewards::{check_lesson_start, evaluate_lesson_attempt};
use crate::domain::store::has_active;
use crate::domain::{
    BadgeAwarder, BoosterKind, DomainDelta, Error, GameRules, Lesson, LessonId, LessonInDomain,
    PathUnit, UnitId, User, learning,
};

fn map_repository_error(error: LearningRepositoryError) -> Error {
    match error {
        LearningRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("learning repository unavailable: {message}"))
        }
        LearningRepositoryError::Query { message } => {
            Error::internal(format!("learning repository error: {message}"))
        }
        LearningRepositoryError::UserNotFound => Error::not_found("User not found"),
    }
}

fn map_progress_error(error: ProgressRepositoryError) -> Error {
    match error {
        ProgressRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("progress repository unavailable: {message}"))
        }
        other => Error::internal(format!("progress repository error: {other}")),
    }
}

/// Learning path service implementing [`LearningPathService`].
#[derive(Clone)]
pub struct LearningPathServiceImpl<R> {
    repo: Arc<R>,
    progress: Arc<dyn ProgressRepository>,
    awarder: BadgeAwarder,
    clock: Arc<dyn Clock>,
    rules: GameRules,
}

impl<R> LearningPathServiceImpl<R> {
    /// Create the service.
    pub fn new(
        repo: Arc<R>,
        progress: Arc<dyn ProgressRepository>,
        awarder: BadgeAwarder,
        clock: Arc<dyn Clock>,
        rules: GameRules,
    ) -> Self {
        Self {
            repo,
            progress,
            awarder,
            clock,
            rules,
        }
    }
}

impl<R> LearningPathServiceImpl<R>
where
    R: LearningRepository,
{
    async fn passed_lessons(&self, user: &User) -> Result<HashSet<LessonId>, Error> {
        Ok(self
            .repo
            .passed_lesson_ids(&user.id)
            .await
            .map_err(map_repository_error)?
            .into_iter()
            .collect())
    }

    async fn lesson(&self, id: &LessonId) -> Result<LessonInDomain, Error> {
        self.repo
            .find_lesson(id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found("Lesson not found"))
    }

    async fn xp_multiplier(&self, user: &User) -> Result<u32, Error> {
        let now = self.clock.utc();
        let boosters = self
            .progress
            .active_boosters(&user.id, now)
            .await
            .map_err(map_progress_error)?;
        Ok(if has_active(&boosters, BoosterKind::BoostXp, now) {
            self.rules.xp_boost_multiplier
        } else {
            1
        })
    }
}

#[async_trait]
impl<R> LearningPathService for LearningPathServiceImpl<R>
where
    R: LearningRepository,
{
    async fn path(&self, user: &User) -> Result<Vec<PathUnit>, Error> {
        let units = self.repo.list_units().await.map_err(map_repository_error)?;
        let lessons = self
            .repo
            .list_lessons()
            .await
            .map_err(map_repository_error)?;
        let passed = self.passed_lessons(user).await?;
        Ok(learning::assemble_path(units, lessons, &passed))
    }

    async fn unit(&self, user: &User, unit: &UnitId) -> Result<PathUnit, Error> {
        let found = self
            .repo
            .find_unit(unit)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found("Unit not found"))?;
        let required = found.required_unit_id;
        let lessons = self
            .repo
            .lessons_for_unit(unit)
            .await
            .map_err(map_repository_error)?;
        let passed = self.passed_lessons(user).await?;

        let mut assembled = learning::assemble_path(vec![found], lessons, &passed);
        let mut path_unit = assembled
            .pop()
            .ok_or_else(|| Error::internal("unit vanished while assembling the path"))?;

        // The prerequisite is outside the assembled slice; resolve it directly.
        path_unit.locked = match required {
            Some(required) => {
                let required_lessons = self
                    .repo
                    .lessons_for_unit(&required)
                    .await
                    .map_err(map_repository_error)?;
                required_lessons.is_empty()
                    || !required_lessons
                        .iter()
                        .all(|lesson| passed.contains(&lesson.id))
            }
            None => false,
        };
        Ok(path_unit)
    }

    async fn start_lesson(&self, user: &User, lesson: &LessonId) -> Result<Lesson, Error> {
        let found = self.lesson(lesson).await?;
        check_lesson_start(&found.lesson, user.progression.hearts)?;
        Ok(found.lesson)
    }

    async fn submit_lesson(
        &self,
        user: &User,
        lesson: &LessonId,
        submission: LessonSubmission,
    ) -> Result<LessonSubmissionResult, Error> {
        let errors_count = u32::try_from(submission.errors_count)
            .map_err(|_| Error::invalid_request("errorsCount must be a non-negative integer"))?;
        let found = self.lesson(lesson).await?;

        let mut outcome =
            evaluate_lesson_attempt(&found.lesson, errors_count, user.progression.hearts);
        if outcome.passed {
            outcome = outcome.with_multiplier(self.xp_multiplier(user).await?);
        }

        let applied = self
            .repo
            .record_attempt(&AttemptRecord {
                user_id: user.id,
                lesson: found.clone(),
                errors_count,
                outcome,
                answers: submission.answers,
                at: self.clock.utc(),
            })
            .await
            .map_err(map_repository_error)?;

        info!(
            user_id = %user.id,
            lesson_id = %lesson,
            passed = outcome.passed,
            xp_earned = outcome.xp_earned,
            hearts_used = outcome.hearts_used,
            "lesson attempt recorded"
        );

        let badges_earned = if outcome.passed {
            let delta = DomainDelta::lesson(found.domain, outcome.xp_earned);
            let update = applied.domain_progress.as_ref().map(|p| (p, &delta));
            self.awarder.after_progress(&user.id, update).await
        } else {
            Vec::new()
        };

        Ok(LessonSubmissionResult {
            attempt: applied.attempt,
            passed: outcome.passed,
            xp_earned: outcome.xp_earned,
            hearts_used: outcome.hearts_used,
            user: LearnerBalances {
                hearts: applied.hearts,
                xp_total: applied.xp_total,
            },
            badges_earned,
        })
    }
}

#[cfg(test)]
#[path = "learning_path_service_tests.rs"]
mod tests;
