//! Badge awarding and level-up bookkeeping.
//!
//! Runs after every progress mutation (lesson pass, approved mission, streak
//! extension). Awarding is idempotent: the repository ignores badges the
//! user already holds, so concurrent evaluations cannot double-award.

use std::collections::HashSet;
use std::sync::Arc;

use mockable::Clock;
use tracing::{info, warn};

use crate::domain::ports::{BadgeRepository, BadgeRepositoryError, EventLog, EventLogError};
use crate::domain::progress::level_reached;
use crate::domain::{
    Badge, DomainDelta, DomainProgress, Error, EventPayload, NewEvent, UserId, badge,
};

fn map_repository_error(error: BadgeRepositoryError) -> Error {
    match error {
        BadgeRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("badge repository unavailable: {message}"))
        }
        BadgeRepositoryError::Query { message } => {
            Error::internal(format!("badge repository error: {message}"))
        }
    }
}

pub(crate) fn map_event_log_error(error: EventLogError) -> Error {
    match error {
        EventLogError::Connection { message } => {
            Error::service_unavailable(format!("event log unavailable: {message}"))
        }
        EventLogError::Query { message } => Error::internal(format!("event log error: {message}")),
    }
}

/// Evaluates badge criteria and records level-ups.
#[derive(Clone)]
pub struct BadgeAwarder {
    badges: Arc<dyn BadgeRepository>,
    events: Arc<dyn EventLog>,
    clock: Arc<dyn Clock>,
    level_size: u64,
}

impl BadgeAwarder {
    /// Create an awarder; `level_size` is the XP span of one domain level.
    pub fn new(
        badges: Arc<dyn BadgeRepository>,
        events: Arc<dyn EventLog>,
        clock: Arc<dyn Clock>,
        level_size: u64,
    ) -> Self {
        Self {
            badges,
            events,
            clock,
            level_size,
        }
    }

    /// Award every catalog badge whose criteria the user now meets.
    ///
    /// Returns the badges awarded by this call.
    pub async fn evaluate(&self, user: &UserId) -> Result<Vec<Badge>, Error> {
        let Some(stats) = self
            .badges
            .stats(user)
            .await
            .map_err(map_repository_error)?
        else {
            return Ok(Vec::new());
        };
        let catalog = self.badges.catalog().await.map_err(map_repository_error)?;
        let held: HashSet<_> = self
            .badges
            .held_badge_ids(user)
            .await
            .map_err(map_repository_error)?
            .into_iter()
            .collect();

        let now = self.clock.utc();
        let mut awarded = Vec::new();
        for candidate in badge::newly_earned(&catalog, &held, &stats) {
            let inserted = self
                .badges
                .award(user, candidate, now)
                .await
                .map_err(map_repository_error)?;
            if inserted {
                info!(user_id = %user, badge_id = %candidate.id, "badge earned");
                awarded.push(candidate.clone());
            }
        }
        Ok(awarded)
    }

    /// Record a LEVEL_UP when `delta` crossed a level boundary.
    pub async fn record_level_up(
        &self,
        user: &UserId,
        progress: &DomainProgress,
        delta: &DomainDelta,
    ) -> Result<Option<u32>, Error> {
        let Some(level) = level_reached(progress, delta, self.level_size) else {
            return Ok(None);
        };
        let event = NewEvent::for_user(
            *user,
            EventPayload::LevelUp {
                domain: progress.domain,
                level,
            },
        );
        self.events
            .append(&event, self.clock.utc())
            .await
            .map_err(map_event_log_error)?;
        info!(user_id = %user, domain = progress.domain.as_str(), level, "level up");
        Ok(Some(level))
    }

    /// Follow-up work once a progress mutation has committed.
    ///
    /// The mutation itself already succeeded, so failures here are logged and
    /// never surface to the caller.
    pub async fn after_progress(
        &self,
        user: &UserId,
        update: Option<(&DomainProgress, &DomainDelta)>,
    ) -> Vec<Badge> {
        if let Some((progress, delta)) = update
            && let Err(error) = self.record_level_up(user, progress, delta).await
        {
            warn!(user_id = %user, error = %error, "failed to record level up");
        }
        match self.evaluate(user).await {
            Ok(badges) => badges,
            Err(error) => {
                warn!(user_id = %user, error = %error, "badge evaluation failed");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
#[path = "badge_service_tests.rs"]
mod tests;
