//! Gem store use cases.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::ports::{PurchaseResult, StoreRepository, StoreRepositoryError, StoreService};
use crate::domain::rewards::evaluate_purchase;
use crate::domain::{Error, GameRules, RewardError, StoreItem, StoreItemId, User};

fn map_repository_error(error: StoreRepositoryError) -> Error {
    match error {
        StoreRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("store repository unavailable: {message}"))
        }
        StoreRepositoryError::Query { message } => {
            Error::internal(format!("store repository error: {message}"))
        }
        StoreRepositoryError::InsufficientGems => RewardError::NotEnoughGems.into(),
    }
}

/// Store service implementing [`StoreService`].
#[derive(Clone)]
pub struct StoreServiceImpl<R> {
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
    rules: GameRules,
}

impl<R> StoreServiceImpl<R> {
    /// Create the service.
    pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>, rules: GameRules) -> Self {
        Self { repo, clock, rules }
    }
}

#[async_trait]
impl<R> StoreService for StoreServiceImpl<R>
where
    R: StoreRepository,
{
    async fn list(&self) -> Result<Vec<StoreItem>, Error> {
        self.repo
            .list_available()
            .await
            .map_err(map_repository_error)
    }

    async fn purchase(&self, user: &User, item: &StoreItemId) -> Result<PurchaseResult, Error> {
        let item = self
            .repo
            .find(item)
            .await
            .map_err(map_repository_error)?
            .ok_or(RewardError::ItemUnavailable)?;

        let now = self.clock.utc();
        let plan = evaluate_purchase(&item, user.progression.gems, &self.rules, now)?;
        let receipt = self
            .repo
            .purchase(&user.id, &item, &plan, now)
            .await
            .map_err(map_repository_error)?;

        info!(
            user_id = %user.id,
            item_id = %item.id,
            item_type = item.kind.as_str(),
            cost_gems = plan.cost,
            "store item purchased"
        );
        Ok(PurchaseResult {
            item,
            gems: receipt.gems,
            hearts: receipt.hearts,
            booster: receipt.booster,
        })
    }
}

#[cfg(test)]
#[path = "store_service_tests.rs"]
mod tests;
