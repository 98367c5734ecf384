//! Driving port for the gem store.

use async_trait::async_trait;
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{ActiveBooster, Error, StoreItem, StoreItemId, User};

/// Outcome of a purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResult {
    pub item: StoreItem,
    pub gems: u32,
    pub hearts: u32,
    pub booster: Option<ActiveBooster>,
}

/// Domain use-case port for the store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StoreService: Send + Sync {
    /// Items on sale, cheapest first.
    async fn list(&self) -> Result<Vec<StoreItem>, Error>;

    /// Buy an item with gems.
    async fn purchase(&self, user: &User, item: &StoreItemId) -> Result<PurchaseResult, Error>;
}
