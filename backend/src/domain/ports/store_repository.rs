//! Port for the store catalog and purchases.
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{ActiveBooster, PurchasePlan, StoreItem, StoreItemId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by store repository adapters.
    pub enum StoreRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "store repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "store repository query failed: {message}",
        /// The gem balance no longer covers the cost.
        InsufficientGems => "not enough gems",
    }
}

/// Balances after a purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseReceipt {
    pub gems: u32,
    pub hearts: u32,
    pub booster: Option<ActiveBooster>,
}

/// Port for store reads and purchases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StoreRepository: Send + Sync {
    /// Available items, cheapest first.
    async fn list_available(&self) -> Result<Vec<StoreItem>, StoreRepositoryError>;

    /// One item regardless of availability.
    async fn find(&self, id: &StoreItemId) -> Result<Option<StoreItem>, StoreRepositoryError>;

    /// Spend gems and apply the effect in one transaction.
    ///
    /// Gems are deducted with a conditional update so concurrent purchases
    /// cannot overdraw the balance.
    async fn purchase(
        &self,
        user: &UserId,
        item: &StoreItem,
        plan: &PurchasePlan,
        at: DateTime<Utc>,
    ) -> Result<PurchaseReceipt, StoreRepositoryError>;
}
