//! Driving port for the progress overview and heart restoration.

use async_trait::async_trait;
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{Error, ProgressOverview, User};

/// Balances after buying back a heart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HeartRestoreResult {
    pub hearts: u32,
    pub gems: u32,
}

/// Domain use-case port for progress.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProgressService: Send + Sync {
    /// Progress overview of the caller.
    async fn overview(&self, user: &User) -> Result<ProgressOverview, Error>;

    /// Spend gems for one heart.
    async fn restore_heart(&self, user: &User) -> Result<HeartRestoreResult, Error>;
}
