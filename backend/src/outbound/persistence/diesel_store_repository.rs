//! PostgreSQL-backed `StoreRepository` implementation using Diesel ORM.
//!
//! A purchase deducts gems with `WHERE gems >= cost`, applies its effect,
//! records the purchase and logs `ITEM_PURCHASED` in one transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::AsyncConnection as _;
use diesel_async::RunQueryDsl;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use uuid::Uuid;

use crate::domain::ports::{PurchaseReceipt, StoreRepository, StoreRepositoryError};
use crate::domain::{
    EventPayload, NewEvent, PurchaseEffect, PurchasePlan, StoreItem, StoreItemId, UserId,
};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::diesel_helpers::{TxError, append_event, collect_rows, from_db_i32, to_db_i32};
use super::models::{ActiveBoosterRow, NewPurchaseRow, StoreItemRow};
use super::pool::{DbPool, PoolError};
use super::schema::{active_boosters, purchases, store_items, users};

/// Diesel-backed implementation of the `StoreRepository` port.
#[derive(Clone)]
pub struct DieselStoreRepository {
    pool: DbPool,
}

impl DieselStoreRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> StoreRepositoryError {
    map_basic_pool_error(error, StoreRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> StoreRepositoryError {
    map_basic_diesel_error(
        error,
        StoreRepositoryError::query,
        StoreRepositoryError::connection,
    )
}

fn purchased_event(user: UserId, item: &StoreItem, cost: u32) -> NewEvent {
    NewEvent::for_user(
        user,
        EventPayload::ItemPurchased {
            item_id: item.id,
            item_type: item.kind,
            cost_gems: cost,
        },
    )
}

/// Booster row to insert for `effect`, if it grants one.
fn booster_row(user: &UserId, effect: &PurchaseEffect, at: DateTime<Utc>) -> Option<ActiveBoosterRow> {
    match effect {
        PurchaseEffect::GrantBooster { kind, expires_at } => Some(ActiveBoosterRow {
            id: Uuid::new_v4(),
            user_id: *user.as_uuid(),
            booster_type: kind.as_str().to_owned(),
            expires_at: *expires_at,
            created_at: at,
        }),
        PurchaseEffect::RefillHearts { .. } | PurchaseEffect::RecordOnly => None,
    }
}

#[async_trait]
impl StoreRepository for DieselStoreRepository {
    async fn list_available(&self) -> Result<Vec<StoreItem>, StoreRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<StoreItemRow> = store_items::table
            .filter(store_items::available.eq(true))
            .order_by((store_items::cost_gems, store_items::title))
            .select(StoreItemRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        collect_rows(
            rows.into_iter().map(StoreItemRow::into_item),
            StoreRepositoryError::query,
        )
    }

    async fn find(&self, id: &StoreItemId) -> Result<Option<StoreItem>, StoreRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<StoreItemRow> = store_items::table
            .find(id.as_uuid())
            .select(StoreItemRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(|row| row.into_item().map_err(StoreRepositoryError::query))
            .transpose()
    }

    async fn purchase(
        &self,
        user: &UserId,
        item: &StoreItem,
        plan: &PurchasePlan,
        at: DateTime<Utc>,
    ) -> Result<PurchaseReceipt, StoreRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let cost = to_db_i32(plan.cost);
        let purchase_row = NewPurchaseRow {
            id: Uuid::new_v4(),
            user_id: *user.as_uuid(),
            item_id: *item.id.as_uuid(),
            cost_gems: cost,
            created_at: at,
        };
        let booster = booster_row(user, &plan.effect, at);
        let event = purchased_event(*user, item, plan.cost);

        let ((gems, hearts), booster) = conn
            .transaction::<_, TxError<StoreRepositoryError>, _>(|conn| {
                async move {
                    let balances: Option<(i32, i32)> = diesel::update(
                        users::table
                            .find(user.as_uuid())
                            .filter(users::gems.ge(cost)),
                    )
                    .set(users::gems.eq(users::gems - cost))
                    .returning((users::gems, users::hearts))
                    .get_result(conn)
                    .await
                    .optional()?;
                    let Some(mut balances) = balances else {
                        let exists: bool =
                            diesel::select(diesel::dsl::exists(users::table.find(user.as_uuid())))
                                .get_result(conn)
                                .await?;
                        return Err(TxError::Rejected(if exists {
                            StoreRepositoryError::insufficient_gems()
                        } else {
                            StoreRepositoryError::query("user not found")
                        }));
                    };

                    if let PurchaseEffect::RefillHearts { hearts } = plan.effect {
                        balances.1 = diesel::update(users::table.find(user.as_uuid()))
                            .set(users::hearts.eq(to_db_i32(hearts)))
                            .returning(users::hearts)
                            .get_result(conn)
                            .await?;
                    }

                    let booster = match booster {
                        Some(row) => Some(
                            diesel::insert_into(active_boosters::table)
                                .values(&row)
                                .returning(ActiveBoosterRow::as_returning())
                                .get_result::<ActiveBoosterRow>(conn)
                                .await?,
                        ),
                        None => None,
                    };

                    diesel::insert_into(purchases::table)
                        .values(&purchase_row)
                        .execute(conn)
                        .await?;
                    append_event(conn, &event, at).await?;
                    Ok((balances, booster))
                }
                .scope_boxed()
            })
            .await
            .map_err(|err| err.into_repository_error(map_diesel_error))?;

        Ok(PurchaseReceipt {
            gems: from_db_i32(gems),
            hearts: from_db_i32(hearts),
            booster: booster
                .map(ActiveBoosterRow::into_booster)
                .transpose()
                .map_err(StoreRepositoryError::query)?,
        })
    }
}
