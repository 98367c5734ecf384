//! Store handlers.
//!
//! ```text
//! GET  /api/v1/store
//! POST /api/v1/store/{itemId}/purchase
//! ```

use actix_web::{HttpResponse, get, post, web};

use crate::domain::ports::PurchaseResult;
use crate::domain::{StoreItem, StoreItemId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::envelope::ok;
use crate::inbound::http::schemas::ErrorEnvelopeSchema;
use crate::inbound::http::state::HttpState;

/// Items on sale, cheapest first.
#[utoipa::path(
    get,
    path = "/api/v1/store",
    responses((status = 200, description = "Store items", body = [StoreItem])),
    tags = ["store"],
    operation_id = "listStore",
    security(("BearerAuth" = []))
)]
#[get("/store")]
pub async fn list_items(
    state: web::Data<HttpState>,
    _caller: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    let items = state.store.list().await?;
    Ok(ok(items))
}

/// Buy an item with gems.
#[utoipa::path(
    post,
    path = "/api/v1/store/{item_id}/purchase",
    params(("item_id" = String, Path, description = "Store item identifier")),
    responses(
        (status = 200, description = "Purchase applied", body = PurchaseResult),
        (status = 400, description = "Not enough gems", body = ErrorEnvelopeSchema),
        (status = 404, description = "Item not found", body = ErrorEnvelopeSchema)
    ),
    tags = ["store"],
    operation_id = "purchaseItem",
    security(("BearerAuth" = []))
)]
#[post("/store/{item_id}/purchase")]
pub async fn purchase_item(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    path: web::Path<StoreItemId>,
) -> ApiResult<HttpResponse> {
    let result = state
        .store
        .purchase(caller.user(), &path.into_inner())
        .await?;
    Ok(ok(result))
}
