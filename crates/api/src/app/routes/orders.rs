//! Buyer-side order endpoints.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use orderdesk_auth::Role;
use orderdesk_core::OrderId;
use orderdesk_orders::PlaceOrder;

use crate::app::routes::common::{parse_id, require};
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(place_order))
        .route("/:id", get(get_order))
        .route("/:id/cancel", post(cancel_order))
}

pub async fn place_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<PlaceOrder>,
) -> axum::response::Response {
    if let Err(resp) = require(&principal, Role::Buyer) {
        return resp;
    }

    match services.placement.place_order(principal.user_id(), body).await {
        Ok(view) => (StatusCode::CREATED, Json(view)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = require(&principal, Role::Buyer) {
        return resp;
    }
    let order_id: OrderId = match parse_id(&id, "order") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.queries.for_buyer(order_id, principal.user_id()).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn cancel_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Option<Json<dto::CancelOrderRequest>>,
) -> axum::response::Response {
    if let Err(resp) = require(&principal, Role::Buyer) {
        return resp;
    }
    let order_id: OrderId = match parse_id(&id, "order") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let reason = body.and_then(|Json(b)| b.reason);

    match services
        .lifecycle
        .cancel_order(order_id, principal.user_id(), reason)
        .await
    {
        Ok(view) => Json(view).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
