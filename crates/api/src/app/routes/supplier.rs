//! Supplier-side endpoints: order handling and own catalog stock.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};

use orderdesk_auth::Role;
use orderdesk_catalog::{NewProduct, ProductUpdate};
use orderdesk_core::{OrderId, ProductId};
use orderdesk_orders::OrderStatus;

use crate::app::routes::common::{parse_id, require};
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/status", patch(update_status))
        .route("/products", post(create_product))
        .route("/products/:id", patch(update_product))
        .route("/products/:id/inventory", post(adjust_inventory))
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = require(&principal, Role::Supplier) {
        return resp;
    }
    let order_id: OrderId = match parse_id(&id, "order") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.queries.for_supplier(order_id, principal.user_id()).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateStatusRequest>,
) -> axum::response::Response {
    if let Err(resp) = require(&principal, Role::Supplier) {
        return resp;
    }
    let order_id: OrderId = match parse_id(&id, "order") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let status: OrderStatus = match body.status.parse() {
        Ok(s) => s,
        Err(e) => return errors::order_error_to_response(e),
    };

    match services
        .lifecycle
        .update_order_status(order_id, principal.user_id(), status, body.reason)
        .await
    {
        Ok(view) => Json(view).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<NewProduct>,
) -> axum::response::Response {
    if let Err(resp) = require(&principal, Role::Supplier) {
        return resp;
    }

    match services.catalog.create_product(principal.user_id(), body).await {
        Ok(product) => (StatusCode::CREATED, Json(product)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<ProductUpdate>,
) -> axum::response::Response {
    if let Err(resp) = require(&principal, Role::Supplier) {
        return resp;
    }
    let product_id: ProductId = match parse_id(&id, "product") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services
        .catalog
        .update_product(principal.user_id(), product_id, body)
        .await
    {
        Ok(product) => Json(product).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn adjust_inventory(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::AdjustStockRequest>,
) -> axum::response::Response {
    if let Err(resp) = require(&principal, Role::Supplier) {
        return resp;
    }
    let product_id: ProductId = match parse_id(&id, "product") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services
        .catalog
        .adjust_stock(principal.user_id(), product_id, body.delta, body.unit_code)
        .await
    {
        Ok(info) => Json(info).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
