use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use orderdesk_core::ProductId;
use orderdesk_units::UnitCode;

use crate::app::routes::common::parse_id;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/:id/stock", get(get_stock))
}

/// Available stock, in the base unit and optionally in `?unit=`.
pub async fn get_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Query(query): Query<dto::StockQuery>,
) -> axum::response::Response {
    let product_id: ProductId = match parse_id(&id, "product") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services
        .catalog
        .stock_info(product_id, query.unit.map(UnitCode::new))
        .await
    {
        Ok(info) => Json(info).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_units(Extension(services): Extension<Arc<AppServices>>) -> impl IntoResponse {
    Json(services.catalog.units().units().into_iter().cloned().collect::<Vec<_>>())
}
