use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use tracing::{error, info, warn};

use orderdesk_auth::AuthzError;
use orderdesk_catalog::CatalogError;
use orderdesk_infra::{ServiceError, StoreError};
use orderdesk_orders::OrderError;
use orderdesk_units::UnitError;

/// Map an engine failure to its HTTP status and JSON body.
///
/// | Failure                                                    | Status |
/// |------------------------------------------------------------|--------|
/// | validation, unknown unit, unit mismatch, invalid supplier  | 400    |
/// | not found (or not owned)                                   | 404    |
/// | insufficient stock, multiple stock errors, store conflict  | 409    |
/// | invalid transition/state, unavailable product              | 422    |
/// | any other store failure                                    | 500    |
pub fn service_error_to_response(err: ServiceError) -> Response {
    match err {
        ServiceError::Order(e) => order_error_to_response(e),
        ServiceError::Catalog(e) => catalog_error_to_response(e),
        ServiceError::Store(e) => store_error_to_response(e),
    }
}

pub fn order_error_to_response(err: OrderError) -> Response {
    info!(code = err.code(), error = %err, "request rejected");

    let status = match &err {
        OrderError::Validation(_)
        | OrderError::InvalidSupplier
        | OrderError::UnknownUnit(_)
        | OrderError::UnitMismatch { .. } => StatusCode::BAD_REQUEST,
        OrderError::NotFound => StatusCode::NOT_FOUND,
        OrderError::InsufficientStock(_) | OrderError::MultipleStockErrors(_) => {
            StatusCode::CONFLICT
        }
        OrderError::ProductUnavailable(_)
        | OrderError::InvalidTransition { .. }
        | OrderError::InvalidState { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    };

    let details = match &err {
        OrderError::InsufficientStock(shortfall) => Some(json!({ "errors": [shortfall] })),
        OrderError::MultipleStockErrors(list) => Some(json!({ "errors": list })),
        OrderError::ProductUnavailable(product_id) => Some(json!({ "productId": product_id })),
        OrderError::UnitMismatch {
            product_id,
            unit,
            base_unit,
        } => Some(json!({ "productId": product_id, "unitCode": unit, "baseUnitCode": base_unit })),
        OrderError::InvalidTransition { from, to, allowed } => {
            Some(json!({ "from": from, "to": to, "allowed": allowed }))
        }
        OrderError::InvalidState { current } => Some(json!({ "currentStatus": current })),
        _ => None,
    };

    json_error_with_details(status, err.code(), err.to_string(), details)
}

fn catalog_error_to_response(err: CatalogError) -> Response {
    info!(error = %err, "product rejected");
    let code = match &err {
        CatalogError::Unit(UnitError::UnknownUnit(_)) => "UNKNOWN_UNIT",
        _ => "VALIDATION_ERROR",
    };
    json_error(StatusCode::BAD_REQUEST, code, err.to_string())
}

fn store_error_to_response(err: StoreError) -> Response {
    match err {
        StoreError::Conflict(msg) => {
            warn!(error = %msg, "transaction conflict");
            json_error(StatusCode::CONFLICT, "CONFLICT", "concurrent update, retry the request")
        }
        other => {
            error!(error = %other, "store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR", "internal storage error")
        }
    }
}

pub fn authz_error_to_response(err: AuthzError) -> Response {
    json_error(StatusCode::FORBIDDEN, "FORBIDDEN", err.to_string())
}

pub fn invalid_id(what: &str) -> Response {
    json_error(StatusCode::BAD_REQUEST, "INVALID_ID", format!("invalid {what} id"))
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    json_error_with_details(status, code, message, None)
}

pub fn json_error_with_details(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
    details: Option<Value>,
) -> Response {
    let mut body = json!({
        "error": code,
        "message": message.into(),
    });
    if let Some(details) = details {
        body["details"] = details;
    }
    (status, axum::Json(body)).into_response()
}
