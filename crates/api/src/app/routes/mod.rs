use axum::{routing::get, Router};

pub mod admin;
pub mod common;
pub mod orders;
pub mod products;
pub mod supplier;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/units", get(products::list_units))
        .nest("/orders", orders::router())
        .nest("/supplier", supplier::router())
        .nest("/products", products::router())
        .nest("/admin", admin::router())
}
