//! Account snapshot sync from the identity system.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    response::IntoResponse,
    routing::put,
    Json, Router,
};

use orderdesk_auth::Role;
use orderdesk_core::UserId;

use crate::app::routes::common::{parse_id, require};
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new().route("/parties/:id", put(upsert_party))
}

pub async fn upsert_party(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpsertPartyRequest>,
) -> axum::response::Response {
    if let Err(resp) = require(&principal, Role::Admin) {
        return resp;
    }
    let user_id: UserId = match parse_id(&id, "user") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.directory.upsert(body.into_party(user_id)).await {
        Ok(party) => Json(party).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
