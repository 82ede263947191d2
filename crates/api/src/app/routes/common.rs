use std::str::FromStr;

use axum::response::Response;

use orderdesk_auth::{Role, require_role};

use crate::app::errors;
use crate::context::PrincipalContext;

/// Gate a handler on the caller's acting role.
pub fn require(principal: &PrincipalContext, role: Role) -> Result<(), Response> {
    require_role(&principal.principal(), role).map_err(errors::authz_error_to_response)
}

pub fn parse_id<T: FromStr>(raw: &str, what: &str) -> Result<T, Response> {
    raw.parse().map_err(|_| errors::invalid_id(what))
}
