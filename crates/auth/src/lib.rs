//! `orderdesk-auth`: authentication/authorization boundary.
//!
//! Decoupled from HTTP and storage: the API layer extracts a bearer token,
//! validates it here and gets back a [`Principal`].

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod principal;

pub use authorize::{AuthzError, require_role};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, JwtValidator};
pub use orderdesk_core::{Role, UserId};
pub use principal::Principal;
