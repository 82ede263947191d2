use thiserror::Error;

use orderdesk_core::Role;

use crate::Principal;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: requires role '{required}', caller is '{actual}'")]
    Forbidden { required: Role, actual: Role },
}

/// Require the principal to act in `required`.
///
/// Pure policy check: no IO, no ownership rules (those belong to the engines).
pub fn require_role(principal: &Principal, required: Role) -> Result<(), AuthzError> {
    if principal.role == required {
        Ok(())
    } else {
        Err(AuthzError::Forbidden {
            required,
            actual: principal.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orderdesk_core::UserId;

    #[test]
    fn matching_role_is_allowed() {
        let p = Principal::new(UserId::new(), Role::Supplier);
        assert_eq!(require_role(&p, Role::Supplier), Ok(()));
    }

    #[test]
    fn other_roles_are_forbidden() {
        let p = Principal::new(UserId::new(), Role::Buyer);
        let err = require_role(&p, Role::Supplier).unwrap_err();
        assert_eq!(
            err.to_string(),
            "forbidden: requires role 'supplier', caller is 'buyer'"
        );
    }
}
