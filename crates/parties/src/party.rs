use serde::{Deserialize, Serialize};

use orderdesk_core::{Role, UserId};

/// Contact information for a party.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    pub email: String,
    pub contact_number: Option<String>,
}

/// Account snapshot of a buyer, supplier or admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    pub id: UserId,
    pub full_name: String,
    pub contact: ContactInfo,
    pub role: Role,
    pub is_active: bool,
}

impl Party {
    pub fn new(full_name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id: UserId::new(),
            full_name: full_name.into(),
            contact: ContactInfo {
                email: email.into(),
                contact_number: None,
            },
            role,
            is_active: true,
        }
    }

    /// Active account holding the supplier role.
    pub fn is_active_supplier(&self) -> bool {
        self.is_active && self.role == Role::Supplier
    }

    pub fn summary(&self) -> PartySummary {
        PartySummary {
            id: self.id,
            full_name: self.full_name.clone(),
            email: self.contact.email.clone(),
            contact_number: self.contact.contact_number.clone(),
        }
    }
}

/// Buyer/supplier summary embedded in order responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartySummary {
    pub id: UserId,
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_number: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_active_suppliers_qualify() {
        let mut supplier = Party::new("Mill Co", "mill@example.com", Role::Supplier);
        assert!(supplier.is_active_supplier());

        supplier.is_active = false;
        assert!(!supplier.is_active_supplier());

        let buyer = Party::new("Bakery", "bakery@example.com", Role::Buyer);
        assert!(!buyer.is_active_supplier());
    }

    #[test]
    fn summary_omits_missing_contact_number() {
        let party = Party::new("Bakery", "bakery@example.com", Role::Buyer);
        let json = serde_json::to_value(party.summary()).unwrap();
        assert_eq!(json["fullName"], "Bakery");
        assert!(json.get("contactNumber").is_none());
    }
}
