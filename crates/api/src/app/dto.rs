use serde::Deserialize;

use orderdesk_core::{Role, UserId};
use orderdesk_parties::{ContactInfo, Party};
use orderdesk_units::UnitCode;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status: String,
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelOrderRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustStockRequest {
    /// Signed change; negative values are corrections.
    pub delta: f64,
    pub unit_code: UnitCode,
}

#[derive(Debug, Default, Deserialize)]
pub struct StockQuery {
    pub unit: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertPartyRequest {
    pub full_name: String,
    pub email: String,
    pub contact_number: Option<String>,
    pub role: Role,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl UpsertPartyRequest {
    pub fn into_party(self, id: UserId) -> Party {
        Party {
            id,
            full_name: self.full_name,
            contact: ContactInfo {
                email: self.email,
                contact_number: self.contact_number,
            },
            role: self.role,
            is_active: self.is_active,
        }
    }
}
