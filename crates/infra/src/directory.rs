//! Account snapshots mirrored from the identity system.
//!
//! Placement and lifecycle only read parties; this is the one write path.

use std::sync::Arc;

use tracing::{info, instrument};

use orderdesk_core::UserId;
use orderdesk_orders::OrderError;
use orderdesk_parties::Party;

use crate::error::ServiceError;
use crate::store::Store;

#[derive(Clone)]
pub struct PartyDirectory {
    store: Arc<dyn Store>,
}

impl PartyDirectory {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Insert or replace the snapshot for `party.id`.
    #[instrument(skip(self, party), fields(user_id = %party.id, role = %party.role))]
    pub async fn upsert(&self, party: Party) -> Result<Party, ServiceError> {
        if party.full_name.trim().is_empty() {
            return Err(OrderError::validation("fullName cannot be empty").into());
        }
        if !party.contact.email.contains('@') {
            return Err(OrderError::validation("email must be an address").into());
        }

        let mut tx = self.store.begin().await?;
        tx.upsert_party(&party).await?;
        tx.commit().await?;

        info!(active = party.is_active, "party synced");
        Ok(party)
    }

    pub async fn get(&self, id: UserId) -> Result<Party, ServiceError> {
        let mut tx = self.store.begin().await?;
        Ok(tx.find_party(id).await?.ok_or(OrderError::NotFound)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use orderdesk_core::Role;

    #[tokio::test]
    async fn upsert_replaces_existing_snapshot() {
        let directory = PartyDirectory::new(Arc::new(InMemoryStore::new()));
        let mut party = Party::new("Sam Supplier", "sam@example.com", Role::Supplier);
        directory.upsert(party.clone()).await.unwrap();

        party.is_active = false;
        directory.upsert(party.clone()).await.unwrap();

        let stored = directory.get(party.id).await.unwrap();
        assert!(!stored.is_active);
    }

    #[tokio::test]
    async fn rejects_blank_names_and_unknown_ids() {
        let directory = PartyDirectory::new(Arc::new(InMemoryStore::new()));
        let err = directory
            .upsert(Party::new("  ", "x@example.com", Role::Buyer))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Order(OrderError::Validation(_))));

        let err = directory.get(UserId::new()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Order(OrderError::NotFound)));
    }
}
