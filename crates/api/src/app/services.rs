//! Engine wiring: one persistence handle shared by every engine.

use std::sync::Arc;

use orderdesk_infra::{
    CatalogService, OrderLifecycleEngine, OrderPlacementEngine, OrderQueries, PartyDirectory,
    ServiceError, Store, StoreError,
};
use orderdesk_units::UnitTable;

#[derive(Clone)]
pub struct AppServices {
    pub placement: OrderPlacementEngine,
    pub lifecycle: OrderLifecycleEngine,
    pub queries: OrderQueries,
    pub catalog: CatalogService,
    pub directory: PartyDirectory,
}

impl AppServices {
    /// Load the unit table once and build every engine over `store`.
    pub async fn build(
        store: Arc<dyn Store>,
        default_currency: &str,
    ) -> Result<Self, ServiceError> {
        let units = UnitTable::new(store.load_units().await?)
            .map_err(|e| StoreError::Integrity(format!("unit table: {e}")))?;
        let units = Arc::new(units);

        Ok(Self {
            placement: OrderPlacementEngine::new(store.clone(), units.clone(), default_currency),
            lifecycle: OrderLifecycleEngine::new(store.clone(), units.clone()),
            queries: OrderQueries::new(store.clone()),
            catalog: CatalogService::new(store.clone(), units),
            directory: PartyDirectory::new(store),
        })
    }
}
