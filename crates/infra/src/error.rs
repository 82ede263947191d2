use thiserror::Error;

use orderdesk_catalog::CatalogError;
use orderdesk_orders::OrderError;

use crate::store::StoreError;

/// Failure of an engine operation.
///
/// `Order` and `Catalog` are business rejections; `Store` is an
/// infrastructure failure. In every case the transaction was rolled back.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
