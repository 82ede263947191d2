//! Postgres-backed store.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (serialization failure / deadlock) | `40001` / `40P01` | `Conflict` |
//! | Database (foreign key violation) | `23503` | `Integrity` |
//! | Database (check constraint violation) | `23514` | `Integrity` |
//! | Database (other), PoolClosed, Io, ... | any other | `Database` |
//! | ColumnDecode / Decode | N/A | `Decode` |
//!
//! ## Locking
//!
//! `lock_order` takes `SELECT ... FOR UPDATE` on the order header, and
//! `lock_inventory` does the same on the stock row after creating it if
//! missing. Two concurrent approvals against the same product are therefore
//! serialized on that row, and `set_inventory` writes the value the ledger
//! computed under the lock. `inventory.quantity` carries a `CHECK (>= 0)`.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use orderdesk_catalog::Product;
use orderdesk_core::{OrderId, OrderItemId, ProductId, Role, StatusChangeId, UserId};
use orderdesk_orders::{Order, OrderItem, OrderStatus, StatusChange};
use orderdesk_parties::{ContactInfo, Party};
use orderdesk_units::{Dimension, Unit, UnitCode};

use super::r#trait::{Store, StoreError, StoreTx};

/// Postgres-backed store over a shared connection pool.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Apply the bundled migrations (`crates/infra/migrations`).
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("migration failed: {e}")))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin", e))?;
        Ok(Box::new(PostgresTx { tx }))
    }

    #[instrument(skip(self), err)]
    async fn load_units(&self) -> Result<Vec<Unit>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT code, name, dimension, factor_to_base, is_base_unit
            FROM units
            ORDER BY dimension, factor_to_base
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_units", e))?;

        rows.iter().map(unit_from_row).collect()
    }
}

struct PostgresTx {
    tx: Transaction<'static, Postgres>,
}

const ORDER_COLUMNS: &str =
    "id, buyer_id, supplier_id, status, total_amount, currency, created_at, updated_at";

impl PostgresTx {
    async fn fetch_order(
        &mut self,
        id: OrderId,
        for_update: bool,
    ) -> Result<Option<Order>, StoreError> {
        let sql = if for_update {
            format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE")
        } else {
            format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1")
        };

        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("fetch_order", e))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = sqlx::query(
            r#"
            SELECT id, order_id, product_id, product_name, unit_code, quantity, unit_price,
                   total_price, quantity_base, base_unit_code, base_unit_price
            FROM order_items
            WHERE order_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("fetch_order_items", e))?
        .iter()
        .map(item_from_row)
        .collect::<Result<Vec<_>, _>>()?;

        order_from_row(&row, items).map(Some)
    }
}

#[async_trait]
impl StoreTx for PostgresTx {
    async fn find_party(&mut self, id: UserId) -> Result<Option<Party>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, full_name, email, contact_number, role, is_active
            FROM parties
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("find_party", e))?;

        row.as_ref().map(party_from_row).transpose()
    }

    #[instrument(skip(self, party), fields(party_id = %party.id), err)]
    async fn upsert_party(&mut self, party: &Party) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO parties (id, full_name, email, contact_number, role, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                full_name = EXCLUDED.full_name,
                email = EXCLUDED.email,
                contact_number = EXCLUDED.contact_number,
                role = EXCLUDED.role,
                is_active = EXCLUDED.is_active
            "#,
        )
        .bind(party.id.as_uuid())
        .bind(&party.full_name)
        .bind(&party.contact.email)
        .bind(&party.contact.contact_number)
        .bind(party.role.as_str())
        .bind(party.is_active)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("upsert_party", e))?;
        Ok(())
    }

    async fn find_product(&mut self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, supplier_id, name, description, price, base_unit, category,
                   image_url, is_active, created_at, updated_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("find_product", e))?;

        row.as_ref().map(product_from_row).transpose()
    }

    #[instrument(skip(self, product), fields(product_id = %product.id), err)]
    async fn insert_product(&mut self, product: &Product) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO products (
                id, supplier_id, name, description, price, base_unit, category,
                image_url, is_active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(product.supplier_id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.base_unit.as_str())
        .bind(&product.category)
        .bind(&product.image_url)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_product", e))?;
        Ok(())
    }

    #[instrument(skip(self, product), fields(product_id = %product.id), err)]
    async fn update_product(&mut self, product: &Product) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = $2,
                description = $3,
                price = $4,
                category = $5,
                image_url = $6,
                is_active = $7,
                updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.category)
        .bind(&product.image_url)
        .bind(product.is_active)
        .bind(product.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("update_product", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Integrity(format!("product {} does not exist", product.id)));
        }
        Ok(())
    }

    async fn inventory_quantity(
        &mut self,
        product_id: ProductId,
    ) -> Result<Option<f64>, StoreError> {
        let row = sqlx::query("SELECT quantity FROM inventory WHERE product_id = $1")
            .bind(product_id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("inventory_quantity", e))?;

        row.map(|r| r.try_get::<f64, _>("quantity").map_err(decode_error))
            .transpose()
    }

    #[instrument(skip(self, product_id), fields(product_id = %product_id), err)]
    async fn lock_inventory(&mut self, product_id: ProductId) -> Result<f64, StoreError> {
        // A row created here disappears again if the transaction rolls back.
        sqlx::query(
            r#"
            INSERT INTO inventory (product_id, quantity, updated_at)
            VALUES ($1, 0, now())
            ON CONFLICT (product_id) DO NOTHING
            "#,
        )
        .bind(product_id.as_uuid())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("lock_inventory", e))?;

        let row = sqlx::query("SELECT quantity FROM inventory WHERE product_id = $1 FOR UPDATE")
            .bind(product_id.as_uuid())
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("lock_inventory", e))?;

        row.try_get::<f64, _>("quantity").map_err(decode_error)
    }

    #[instrument(skip(self, product_id), fields(product_id = %product_id), err)]
    async fn set_inventory(
        &mut self,
        product_id: ProductId,
        quantity: f64,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE inventory
            SET quantity = $2, updated_at = now()
            WHERE product_id = $1
            "#,
        )
        .bind(product_id.as_uuid())
        .bind(quantity)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("set_inventory", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Integrity(format!(
                "inventory row for product {product_id} was not locked"
            )));
        }
        Ok(())
    }

    async fn find_order(&mut self, id: OrderId) -> Result<Option<Order>, StoreError> {
        self.fetch_order(id, false).await
    }

    async fn lock_order(&mut self, id: OrderId) -> Result<Option<Order>, StoreError> {
        self.fetch_order(id, true).await
    }

    #[instrument(skip(self, order), fields(order_id = %order.id, items = order.items.len()), err)]
    async fn insert_order(&mut self, order: &Order) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO orders (
                id, buyer_id, supplier_id, status, total_amount, currency, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.buyer_id.as_uuid())
        .bind(order.supplier_id.as_uuid())
        .bind(order.status.as_str())
        .bind(order.total_amount)
        .bind(&order.currency)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_order", e))?;

        for (position, item) in order.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    id, order_id, position, product_id, product_name, unit_code, quantity,
                    unit_price, total_price, quantity_base, base_unit_code, base_unit_price
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                "#,
            )
            .bind(item.id.as_uuid())
            .bind(order.id.as_uuid())
            .bind(position as i32)
            .bind(item.product_id.as_uuid())
            .bind(&item.product_name)
            .bind(item.unit_code.as_str())
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.total_price)
            .bind(item.quantity_base)
            .bind(item.base_unit_code.as_str())
            .bind(item.base_unit_price)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("insert_order_item", e))?;
        }
        Ok(())
    }

    #[instrument(skip_all, fields(order_id = %id, status = %status), err)]
    async fn update_order_status(
        &mut self,
        id: OrderId,
        status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE orders SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(status.as_str())
            .bind(updated_at)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("update_order_status", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Integrity(format!("order {id} does not exist")));
        }
        Ok(())
    }

    async fn append_status_change(&mut self, change: &StatusChange) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO order_status_history (
                id, order_id, user_id, from_status, to_status, reason, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(change.id.as_uuid())
        .bind(change.order_id.as_uuid())
        .bind(change.user_id.as_uuid())
        .bind(change.from_status.map(|s| s.as_str()))
        .bind(change.to_status.as_str())
        .bind(&change.reason)
        .bind(change.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("append_status_change", e))?;
        Ok(())
    }

    async fn status_history(&mut self, order_id: OrderId) -> Result<Vec<StatusChange>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, order_id, user_id, from_status, to_status, reason, created_at
            FROM order_status_history
            WHERE order_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("status_history", e))?;

        rows.iter().map(status_change_from_row).collect()
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let PostgresTx { tx } = *self;
        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))
    }
}

/// Map SQLx errors to `StoreError`, tagging the failing operation.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") | Some("40001") | Some("40P01") => StoreError::Conflict(msg),
                Some("23503") | Some("23514") => StoreError::Integrity(msg),
                _ => StoreError::Database(msg),
            }
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StoreError::Decode(format!("{operation}: {err}"))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Database(format!("connection pool closed in {operation}"))
        }
        _ => StoreError::Database(format!("sqlx error in {operation}: {err}")),
    }
}

fn decode_error(err: sqlx::Error) -> StoreError {
    StoreError::Decode(err.to_string())
}

fn uuid_column(row: &PgRow, column: &str) -> Result<Uuid, StoreError> {
    row.try_get(column).map_err(decode_error)
}

fn text_column(row: &PgRow, column: &str) -> Result<String, StoreError> {
    row.try_get(column).map_err(decode_error)
}

// SQLx row mapping

fn unit_from_row(row: &PgRow) -> Result<Unit, StoreError> {
    let dimension: String = row.try_get("dimension").map_err(decode_error)?;
    Ok(Unit {
        code: UnitCode::new(text_column(row, "code")?),
        name: row.try_get("name").map_err(decode_error)?,
        dimension: Dimension::parse(&dimension)
            .ok_or_else(|| StoreError::Decode(format!("unknown dimension '{dimension}'")))?,
        factor_to_base: row.try_get("factor_to_base").map_err(decode_error)?,
        is_base_unit: row.try_get("is_base_unit").map_err(decode_error)?,
    })
}

fn party_from_row(row: &PgRow) -> Result<Party, StoreError> {
    let role: String = row.try_get("role").map_err(decode_error)?;
    Ok(Party {
        id: UserId::from_uuid(uuid_column(row, "id")?),
        full_name: row.try_get("full_name").map_err(decode_error)?,
        contact: ContactInfo {
            email: row.try_get("email").map_err(decode_error)?,
            contact_number: row.try_get("contact_number").map_err(decode_error)?,
        },
        role: Role::from_str(&role).map_err(|e| StoreError::Decode(e.to_string()))?,
        is_active: row.try_get("is_active").map_err(decode_error)?,
    })
}

fn product_from_row(row: &PgRow) -> Result<Product, StoreError> {
    Ok(Product {
        id: ProductId::from_uuid(uuid_column(row, "id")?),
        supplier_id: UserId::from_uuid(uuid_column(row, "supplier_id")?),
        name: row.try_get("name").map_err(decode_error)?,
        description: row.try_get("description").map_err(decode_error)?,
        price: row.try_get::<Decimal, _>("price").map_err(decode_error)?,
        base_unit: UnitCode::new(text_column(row, "base_unit")?),
        category: row.try_get("category").map_err(decode_error)?,
        image_url: row.try_get("image_url").map_err(decode_error)?,
        is_active: row.try_get("is_active").map_err(decode_error)?,
        created_at: row.try_get("created_at").map_err(decode_error)?,
        updated_at: row.try_get("updated_at").map_err(decode_error)?,
    })
}

fn parse_status(raw: &str) -> Result<OrderStatus, StoreError> {
    OrderStatus::from_str(raw).map_err(|e| StoreError::Decode(e.to_string()))
}

fn order_from_row(row: &PgRow, items: Vec<OrderItem>) -> Result<Order, StoreError> {
    let status: String = row.try_get("status").map_err(decode_error)?;
    Ok(Order {
        id: OrderId::from_uuid(uuid_column(row, "id")?),
        buyer_id: UserId::from_uuid(uuid_column(row, "buyer_id")?),
        supplier_id: UserId::from_uuid(uuid_column(row, "supplier_id")?),
        status: parse_status(&status)?,
        total_amount: row.try_get("total_amount").map_err(decode_error)?,
        currency: row.try_get("currency").map_err(decode_error)?,
        created_at: row.try_get("created_at").map_err(decode_error)?,
        updated_at: row.try_get("updated_at").map_err(decode_error)?,
        items,
    })
}

fn item_from_row(row: &PgRow) -> Result<OrderItem, StoreError> {
    Ok(OrderItem {
        id: OrderItemId::from_uuid(uuid_column(row, "id")?),
        order_id: OrderId::from_uuid(uuid_column(row, "order_id")?),
        product_id: ProductId::from_uuid(uuid_column(row, "product_id")?),
        product_name: row.try_get("product_name").map_err(decode_error)?,
        unit_code: UnitCode::new(text_column(row, "unit_code")?),
        quantity: row.try_get("quantity").map_err(decode_error)?,
        unit_price: row.try_get("unit_price").map_err(decode_error)?,
        total_price: row.try_get("total_price").map_err(decode_error)?,
        quantity_base: row.try_get("quantity_base").map_err(decode_error)?,
        base_unit_code: UnitCode::new(text_column(row, "base_unit_code")?),
        base_unit_price: row.try_get("base_unit_price").map_err(decode_error)?,
    })
}

fn status_change_from_row(row: &PgRow) -> Result<StatusChange, StoreError> {
    let from_status: Option<String> = row.try_get("from_status").map_err(decode_error)?;
    let to_status: String = row.try_get("to_status").map_err(decode_error)?;
    Ok(StatusChange {
        id: StatusChangeId::from_uuid(uuid_column(row, "id")?),
        order_id: OrderId::from_uuid(uuid_column(row, "order_id")?),
        user_id: UserId::from_uuid(uuid_column(row, "user_id")?),
        from_status: from_status.as_deref().map(parse_status).transpose()?,
        to_status: parse_status(&to_status)?,
        reason: row.try_get("reason").map_err(decode_error)?,
        created_at: row.try_get("created_at").map_err(decode_error)?,
    })
}
