//! # Sale Repository
//!
//! Lookups over committed sales. Sales are only ever created by the
//! dispense coordinator, inside its transaction, through the helpers at
//! the bottom of this file - there is no standalone "insert sale" API.
//!
//! ## Snapshot Pattern
//! Sale items carry the unit price copied from the batch at allocation
//! time. Price changes after the sale never rewrite history.

use chrono::{DateTime, Utc};
use sqlx::{SqliteExecutor, SqlitePool};

use crate::error::DbResult;
use rx_core::fefo::Allocation;
use rx_core::types::{PaymentMethod, Sale, SaleItem, SaleWithItems};

/// Repository for sale lookups.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale with its line items.
    pub async fn get_with_items(&self, sale_id: i64) -> DbResult<Option<SaleWithItems>> {
        let Some(sale) = fetch_sale(&self.pool, sale_id).await? else {
            return Ok(None);
        };
        let items = fetch_items(&self.pool, sale_id).await?;
        Ok(Some(SaleWithItems { sale, items }))
    }

    /// Gets a sale by its invoice number, with items.
    pub async fn get_by_invoice(&self, invoice_number: &str) -> DbResult<Option<SaleWithItems>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "{SELECT_SALE} WHERE invoice_number = ?1"
        ))
        .bind(invoice_number)
        .fetch_optional(&self.pool)
        .await?;

        let Some(sale) = sale else { return Ok(None) };
        let items = fetch_items(&self.pool, sale.sale_id).await?;
        Ok(Some(SaleWithItems { sale, items }))
    }

    /// Most recent sales first.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "{SELECT_SALE} ORDER BY datetime(sale_date) DESC, sale_id DESC LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }
}

const SELECT_SALE: &str = r#"
    SELECT sale_id, invoice_number, customer_id, sold_by_user_id,
           sale_date, payment_method, total_cents
    FROM sales
"#;

/// Fetches one sale; usable inside the dispense transaction.
pub(crate) async fn fetch_sale(
    executor: impl SqliteExecutor<'_>,
    sale_id: i64,
) -> DbResult<Option<Sale>> {
    let sale = sqlx::query_as::<_, Sale>(&format!("{SELECT_SALE} WHERE sale_id = ?1"))
        .bind(sale_id)
        .fetch_optional(executor)
        .await?;

    Ok(sale)
}

/// Fetches the items of one sale in insertion order.
pub(crate) async fn fetch_items(
    executor: impl SqliteExecutor<'_>,
    sale_id: i64,
) -> DbResult<Vec<SaleItem>> {
    let items = sqlx::query_as::<_, SaleItem>(
        r#"
        SELECT sale_item_id, sale_id, batch_id, quantity, unit_price_cents, subtotal_cents
        FROM sale_items
        WHERE sale_id = ?1
        ORDER BY sale_item_id
        "#,
    )
    .bind(sale_id)
    .fetch_all(executor)
    .await?;

    Ok(items)
}

/// Inserts the sale header with a zero total; the coordinator persists the
/// real total just before commit.
pub(crate) async fn insert_sale(
    executor: impl SqliteExecutor<'_>,
    invoice_number: &str,
    customer_id: Option<i64>,
    sold_by_user_id: i64,
    sale_date: DateTime<Utc>,
    payment_method: PaymentMethod,
) -> DbResult<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO sales (
            invoice_number, customer_id, sold_by_user_id, sale_date, payment_method, total_cents
        ) VALUES (?1, ?2, ?3, ?4, ?5, 0)
        "#,
    )
    .bind(invoice_number)
    .bind(customer_id)
    .bind(sold_by_user_id)
    .bind(sale_date)
    .bind(payment_method)
    .execute(executor)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Inserts one line item from an allocation.
pub(crate) async fn insert_item(
    executor: impl SqliteExecutor<'_>,
    sale_id: i64,
    allocation: &Allocation,
) -> DbResult<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO sale_items (sale_id, batch_id, quantity, unit_price_cents, subtotal_cents)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(sale_id)
    .bind(allocation.batch_id)
    .bind(allocation.quantity)
    .bind(allocation.unit_price_cents)
    .bind(allocation.subtotal().cents())
    .execute(executor)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Persists the final total onto the sale.
pub(crate) async fn set_total(
    executor: impl SqliteExecutor<'_>,
    sale_id: i64,
    total_cents: i64,
) -> DbResult<()> {
    sqlx::query("UPDATE sales SET total_cents = ?2 WHERE sale_id = ?1")
        .bind(sale_id)
        .bind(total_cents)
        .execute(executor)
        .await?;

    Ok(())
}

/// Number of sales recorded in the half-open date window - the invoice
/// sequencer's read, always executed inside the dispense transaction.
pub(crate) async fn count_between(
    executor: impl SqliteExecutor<'_>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> DbResult<i64> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM sales
        WHERE datetime(sale_date) >= datetime(?1)
          AND datetime(sale_date) < datetime(?2)
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_one(executor)
    .await?;

    Ok(count)
}
