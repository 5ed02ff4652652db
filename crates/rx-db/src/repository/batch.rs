//! # Batch Repository
//!
//! The inventory store interface: receiving batches, manual adjustments,
//! and the eligibility reads the dispense engine builds on.
//!
//! ## Eligibility
//! ```text
//! A batch is eligible for validation and allocation iff
//!     quantity_on_hand > 0  AND  expiry_date > now
//! ```
//! Both the availability sum and the FEFO fetch use exactly this predicate,
//! so the validator and the allocator can never disagree about which stock
//! counts.
//!
//! ## Guarded Writes
//! Every decrement is of the form
//! `SET quantity_on_hand = quantity_on_hand - ?n WHERE ... AND quantity_on_hand >= ?n`;
//! zero rows affected means someone else took the stock first. The schema's
//! CHECK constraint backs this up.

use chrono::{DateTime, Utc};
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::movement;
use rx_core::types::{Batch, MovementType, NewBatch};

/// Repository for batch (inventory lot) operations.
#[derive(Debug, Clone)]
pub struct BatchRepository {
    pool: SqlitePool,
}

impl BatchRepository {
    /// Creates a new BatchRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BatchRepository { pool }
    }

    /// Receives a batch into stock.
    ///
    /// Inserts the batch and appends the matching `IN` movement to the
    /// audit ledger in one transaction; the reference is the lot's batch
    /// number.
    pub async fn receive(&self, new: &NewBatch, received_by_user_id: i64) -> DbResult<Batch> {
        debug!(
            medicine_id = new.medicine_id,
            batch_number = %new.batch_number,
            quantity = new.quantity_on_hand,
            "Receiving batch"
        );

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO batches (
                medicine_id, batch_number, expiry_date, quantity_on_hand,
                purchase_price_cents, selling_price_cents, supplier_id, received_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(new.medicine_id)
        .bind(&new.batch_number)
        .bind(new.expiry_date)
        .bind(new.quantity_on_hand)
        .bind(new.purchase_price_cents)
        .bind(new.selling_price_cents)
        .bind(new.supplier_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let batch_id = result.last_insert_rowid();

        movement::insert(
            &mut *tx,
            batch_id,
            MovementType::In,
            new.quantity_on_hand,
            received_by_user_id,
            now,
            Some(&new.batch_number),
        )
        .await?;

        tx.commit().await?;

        Ok(Batch {
            batch_id,
            medicine_id: new.medicine_id,
            batch_number: new.batch_number.clone(),
            expiry_date: new.expiry_date,
            quantity_on_hand: new.quantity_on_hand,
            purchase_price_cents: new.purchase_price_cents,
            selling_price_cents: new.selling_price_cents,
            supplier_id: new.supplier_id,
            received_date: now,
        })
    }

    /// Applies a signed manual adjustment to a batch's quantity and
    /// appends the matching `ADJUSTMENT` movement.
    ///
    /// The adjustment cannot drive the quantity negative: the schema CHECK
    /// rejects it and the call returns [`DbError::CheckViolation`].
    pub async fn adjust(
        &self,
        batch_id: i64,
        delta: i64,
        performed_by_user_id: i64,
        reference: Option<&str>,
    ) -> DbResult<()> {
        debug!(batch_id, delta, "Adjusting batch quantity");

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE batches
            SET quantity_on_hand = quantity_on_hand + ?2
            WHERE batch_id = ?1
            "#,
        )
        .bind(batch_id)
        .bind(delta)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Batch", batch_id));
        }

        movement::insert(
            &mut *tx,
            batch_id,
            MovementType::Adjustment,
            delta,
            performed_by_user_id,
            now,
            reference,
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Gets a batch by ID.
    pub async fn get_by_id(&self, batch_id: i64) -> DbResult<Option<Batch>> {
        let batch = sqlx::query_as::<_, Batch>(&format!(
            "{SELECT_BATCH} WHERE batch_id = ?1"
        ))
        .bind(batch_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(batch)
    }

    /// Lists all batches of one medicine, soonest expiry first.
    pub async fn list_for_medicine(&self, medicine_id: i64) -> DbResult<Vec<Batch>> {
        let batches = sqlx::query_as::<_, Batch>(&format!(
            "{SELECT_BATCH} WHERE medicine_id = ?1 ORDER BY datetime(expiry_date), batch_id"
        ))
        .bind(medicine_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(batches)
    }

    /// Eligible batches of one medicine as of now, in FEFO order.
    pub async fn eligible_for_medicine(&self, medicine_id: i64) -> DbResult<Vec<Batch>> {
        eligible(&self.pool, medicine_id, Utc::now()).await
    }

    /// Total eligible units of one medicine as of now.
    pub async fn available_quantity(&self, medicine_id: i64) -> DbResult<i64> {
        available(&self.pool, medicine_id, Utc::now()).await
    }
}

/// Shared column list so standalone and transactional reads stay in sync.
const SELECT_BATCH: &str = r#"
    SELECT batch_id, medicine_id, batch_number, expiry_date, quantity_on_hand,
           purchase_price_cents, selling_price_cents, supplier_id, received_date
    FROM batches
"#;

/// Eligible batches of one medicine, ordered by expiry then batch id.
///
/// Runs against the pool or inside the dispense transaction.
pub(crate) async fn eligible(
    executor: impl SqliteExecutor<'_>,
    medicine_id: i64,
    now: DateTime<Utc>,
) -> DbResult<Vec<Batch>> {
    let batches = sqlx::query_as::<_, Batch>(&format!(
        r#"
        {SELECT_BATCH}
        WHERE medicine_id = ?1
          AND quantity_on_hand > 0
          AND datetime(expiry_date) > datetime(?2)
        ORDER BY datetime(expiry_date), batch_id
        "#
    ))
    .bind(medicine_id)
    .bind(now)
    .fetch_all(executor)
    .await?;

    Ok(batches)
}

/// Sum of eligible quantity for one medicine - the validator's read.
pub(crate) async fn available(
    executor: impl SqliteExecutor<'_>,
    medicine_id: i64,
    now: DateTime<Utc>,
) -> DbResult<i64> {
    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(quantity_on_hand), 0)
        FROM batches
        WHERE medicine_id = ?1
          AND quantity_on_hand > 0
          AND datetime(expiry_date) > datetime(?2)
        "#,
    )
    .bind(medicine_id)
    .bind(now)
    .fetch_one(executor)
    .await?;

    Ok(total)
}

/// Guarded decrement: takes `quantity` units from the batch only if they
/// are still there. Returns false when the stock was gone, which the
/// coordinator reports as a concurrency conflict.
pub(crate) async fn decrement_guarded(
    executor: impl SqliteExecutor<'_>,
    batch_id: i64,
    quantity: i64,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE batches
        SET quantity_on_hand = quantity_on_hand - ?2
        WHERE batch_id = ?1
          AND quantity_on_hand >= ?2
        "#,
    )
    .bind(batch_id)
    .bind(quantity)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}
