//! # Stock Movement Repository
//!
//! Reads over the append-only audit ledger. Every quantity change to a
//! batch - receipt, dispense, adjustment - leaves exactly one row here,
//! written in the same transaction as the change itself. There is no
//! update or delete path.

use chrono::{DateTime, Utc};
use sqlx::{SqliteExecutor, SqlitePool};

use crate::error::DbResult;
use rx_core::types::{MovementType, StockMovement};

/// Repository for stock movement ledger reads.
#[derive(Debug, Clone)]
pub struct MovementRepository {
    pool: SqlitePool,
}

impl MovementRepository {
    /// Creates a new MovementRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MovementRepository { pool }
    }

    /// All movements for a batch, oldest first.
    pub async fn for_batch(&self, batch_id: i64) -> DbResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT movement_id, batch_id, movement_type, quantity,
                   performed_by_user_id, performed_at, reference
            FROM stock_movements
            WHERE batch_id = ?1
            ORDER BY movement_id
            "#,
        )
        .bind(batch_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Sum of signed deltas for a batch; equals its lifetime net change.
    pub async fn net_change(&self, batch_id: i64) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0) FROM stock_movements WHERE batch_id = ?1",
        )
        .bind(batch_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }
}

/// Appends one ledger row; usable inside the dispense transaction.
pub(crate) async fn insert(
    executor: impl SqliteExecutor<'_>,
    batch_id: i64,
    movement_type: MovementType,
    quantity: i64,
    performed_by_user_id: i64,
    performed_at: DateTime<Utc>,
    reference: Option<&str>,
) -> DbResult<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO stock_movements (
            batch_id, movement_type, quantity, performed_by_user_id, performed_at, reference
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(batch_id)
    .bind(movement_type)
    .bind(quantity)
    .bind(performed_by_user_id)
    .bind(performed_at)
    .bind(reference)
    .execute(executor)
    .await?;

    Ok(result.last_insert_rowid())
}
