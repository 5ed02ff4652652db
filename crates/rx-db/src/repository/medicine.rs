//! # Medicine Repository
//!
//! Catalog reads and writes at the interface boundary. The dispense engine
//! only ever reads this table (to name a medicine in a stock diagnostic);
//! catalog management beyond insert/list lives outside the core.

use sqlx::{SqliteExecutor, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use rx_core::types::{Medicine, NewMedicine};

/// Repository for medicine catalog operations.
#[derive(Debug, Clone)]
pub struct MedicineRepository {
    pool: SqlitePool,
}

impl MedicineRepository {
    /// Creates a new MedicineRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MedicineRepository { pool }
    }

    /// Inserts a medicine and returns it with its generated id.
    pub async fn insert(&self, new: &NewMedicine) -> DbResult<Medicine> {
        debug!(generic_name = %new.generic_name, "Inserting medicine");

        let result = sqlx::query(
            r#"
            INSERT INTO medicines (generic_name, brand_name, strength, form, unit, reorder_level)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&new.generic_name)
        .bind(&new.brand_name)
        .bind(&new.strength)
        .bind(&new.form)
        .bind(&new.unit)
        .bind(new.reorder_level)
        .execute(&self.pool)
        .await?;

        Ok(Medicine {
            medicine_id: result.last_insert_rowid(),
            generic_name: new.generic_name.clone(),
            brand_name: new.brand_name.clone(),
            strength: new.strength.clone(),
            form: new.form.clone(),
            unit: new.unit.clone(),
            reorder_level: new.reorder_level,
        })
    }

    /// Gets a medicine by ID.
    pub async fn get_by_id(&self, medicine_id: i64) -> DbResult<Option<Medicine>> {
        fetch(&self.pool, medicine_id).await
    }

    /// Lists the catalog ordered by generic name.
    pub async fn list(&self) -> DbResult<Vec<Medicine>> {
        let medicines = sqlx::query_as::<_, Medicine>(
            r#"
            SELECT medicine_id, generic_name, brand_name, strength, form, unit, reorder_level
            FROM medicines
            ORDER BY generic_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(medicines)
    }
}

/// Fetches one medicine; usable inside the dispense transaction.
pub(crate) async fn fetch(
    executor: impl SqliteExecutor<'_>,
    medicine_id: i64,
) -> DbResult<Option<Medicine>> {
    let medicine = sqlx::query_as::<_, Medicine>(
        r#"
        SELECT medicine_id, generic_name, brand_name, strength, form, unit, reorder_level
        FROM medicines
        WHERE medicine_id = ?1
        "#,
    )
    .bind(medicine_id)
    .fetch_optional(executor)
    .await?;

    Ok(medicine)
}
