//! # Dispense Transaction Coordinator
//!
//! Converts a customer order into a committed sale while allocating
//! physical inventory correctly, atomically, and under concurrent access.
//!
//! ## Transaction Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  dispense(order, acting_user_id)                                         │
//! │                                                                         │
//! │  BEGIN ────────────────────────────────────────────────────┐            │
//! │   │ 1. Validate: per line, sum eligible stock              │            │
//! │   │      short? ──► InsufficientStock (nothing written)    │            │
//! │   │ 2. Sequence: count today's sales + 1 ──► INV number    │  one       │
//! │   │ 3. Insert sale header (total = 0)                      │  atomic    │
//! │   │ 4. Per line, in input order:                           │  scope     │
//! │   │      FEFO plan ──► insert item                         │            │
//! │   │                ──► guarded batch decrement             │            │
//! │   │                ──► append OUT movement                 │            │
//! │   │ 5. Persist accumulated total                           │            │
//! │  COMMIT ───────────────────────────────────────────────────┘            │
//! │                                                                         │
//! │  Any failure at any step drops the transaction: no sale, item,         │
//! │  movement or batch mutation survives a failed attempt.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//! Two dispenses on disjoint batches proceed in parallel. On the same
//! batch, the loser of the race either sees the reduced stock during
//! validation (InsufficientStock) or fails the guarded decrement / write
//! upgrade and gets a retryable [`DispenseError::ConcurrencyConflict`].
//! The invoice sequence is computed inside the same transaction, with the
//! UNIQUE constraint as a backstop, so numbers stay gapless per date and
//! never duplicate.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info};

use crate::error::DbError;
use crate::repository::{batch, medicine, movement, sale};
use rx_core::error::CoreError;
use rx_core::money::Money;
use rx_core::types::{MovementType, Order, Sale, SaleItem, SaleWithItems};
use rx_core::{fefo, invoice, validation};

// =============================================================================
// Dispense Error
// =============================================================================

/// What a caller of [`DispenseService::dispense`] can get back.
///
/// Business failures are values, not panics; storage faults keep their
/// own channel. `ConcurrencyConflict` and `AllocationExhausted` mean the
/// order itself may be fine - resubmitting is safe because a failed
/// attempt persists nothing.
#[derive(Debug, Error)]
pub enum DispenseError {
    /// Business rule failure: insufficient stock, exhausted allocation,
    /// empty or oversized order.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Lost a race against a concurrent dispense; retry the whole call.
    #[error("concurrent dispense conflict, retry the order")]
    ConcurrencyConflict,

    /// A referenced record vanished between validation and posting.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// The store itself failed; not retryable without backoff.
    #[error(transparent)]
    Storage(DbError),
}

impl DispenseError {
    /// Whether resubmitting the same order may succeed without any
    /// intervention.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DispenseError::ConcurrencyConflict
                | DispenseError::Core(CoreError::AllocationExhausted { .. })
        )
    }
}

impl From<DbError> for DispenseError {
    fn from(err: DbError) -> Self {
        match err {
            // Busy writers and duplicate invoice numbers are both lost
            // races, reported uniformly as retryable contention.
            DbError::Busy(_) | DbError::PoolExhausted => DispenseError::ConcurrencyConflict,
            DbError::UniqueViolation { ref field } if field.contains("invoice_number") => {
                DispenseError::ConcurrencyConflict
            }
            other => DispenseError::Storage(other),
        }
    }
}

// =============================================================================
// Dispense Service
// =============================================================================

/// The dispense transaction coordinator.
///
/// Stateless besides the pool handle; one call = one transaction.
#[derive(Debug, Clone)]
pub struct DispenseService {
    pool: SqlitePool,
}

impl DispenseService {
    /// Creates a new DispenseService.
    pub fn new(pool: SqlitePool) -> Self {
        DispenseService { pool }
    }

    /// Dispenses an order as one atomic, all-or-nothing operation.
    ///
    /// On success returns the fully populated sale aggregate: generated
    /// id, invoice number, and line items in allocation order. On any
    /// failure the store is left byte-for-byte unchanged.
    pub async fn dispense(
        &self,
        order: &Order,
        acting_user_id: i64,
    ) -> Result<SaleWithItems, DispenseError> {
        let order = validation::normalize_order(order)?;
        let now = Utc::now();

        debug!(
            lines = order.items.len(),
            acting_user_id, "Starting dispense transaction"
        );

        // Dropping `tx` on any early return rolls everything back.
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        // --- 1. Validate stock for every line before any write ------------
        for line in &order.items {
            let available = batch::available(&mut *tx, line.medicine_id, now).await?;
            if available < line.quantity {
                let medicine = medicine::fetch(&mut *tx, line.medicine_id)
                    .await?
                    .ok_or(DispenseError::NotFound {
                        entity: "Medicine",
                        id: line.medicine_id,
                    })?;
                return Err(CoreError::InsufficientStock {
                    medicine_id: line.medicine_id,
                    name: medicine.generic_name,
                    required: line.quantity,
                    available,
                }
                .into());
            }
        }

        // --- 2. Sequence the invoice number -------------------------------
        let (day_start, day_end) = day_bounds(now);
        let prior_sales = sale::count_between(&mut *tx, day_start, day_end).await?;
        let invoice_number = invoice::invoice_number(now.date_naive(), prior_sales as u32 + 1);

        // --- 3. Sale header, total persisted at the end -------------------
        let sale_id = sale::insert_sale(
            &mut *tx,
            &invoice_number,
            order.customer_id,
            acting_user_id,
            now,
            order.payment_method,
        )
        .await?;

        // --- 4. Allocate, post items, decrement stock, write the ledger ---
        let mut total = Money::zero();
        let mut items = Vec::new();

        for line in &order.items {
            let eligible = batch::eligible(&mut *tx, line.medicine_id, now).await?;
            let plan = fefo::allocate(line.medicine_id, &eligible, line.quantity)?;

            for allocation in plan {
                let sale_item_id = sale::insert_item(&mut *tx, sale_id, &allocation).await?;

                // Re-validates right before the write: stock may have moved
                // since our snapshot.
                let taken =
                    batch::decrement_guarded(&mut *tx, allocation.batch_id, allocation.quantity)
                        .await?;
                if !taken {
                    return Err(DispenseError::ConcurrencyConflict);
                }

                movement::insert(
                    &mut *tx,
                    allocation.batch_id,
                    MovementType::Out,
                    -allocation.quantity,
                    acting_user_id,
                    now,
                    Some(&invoice_number),
                )
                .await?;

                total += allocation.subtotal();
                items.push(SaleItem {
                    sale_item_id,
                    sale_id,
                    batch_id: allocation.batch_id,
                    quantity: allocation.quantity,
                    unit_price_cents: allocation.unit_price_cents,
                    subtotal_cents: allocation.subtotal().cents(),
                });
            }
        }

        // --- 5. Persist the total and commit ------------------------------
        sale::set_total(&mut *tx, sale_id, total.cents()).await?;
        tx.commit().await.map_err(DbError::from)?;

        info!(
            sale_id,
            invoice_number = %invoice_number,
            total_cents = total.cents(),
            items = items.len(),
            "Dispense committed"
        );

        Ok(SaleWithItems {
            sale: Sale {
                sale_id,
                invoice_number,
                customer_id: order.customer_id,
                sold_by_user_id: acting_user_id,
                sale_date: now,
                payment_method: order.payment_method,
                total_cents: total.cents(),
            },
            items,
        })
    }
}

/// Half-open UTC day window containing `now`, for invoice sequencing.
fn day_bounds(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}
