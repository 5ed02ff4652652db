//! # Domain Types
//!
//! Core domain types used throughout RxPOS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                     │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Medicine     │   │     Batch       │   │      Sale       │       │
//! │  │  ─────────────  │◄──│  ─────────────  │   │  ─────────────  │       │
//! │  │  medicine_id    │   │  batch_id       │   │  sale_id        │       │
//! │  │  generic_name   │   │  expiry_date    │   │  invoice_number │       │
//! │  │  reorder_level  │   │  quantity_on_   │   │  total_cents    │       │
//! │  └─────────────────┘   │    hand         │   └────────┬────────┘       │
//! │                        └────────┬────────┘            │                │
//! │                                 │                     │                │
//! │                        ┌────────▼────────┐   ┌────────▼────────┐       │
//! │                        │ StockMovement   │   │    SaleItem     │       │
//! │                        │  (append-only   │   │  (price frozen  │       │
//! │                        │   audit ledger) │   │   at sale time) │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Relationships are expressed as plain integer keys resolved through the
//! store, never as embedded live references. That keeps the records `Clone`
//! and acyclic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Medicine
// =============================================================================

/// A catalog medicine. Identity is immutable; attributes are not.
///
/// The dispense engine reads this table (for availability diagnostics)
/// but never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Medicine {
    /// Unique identifier.
    pub medicine_id: i64,

    /// Generic (INN) name shown in stock diagnostics.
    pub generic_name: String,

    /// Brand name, if marketed under one.
    pub brand_name: String,

    /// Strength, e.g. "500mg".
    pub strength: String,

    /// Dosage form, e.g. "Tablet".
    pub form: String,

    /// Unit of measure, e.g. "Box".
    pub unit: String,

    /// Reorder threshold for restocking workflows.
    pub reorder_level: i64,
}

/// Fields for inserting a new medicine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMedicine {
    pub generic_name: String,
    pub brand_name: String,
    pub strength: String,
    pub form: String,
    pub unit: String,
    pub reorder_level: i64,
}

// =============================================================================
// Batch
// =============================================================================

/// A received lot of one medicine with its own expiry, quantity and price.
///
/// Invariant: `quantity_on_hand >= 0` at all times. Only the dispense
/// engine and the stock-adjustment interface decrement it, both via
/// guarded updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Batch {
    pub batch_id: i64,
    pub medicine_id: i64,
    /// Supplier-assigned lot number.
    pub batch_number: String,
    pub expiry_date: DateTime<Utc>,
    pub quantity_on_hand: i64,
    /// What the pharmacy paid per unit (frozen at receipt).
    pub purchase_price_cents: i64,
    /// Current selling price per unit; copied onto sale items at
    /// allocation time so later price changes never rewrite history.
    pub selling_price_cents: i64,
    pub supplier_id: Option<i64>,
    pub received_date: DateTime<Utc>,
}

impl Batch {
    /// Eligibility predicate for validation and allocation: the batch has
    /// stock and has not expired as of `now`.
    #[inline]
    pub fn is_eligible(&self, now: DateTime<Utc>) -> bool {
        self.quantity_on_hand > 0 && self.expiry_date > now
    }

    /// Returns the selling price as Money.
    #[inline]
    pub fn selling_price(&self) -> Money {
        Money::from_cents(self.selling_price_cents)
    }

    /// Builds an in-memory lot for allocation planning and tests.
    ///
    /// Purchase price and received date get placeholder values; the
    /// allocator only looks at expiry, quantity and selling price.
    pub fn lot(
        batch_id: i64,
        medicine_id: i64,
        batch_number: &str,
        expiry_date: DateTime<Utc>,
        quantity_on_hand: i64,
        selling_price_cents: i64,
    ) -> Self {
        Batch {
            batch_id,
            medicine_id,
            batch_number: batch_number.to_string(),
            expiry_date,
            quantity_on_hand,
            purchase_price_cents: 0,
            selling_price_cents,
            supplier_id: None,
            received_date: expiry_date,
        }
    }
}

/// Fields for receiving a new batch into stock.
///
/// The received date is stamped by the store at insert time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBatch {
    pub medicine_id: i64,
    pub batch_number: String,
    pub expiry_date: DateTime<Utc>,
    pub quantity_on_hand: i64,
    pub purchase_price_cents: i64,
    pub selling_price_cents: i64,
    pub supplier_id: Option<i64>,
}

// =============================================================================
// Payment Method
// =============================================================================

/// How the customer paid for a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on an external terminal.
    Card,
    /// Mobile wallet payment.
    Mobile,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

// =============================================================================
// Sale
// =============================================================================

/// One committed dispense transaction.
///
/// Created exactly once per successful dispense, together with its items
/// and stock movements, inside one atomic scope - or not at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub sale_id: i64,
    /// Generated business identifier, unique across all sales ever created.
    /// Format: `INV<YYYYMMDD><NNNN>`.
    pub invoice_number: String,
    pub customer_id: Option<i64>,
    /// Who performed the sale, for audit attribution.
    pub sold_by_user_id: i64,
    pub sale_date: DateTime<Utc>,
    pub payment_method: PaymentMethod,
    /// Sum of item subtotals, persisted at commit.
    pub total_cents: i64,
}

impl Sale {
    /// Returns the total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item of a sale, referencing exactly one batch.
///
/// Unit price is a point-in-time copy of the batch selling price, not a
/// live reference. Invariants: `quantity > 0`,
/// `subtotal_cents = quantity * unit_price_cents`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub sale_item_id: i64,
    pub sale_id: i64,
    pub batch_id: i64,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

impl SaleItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the subtotal as Money.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

/// A sale together with its line items - the aggregate returned to the
/// calling workflow after a successful dispense.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleWithItems {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

// =============================================================================
// Stock Movement
// =============================================================================

/// Kind of stock movement in the audit ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
pub enum MovementType {
    /// Stock received (batch intake).
    In,
    /// Stock dispensed (sale).
    Out,
    /// Manual correction.
    Adjustment,
}

/// An immutable audit row for one quantity change to a batch.
///
/// Append-only: nothing in the application updates or deletes these rows.
/// `quantity` is a signed delta - negative for OUT movements.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockMovement {
    pub movement_id: i64,
    pub batch_id: i64,
    pub movement_type: MovementType,
    pub quantity: i64,
    pub performed_by_user_id: i64,
    pub performed_at: DateTime<Utc>,
    /// Free-text reference, e.g. the invoice number for OUT movements.
    pub reference: Option<String>,
}

// =============================================================================
// Order (input DTO)
// =============================================================================

/// A customer order submitted to the dispense engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Optional registered customer.
    pub customer_id: Option<i64>,
    pub payment_method: PaymentMethod,
    pub items: Vec<OrderLine>,
}

/// One requested line of an order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub medicine_id: i64,
    pub quantity: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================
