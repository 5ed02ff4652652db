//! # Error Types
//!
//! Domain-specific error types for rx-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                      │
//! │                                                                         │
//! │  rx-core errors (this file)                                             │
//! │  └── CoreError        - Business rule failures (insufficient stock,    │
//! │                         allocation shortfall, bad orders)              │
//! │                                                                         │
//! │  rx-db errors (separate crate)                                          │
//! │  ├── DbError          - Storage operation failures                     │
//! │  └── DispenseError    - What the caller of dispense() sees             │
//! │                                                                         │
//! │  Flow: CoreError ──┐                                                    │
//! │                    ├──► DispenseError ──► calling workflow              │
//! │        DbError  ───┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (medicine name, quantities)
//! 3. Errors are enum variants, never String
//! 4. Business failures are values the caller checks, never panics

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations inside the dispense
/// engine. They are user-correctable (fix the order) except for
/// [`CoreError::AllocationExhausted`], which signals a lost concurrency
/// race and is surfaced to callers as retryable.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The order asks for more units of a medicine than all eligible
    /// batches hold together.
    ///
    /// ## When This Occurs
    /// - Requested quantity exceeds total non-expired stock on hand
    /// - Reported by the validation pass, before any write happens
    ///
    /// ## User Workflow
    /// ```text
    /// Order line (medicine: Amoxicillin, qty: 6)
    ///      │
    ///      ▼
    /// Sum eligible batches: available = 5
    ///      │
    ///      ▼
    /// InsufficientStock { name: "Amoxicillin", required: 6, available: 5 }
    ///      │
    ///      ▼
    /// UI shows: "Amoxicillin: required 6, available 5"
    /// ```
    #[error("insufficient stock for {name}: required {required}, available {available}")]
    InsufficientStock {
        medicine_id: i64,
        name: String,
        required: i64,
        available: i64,
    },

    /// FEFO allocation ran out of eligible batches mid-plan.
    ///
    /// ## When This Occurs
    /// The validator already confirmed aggregate availability, so hitting
    /// this means stock changed underneath us - a concurrent dispense won
    /// the race. The whole transaction aborts; the caller may retry.
    #[error("allocation exhausted for medicine {medicine_id}: short {shortfall} units")]
    AllocationExhausted { medicine_id: i64, shortfall: i64 },

    /// The order has no lines left after dropping non-positive quantities.
    #[error("order has no lines with a positive quantity")]
    EmptyOrder,

    /// The order has more lines than the engine accepts in one transaction.
    #[error("order cannot have more than {max} lines")]
    OrderTooLarge { max: usize },

    /// A single line quantity exceeds the allowed maximum.
    #[error("quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
