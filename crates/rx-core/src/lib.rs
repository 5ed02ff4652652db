//! # rx-core: Pure Business Logic for RxPOS
//!
//! This crate is the **heart** of the RxPOS dispense engine. It contains all
//! business logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        RxPOS Architecture                                │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Calling workflow (sale entry)                   │   │
//! │  │   builds Order ──► DispenseService::dispense(order, user)       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ rx-core (THIS CRATE) ★                           │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   fefo    │  │  invoice  │  │ validation│  │   │
//! │  │   │ Medicine  │  │ allocate  │  │ INV + seq │  │ normalize │  │   │
//! │  │   │  Batch    │  │ available │  │ numbering │  │   order   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    rx-db (Database Layer)                       │   │
//! │  │       SQLite queries, migrations, dispense transaction          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Medicine, Batch, Sale, StockMovement, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`fefo`] - First-Expiry-First-Out allocation planning
//! - [`invoice`] - Date-scoped sequential invoice number formatting
//! - [`validation`] - Order normalization rules
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use rx_core::fefo;
//! use rx_core::types::Batch;
//!
//! let batches = vec![
//!     Batch::lot(2, 1, "B-LATE", Utc.with_ymd_and_hms(2099, 6, 1, 0, 0, 0).unwrap(), 10, 500),
//!     Batch::lot(1, 1, "B-EARLY", Utc.with_ymd_and_hms(2099, 1, 1, 0, 0, 0).unwrap(), 5, 450),
//! ];
//!
//! // Allocation drains the soonest-expiring batch first
//! let plan = fefo::allocate(1, &batches, 8).unwrap();
//! assert_eq!(plan[0].batch_id, 1);
//! assert_eq!(plan[0].quantity, 5);
//! assert_eq!(plan[1].batch_id, 2);
//! assert_eq!(plan[1].quantity, 3);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod fefo;
pub mod invoice;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use rx_core::Money` instead of
// `use rx_core::money::Money`

pub use error::{CoreError, CoreResult};
pub use fefo::Allocation;
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single order.
///
/// ## Business Reason
/// Prevents runaway orders and keeps the dispense transaction short;
/// one transaction holds the write path for its whole duration.
pub const MAX_ORDER_LINES: usize = 100;

/// Maximum quantity of a single order line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 9_999;
