//! # rx-db: Database Layer for RxPOS
//!
//! This crate provides database access for the RxPOS system and hosts the
//! dispense transaction engine. It uses SQLite for local storage with sqlx
//! for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         RxPOS Data Flow                                  │
//! │                                                                         │
//! │  Calling workflow (sale entry, stock intake)                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                      rx-db (THIS CRATE)                         │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │   Dispense   │  │   │
//! │  │   │   (pool.rs)   │    │ medicine/batch│    │ (dispense.rs)│  │   │
//! │  │   │               │    │ sale/movement │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│               │◄───│ one atomic   │  │   │
//! │  │   │ WAL + FKs     │    │ standalone    │    │ transaction  │  │   │
//! │  │   └───────────────┘    │ reads/writes  │    │ per order    │  │   │
//! │  │                        └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │                       SQLite Database (rxpos.db)                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (medicine, batch, sale, movement)
//! - [`dispense`] - The dispense transaction coordinator
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rx_db::{Database, DbConfig};
//! use rx_core::types::{Order, OrderLine, PaymentMethod};
//!
//! let db = Database::new(DbConfig::new("path/to/rxpos.db")).await?;
//!
//! let order = Order {
//!     customer_id: None,
//!     payment_method: PaymentMethod::Cash,
//!     items: vec![OrderLine { medicine_id: 1, quantity: 8 }],
//! };
//!
//! // Validate, allocate FEFO, post the sale + ledger, commit - or nothing.
//! let receipt = db.dispense().dispense(&order, acting_user_id).await?;
//! println!("{}", receipt.sale.invoice_number);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod dispense;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use dispense::{DispenseError, DispenseService};
pub use error::DbError;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::batch::BatchRepository;
pub use repository::medicine::MedicineRepository;
pub use repository::movement::MovementRepository;
pub use repository::sale::SaleRepository;
