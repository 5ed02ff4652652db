//! # Repository Module
//!
//! Database repository implementations for RxPOS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Two Kinds of Access                                   │
//! │                                                                         │
//! │  Standalone reads/writes (each its own scope):                          │
//! │      db.batches().receive(&new_batch, user).await                       │
//! │      db.sales().get_with_items(sale_id).await                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Repository struct owning a pool handle                                 │
//! │                                                                         │
//! │  Transactional access (the dispense coordinator):                       │
//! │      batch::available(&mut *tx, ...) / sale::insert_sale(&mut *tx, ...) │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  pub(crate) query helpers generic over the executor, so the same SQL   │
//! │  runs against the pool or inside the one atomic dispense transaction   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`medicine::MedicineRepository`] - Catalog reads/writes
//! - [`batch::BatchRepository`] - Inventory store: receive, adjust, eligibility
//! - [`sale::SaleRepository`] - Sale lookups with items
//! - [`movement::MovementRepository`] - Append-only audit ledger reads

pub mod batch;
pub mod medicine;
pub mod movement;
pub mod sale;
