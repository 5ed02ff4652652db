//! Integration tests for the dispense engine against a real SQLite store.
//!
//! Each test gets an isolated database (in-memory, or a temp file where
//! the test needs genuinely concurrent connections) with migrations
//! applied, then drives the public API only.

use chrono::{Datelike, Duration, Utc};

use rx_core::error::CoreError;
use rx_core::types::{MovementType, NewBatch, NewMedicine, Order, OrderLine, PaymentMethod};
use rx_db::{Database, DbConfig, DbError, DispenseError};

const USER: i64 = 1;

async fn setup() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

async fn add_medicine(db: &Database, generic_name: &str) -> i64 {
    db.medicines()
        .insert(&NewMedicine {
            generic_name: generic_name.to_string(),
            brand_name: String::new(),
            strength: "500mg".to_string(),
            form: "Tablet".to_string(),
            unit: "unit".to_string(),
            reorder_level: 10,
        })
        .await
        .unwrap()
        .medicine_id
}

/// Receives a batch expiring `expires_in_days` from now (negative for an
/// already expired lot).
async fn add_batch(
    db: &Database,
    medicine_id: i64,
    batch_number: &str,
    expires_in_days: i64,
    quantity: i64,
    selling_price_cents: i64,
) -> i64 {
    db.batches()
        .receive(
            &NewBatch {
                medicine_id,
                batch_number: batch_number.to_string(),
                expiry_date: Utc::now() + Duration::days(expires_in_days),
                quantity_on_hand: quantity,
                purchase_price_cents: selling_price_cents - 100,
                selling_price_cents,
                supplier_id: None,
            },
            USER,
        )
        .await
        .unwrap()
        .batch_id
}

fn order_for(medicine_id: i64, quantity: i64) -> Order {
    Order {
        customer_id: None,
        payment_method: PaymentMethod::Cash,
        items: vec![OrderLine {
            medicine_id,
            quantity,
        }],
    }
}

async fn count(db: &Database, sql: &str) -> i64 {
    sqlx::query_scalar(sql).fetch_one(db.pool()).await.unwrap()
}

// =============================================================================
// Happy path: FEFO across batches
// =============================================================================

#[tokio::test]
async fn dispense_splits_across_batches_in_expiry_order() {
    let db = setup().await;
    let med = add_medicine(&db, "Paracetamol").await;
    // X expires sooner and must be drained first despite being received first
    let batch_x = add_batch(&db, med, "X", 30, 5, 450).await;
    let batch_y = add_batch(&db, med, "Y", 365, 10, 500).await;

    let receipt = db.dispense().dispense(&order_for(med, 8), USER).await.unwrap();

    assert_eq!(receipt.items.len(), 2);
    assert_eq!(receipt.items[0].batch_id, batch_x);
    assert_eq!(receipt.items[0].quantity, 5);
    assert_eq!(receipt.items[0].unit_price_cents, 450);
    assert_eq!(receipt.items[0].subtotal_cents, 5 * 450);
    assert_eq!(receipt.items[1].batch_id, batch_y);
    assert_eq!(receipt.items[1].quantity, 3);
    assert_eq!(receipt.items[1].subtotal_cents, 3 * 500);
    assert_eq!(receipt.sale.total_cents, 5 * 450 + 3 * 500);

    // Stock end state
    let x = db.batches().get_by_id(batch_x).await.unwrap().unwrap();
    let y = db.batches().get_by_id(batch_y).await.unwrap().unwrap();
    assert_eq!(x.quantity_on_hand, 0);
    assert_eq!(y.quantity_on_hand, 7);

    // The persisted aggregate matches what the call returned
    let stored = db
        .sales()
        .get_by_invoice(&receipt.sale.invoice_number)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.sale.sale_id, receipt.sale.sale_id);
    assert_eq!(stored.sale.total_cents, receipt.sale.total_cents);
    assert_eq!(stored.items.len(), 2);
}

#[tokio::test]
async fn dispense_writes_out_movements_referencing_the_invoice() {
    let db = setup().await;
    let med = add_medicine(&db, "Amoxicillin").await;
    let batch_x = add_batch(&db, med, "X", 30, 5, 450).await;
    let batch_y = add_batch(&db, med, "Y", 365, 10, 500).await;

    let receipt = db.dispense().dispense(&order_for(med, 8), USER).await.unwrap();

    // Each batch: the IN row from receipt, then the OUT row from dispense
    let x_moves = db.movements().for_batch(batch_x).await.unwrap();
    assert_eq!(x_moves.len(), 2);
    assert_eq!(x_moves[0].movement_type, MovementType::In);
    assert_eq!(x_moves[1].movement_type, MovementType::Out);
    assert_eq!(x_moves[1].quantity, -5);
    assert_eq!(
        x_moves[1].reference.as_deref(),
        Some(receipt.sale.invoice_number.as_str())
    );

    let y_moves = db.movements().for_batch(batch_y).await.unwrap();
    assert_eq!(y_moves[1].quantity, -3);

    // Ledger sums reconcile with on-hand quantities
    assert_eq!(db.movements().net_change(batch_x).await.unwrap(), 0);
    assert_eq!(db.movements().net_change(batch_y).await.unwrap(), 7);
}

#[tokio::test]
async fn invoice_number_has_date_scoped_format() {
    let db = setup().await;
    let med = add_medicine(&db, "Cetirizine").await;
    add_batch(&db, med, "X", 90, 20, 300).await;

    let receipt = db.dispense().dispense(&order_for(med, 1), USER).await.unwrap();

    let today = Utc::now();
    let expected_prefix = format!(
        "INV{:04}{:02}{:02}",
        today.year(),
        today.month(),
        today.day()
    );
    assert_eq!(
        receipt.sale.invoice_number,
        format!("{expected_prefix}0001")
    );
}

// =============================================================================
// Rejection paths leave the store untouched
// =============================================================================

#[tokio::test]
async fn insufficient_stock_rejects_without_writing() {
    let db = setup().await;
    let med = add_medicine(&db, "Ibuprofen").await;
    let batch = add_batch(&db, med, "X", 30, 5, 450).await;

    let err = db
        .dispense()
        .dispense(&order_for(med, 6), USER)
        .await
        .unwrap_err();

    assert!(!err.is_retryable());
    match err {
        DispenseError::Core(CoreError::InsufficientStock {
            medicine_id,
            ref name,
            required,
            available,
        }) => {
            assert_eq!(medicine_id, med);
            assert_eq!(name, "Ibuprofen");
            assert_eq!(required, 6);
            assert_eq!(available, 5);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    // Nothing was written
    assert_eq!(count(&db, "SELECT COUNT(*) FROM sales").await, 0);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM sale_items").await, 0);
    assert_eq!(
        count(
            &db,
            "SELECT COUNT(*) FROM stock_movements WHERE movement_type = 'OUT'"
        )
        .await,
        0
    );
    let b = db.batches().get_by_id(batch).await.unwrap().unwrap();
    assert_eq!(b.quantity_on_hand, 5);
}

#[tokio::test]
async fn expired_and_empty_batches_never_count_or_allocate() {
    let db = setup().await;
    let med = add_medicine(&db, "Metformin").await;
    add_batch(&db, med, "EXPIRED", -1, 50, 400).await;
    let empty = add_batch(&db, med, "EMPTY", 90, 3, 400).await;
    db.batches().adjust(empty, -3, USER, None).await.unwrap();
    let fresh = add_batch(&db, med, "FRESH", 90, 4, 400).await;

    assert_eq!(db.batches().available_quantity(med).await.unwrap(), 4);

    // Only the fresh batch may serve the order
    let receipt = db.dispense().dispense(&order_for(med, 4), USER).await.unwrap();
    assert_eq!(receipt.items.len(), 1);
    assert_eq!(receipt.items[0].batch_id, fresh);

    // Asking beyond the eligible pool fails even though expired stock exists
    let err = db
        .dispense()
        .dispense(&order_for(med, 1), USER)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DispenseError::Core(CoreError::InsufficientStock { available: 0, .. })
    ));
}

#[tokio::test]
async fn allocation_exhausted_mid_transaction_rolls_back_everything() {
    let db = setup().await;
    let med = add_medicine(&db, "Omeprazole").await;
    let batch = add_batch(&db, med, "X", 30, 5, 450).await;

    // Each line passes per-line validation (5 >= 3) but the second line
    // finds only 2 units left after the first allocated.
    let order = Order {
        customer_id: None,
        payment_method: PaymentMethod::Cash,
        items: vec![
            OrderLine {
                medicine_id: med,
                quantity: 3,
            },
            OrderLine {
                medicine_id: med,
                quantity: 3,
            },
        ],
    };

    let err = db.dispense().dispense(&order, USER).await.unwrap_err();
    assert!(err.is_retryable());
    match err {
        DispenseError::Core(CoreError::AllocationExhausted {
            medicine_id,
            shortfall,
        }) => {
            assert_eq!(medicine_id, med);
            assert_eq!(shortfall, 1);
        }
        other => panic!("expected AllocationExhausted, got {other:?}"),
    }

    // The first line's partial work must not survive
    assert_eq!(count(&db, "SELECT COUNT(*) FROM sales").await, 0);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM sale_items").await, 0);
    let b = db.batches().get_by_id(batch).await.unwrap().unwrap();
    assert_eq!(b.quantity_on_hand, 5);
}

#[tokio::test]
async fn unknown_medicine_is_not_found() {
    let db = setup().await;

    let err = db
        .dispense()
        .dispense(&order_for(999, 1), USER)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DispenseError::NotFound {
            entity: "Medicine",
            id: 999,
        }
    ));
}

#[tokio::test]
async fn empty_and_zero_quantity_orders_are_rejected() {
    let db = setup().await;
    let med = add_medicine(&db, "Aspirin").await;
    add_batch(&db, med, "X", 30, 10, 200).await;

    let empty = Order::default();
    let err = db.dispense().dispense(&empty, USER).await.unwrap_err();
    assert!(matches!(
        err,
        DispenseError::Core(CoreError::EmptyOrder)
    ));

    // Zero-quantity lines are dropped; if nothing remains the order is empty
    let zeros = Order {
        customer_id: None,
        payment_method: PaymentMethod::Cash,
        items: vec![OrderLine {
            medicine_id: med,
            quantity: 0,
        }],
    };
    let err = db.dispense().dispense(&zeros, USER).await.unwrap_err();
    assert!(matches!(
        err,
        DispenseError::Core(CoreError::EmptyOrder)
    ));
    assert_eq!(count(&db, "SELECT COUNT(*) FROM sales").await, 0);
}

// =============================================================================
// Invoice sequencing
// =============================================================================

#[tokio::test]
async fn sequential_dispenses_get_consecutive_invoice_numbers() {
    let db = setup().await;
    let med = add_medicine(&db, "Losartan").await;
    add_batch(&db, med, "X", 90, 100, 350).await;

    let mut invoices = Vec::new();
    for _ in 0..3 {
        let receipt = db.dispense().dispense(&order_for(med, 2), USER).await.unwrap();
        invoices.push(receipt.sale.invoice_number);
    }

    assert!(invoices[0].ends_with("0001"));
    assert!(invoices[1].ends_with("0002"));
    assert!(invoices[2].ends_with("0003"));
    // Same date prefix on all three
    assert_eq!(&invoices[0][..11], &invoices[2][..11]);
}

// =============================================================================
// Concurrency: no overselling
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_dispenses_never_oversell() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("concurrent.db");
    let db = Database::new(DbConfig::new(&path).max_connections(4)).await.unwrap();

    let med = add_medicine(&db, "Warfarin").await;
    let batch = add_batch(&db, med, "X", 90, 5, 600).await;

    // Two orders that each want the whole batch
    let svc_a = db.dispense();
    let svc_b = db.dispense();
    let order_a = order_for(med, 5);
    let order_b = order_for(med, 5);

    let (a, b) = tokio::join!(
        tokio::spawn(async move { svc_a.dispense(&order_a, USER).await }),
        tokio::spawn(async move { svc_b.dispense(&order_b, 2).await }),
    );
    let results = [a.unwrap(), b.unwrap()];

    let oks = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(oks, 1, "exactly one of two competing dispenses may commit");

    // The loser got a clean business/contention error
    let err = results.iter().find(|r| r.is_err()).unwrap().as_ref().unwrap_err();
    assert!(matches!(
        err,
        DispenseError::ConcurrencyConflict
            | DispenseError::Core(CoreError::InsufficientStock { .. })
    ));

    // Stock never went negative and exactly one sale exists
    let b = db.batches().get_by_id(batch).await.unwrap().unwrap();
    assert_eq!(b.quantity_on_hand, 0);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM sales").await, 1);
    assert_eq!(
        count(
            &db,
            "SELECT COUNT(*) FROM stock_movements WHERE movement_type = 'OUT'"
        )
        .await,
        1
    );
}

// =============================================================================
// Inventory store: receive and adjust
// =============================================================================

#[tokio::test]
async fn receiving_a_batch_posts_an_in_movement() {
    let db = setup().await;
    let med = add_medicine(&db, "Atorvastatin").await;
    let batch = add_batch(&db, med, "LOT-7", 120, 30, 700).await;

    let moves = db.movements().for_batch(batch).await.unwrap();
    assert_eq!(moves.len(), 1);
    assert_eq!(moves[0].movement_type, MovementType::In);
    assert_eq!(moves[0].quantity, 30);
    assert_eq!(moves[0].reference.as_deref(), Some("LOT-7"));
}

#[tokio::test]
async fn adjustments_post_signed_movements_and_respect_the_floor() {
    let db = setup().await;
    let med = add_medicine(&db, "Prednisone").await;
    let batch = add_batch(&db, med, "LOT-8", 120, 10, 550).await;

    db.batches()
        .adjust(batch, -4, USER, Some("damaged"))
        .await
        .unwrap();
    let b = db.batches().get_by_id(batch).await.unwrap().unwrap();
    assert_eq!(b.quantity_on_hand, 6);

    let moves = db.movements().for_batch(batch).await.unwrap();
    assert_eq!(moves.last().unwrap().movement_type, MovementType::Adjustment);
    assert_eq!(moves.last().unwrap().quantity, -4);
    assert_eq!(moves.last().unwrap().reference.as_deref(), Some("damaged"));

    // Cannot adjust below zero; the failed attempt leaves no ledger row
    let err = db.batches().adjust(batch, -7, USER, None).await.unwrap_err();
    assert!(matches!(err, DbError::CheckViolation { .. }));
    let b = db.batches().get_by_id(batch).await.unwrap().unwrap();
    assert_eq!(b.quantity_on_hand, 6);
    assert_eq!(db.movements().for_batch(batch).await.unwrap().len(), 2);

    // Unknown batch
    let err = db.batches().adjust(999, 1, USER, None).await.unwrap_err();
    assert!(matches!(err, DbError::NotFound { .. }));
}
