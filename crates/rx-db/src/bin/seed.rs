//! Seeds a local database with demo catalog and inventory data.
//!
//! ```bash
//! cargo run -p rx-db --bin seed -- [path/to/pharmacy.db]
//! ```
//!
//! Creates a supplier, a small medicine catalog, and staggered-expiry
//! batches so FEFO allocation has something real to chew on, then runs a
//! demo dispense and prints the invoice.

use chrono::{Duration, Utc};

use rx_core::types::{NewBatch, NewMedicine, Order, OrderLine, PaymentMethod};
use rx_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "pharmacy.db".to_string());

    println!("Seeding database at {path}");
    let db = Database::new(DbConfig::new(&path)).await?;

    let supplier_id = insert_supplier(db.pool(), "HealthSource Distributors").await?;

    let medicines = db.medicines();
    let batches = db.batches();
    let now = Utc::now();

    let catalog = [
        ("Paracetamol", "Calpol", "500mg", "Tablet"),
        ("Amoxicillin", "Amoxil", "250mg", "Capsule"),
        ("Cetirizine", "Zyrtec", "10mg", "Tablet"),
        ("Ibuprofen", "Brufen", "400mg", "Tablet"),
    ];

    for (i, (generic, brand, strength, form)) in catalog.iter().enumerate() {
        let medicine = medicines
            .insert(&NewMedicine {
                generic_name: generic.to_string(),
                brand_name: brand.to_string(),
                strength: strength.to_string(),
                form: form.to_string(),
                unit: "unit".to_string(),
                reorder_level: 20,
            })
            .await?;

        // Two lots per medicine with staggered expiries; the earlier one is
        // the one FEFO should drain first.
        for (lot, months, qty, price) in [
            ("A", 6, 40 + i as i64 * 5, 450),
            ("B", 18, 100, 500),
        ] {
            batches
                .receive(
                    &NewBatch {
                        medicine_id: medicine.medicine_id,
                        batch_number: format!("{}-{}{:03}", &generic[..3].to_uppercase(), lot, i + 1),
                        expiry_date: now + Duration::days(30 * months),
                        quantity_on_hand: qty,
                        purchase_price_cents: price - 150,
                        selling_price_cents: price,
                        supplier_id: Some(supplier_id),
                    },
                    1,
                )
                .await?;
        }

        println!(
            "  {} {} ({} {})",
            medicine.medicine_id, medicine.generic_name, medicine.strength, medicine.form
        );
    }

    let order = Order {
        customer_id: None,
        payment_method: PaymentMethod::Cash,
        items: vec![
            OrderLine {
                medicine_id: 1,
                quantity: 45,
            },
            OrderLine {
                medicine_id: 3,
                quantity: 10,
            },
        ],
    };

    let receipt = db.dispense().dispense(&order, 1).await?;
    println!(
        "Demo sale {} committed: {} items, total {} cents",
        receipt.sale.invoice_number,
        receipt.items.len(),
        receipt.sale.total_cents
    );

    db.close().await;
    Ok(())
}

async fn insert_supplier(pool: &sqlx::SqlitePool, name: &str) -> Result<i64, rx_db::DbError> {
    let result = sqlx::query("INSERT INTO suppliers (name) VALUES (?1)")
        .bind(name)
        .execute(pool)
        .await?;
    Ok(result.last_insert_rowid())
}
