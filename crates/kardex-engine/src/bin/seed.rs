//! # Seed Data Generator
//!
//! Provisions a demo inventory and drives one full bundle / sale / payment
//! cycle against a local database, so a development frontend has realistic
//! ledger state to work with.
//!
//! ## Usage
//! ```bash
//! # Seed into ./kardex_dev.db (default)
//! cargo run -p kardex-engine --bin seed
//!
//! # Specify database path
//! cargo run -p kardex-engine --bin seed -- --db ./data/kardex.db
//! ```
//!
//! ## What Gets Created
//! - A hardware-store inventory (cement, rebar, PVC, paint, ...)
//! - One bundle ("Obra gris starter") with its stock reserved
//! - One direct USD sale, settled by a split USD + BS payment
//! - One open BS sale with a partial payment outstanding

use std::env;

use serde_json::json;
use tracing::info;

use kardex_core::{Currency, ExchangeRate, Money, PaymentMethod};
use kardex_db::{Database, DbConfig};
use kardex_engine::{
    BundleLineSpec, BundleReservationEngine, CartLine, CreateBundleRequest, CreateSaleRequest,
    NewItem, PaymentReconciliationEngine, PurchaseTransactionProcessor, RecordPaymentRequest,
    StockLedger,
};

/// Demo catalog: (sku, name, opening stock, minimum stock, price USD cents).
const CATALOG: &[(&str, &str, i64, i64, i64)] = &[
    ("CEM-42", "Cemento gris 42.5kg", 120, 20, 1250),
    ("CAB-38", "Cabilla estriada 3/8\" x 6m", 300, 50, 780),
    ("BLQ-15", "Bloque de concreto 15cm", 800, 100, 95),
    ("ARE-M3", "Arena lavada m3", 40, 5, 3200),
    ("PVC-110", "Tubo PVC 110mm x 6m", 75, 10, 1480),
    ("PIN-GAL", "Pintura caucho blanco galon", 60, 12, 2250),
    ("ELE-12", "Cable THW 12 AWG rollo 100m", 25, 4, 6900),
    ("TEJ-ZN", "Lamina de zinc 3.66m", 90, 15, 1150),
];

/// Exchange rate used for every snapshot in the demo data.
const DEMO_RATE: &str = "36.50";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./kardex_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Kardex Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./kardex_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(db_path = %db_path, "Seeding Kardex demo data");

    let db = Database::new(DbConfig::new(&db_path)).await?;

    let ledger = StockLedger::new(db.clone());
    let bundles = BundleReservationEngine::new(db.clone());
    let purchases = PurchaseTransactionProcessor::new(db.clone());
    let payments = PaymentReconciliationEngine::new(db.clone());

    // Skip if already seeded
    if db.items().get_by_sku(CATALOG[0].0).await?.is_some() {
        info!("Database already seeded, nothing to do");
        return Ok(());
    }

    let rate = ExchangeRate::parse(DEMO_RATE)?;

    // -------------------------------------------------------------------------
    // Inventory
    // -------------------------------------------------------------------------
    let mut item_ids = Vec::new();
    for (sku, name, opening, minimum, price_cents) in CATALOG {
        let item = ledger
            .register_item(NewItem {
                sku: sku.to_string(),
                name: name.to_string(),
                opening_stock: *opening,
                minimum_stock: *minimum,
                base_price: Money::new(*price_cents, Currency::Usd)?,
            })
            .await?;
        item_ids.push(item.id);
    }
    info!(items = item_ids.len(), "Inventory registered");

    // -------------------------------------------------------------------------
    // Bundle with reserved stock
    // -------------------------------------------------------------------------
    let bundle = bundles
        .create_bundle(CreateBundleRequest {
            name: "Obra gris starter".to_string(),
            lines: vec![
                BundleLineSpec {
                    item_id: item_ids[0].clone(), // cement
                    quantity: 10,
                    override_price: None,
                },
                BundleLineSpec {
                    item_id: item_ids[1].clone(), // rebar
                    quantity: 20,
                    override_price: None,
                },
                BundleLineSpec {
                    item_id: item_ids[2].clone(), // blocks
                    quantity: 100,
                    override_price: Some(Money::new(9_000, Currency::Usd)?),
                },
            ],
        })
        .await?;
    info!(
        bundle_id = %bundle.bundle.id,
        nominal_price = %bundle.nominal_price,
        "Bundle created and reserved"
    );

    // -------------------------------------------------------------------------
    // A settled USD sale (split USD cash + BS transfer)
    // -------------------------------------------------------------------------
    let settled = purchases
        .create_direct_sale(CreateSaleRequest {
            client_id: "client-ferreteria-lara".to_string(),
            lines: vec![
                CartLine {
                    item_id: item_ids[4].clone(), // PVC
                    quantity: 6,
                },
                CartLine {
                    item_id: item_ids[5].clone(), // paint
                    quantity: 2,
                },
            ],
            payment_method: PaymentMethod::Cash,
            currency: Currency::Usd,
            conversion_rate: rate,
        })
        .await?;

    let half = settled.sale.total_cents / 2;
    payments
        .record_payment(RecordPaymentRequest {
            sale_id: settled.sale.id.clone(),
            amount: Money::new(half, Currency::Usd)?,
            conversion_rate: rate,
            method: PaymentMethod::Cash,
            reference: None,
        })
        .await?;
    let rest_usd = Money::new(settled.sale.total_cents - half, Currency::Usd)?;
    let outcome = payments
        .record_payment(RecordPaymentRequest {
            sale_id: settled.sale.id.clone(),
            amount: rest_usd.convert(Currency::Bs, rate),
            conversion_rate: rate,
            method: PaymentMethod::Transfer,
            reference: Some("TRF-000123".to_string()),
        })
        .await?;
    info!(
        sale_id = %settled.sale.id,
        is_fully_paid = outcome.is_fully_paid,
        "USD sale settled with a split USD/BS payment"
    );

    // -------------------------------------------------------------------------
    // An open BS sale with a partial payment
    // -------------------------------------------------------------------------
    let open = purchases
        .create_direct_sale(CreateSaleRequest {
            client_id: "client-constructora-sur".to_string(),
            lines: vec![CartLine {
                item_id: item_ids[7].clone(), // zinc sheets
                quantity: 30,
            }],
            payment_method: PaymentMethod::Transfer,
            currency: Currency::Bs,
            conversion_rate: rate,
        })
        .await?;
    payments
        .record_payment(RecordPaymentRequest {
            sale_id: open.sale.id.clone(),
            amount: Money::new(open.sale.total_cents / 3, Currency::Bs)?,
            conversion_rate: rate,
            method: PaymentMethod::Transfer,
            reference: Some("TRF-000124".to_string()),
        })
        .await?;
    let outstanding = payments.get_remaining_balance(&open.sale.id).await?;
    info!(
        sale_id = %open.sale.id,
        outstanding = %outstanding,
        "BS sale left partially paid"
    );

    // -------------------------------------------------------------------------
    // Summary
    // -------------------------------------------------------------------------
    let active = db.items().list_active(100).await?;
    let below_minimum = db.items().list_below_minimum().await?;
    let summary = json!({
        "database": db_path,
        "items": active.len(),
        "bundle": {
            "id": bundle.bundle.id,
            "nominal_price": bundle.nominal_price.to_string(),
        },
        "settled_sale": settled.sale.id,
        "open_sale": {
            "id": open.sale.id,
            "outstanding": outstanding.to_string(),
        },
        "items_below_minimum": below_minimum.len(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
