//! # Seed Data
//!
//! Writes the starter catalog into a fresh snapshot database.
//!
//! ## Usage
//! ```bash
//! # Seed ./tamal_dev.db (default)
//! cargo run -p tamal-store --bin seed
//!
//! # Specify database path
//! cargo run -p tamal-store --bin seed -- --db ./data/tamal.db
//! ```
//!
//! The catalog is only written when `menu` is empty. `ventas` and `recetas`
//! get their headers so the tables exist with the expected column order.

use std::env;
use tamal_core::{default_catalog, Ledger, RecipeBook};
use tamal_store::schema::{self, MENU, RECETAS, VENTAS};
use tamal_store::{SnapshotStore, SqliteConfig, SqliteStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./tamal_dev.db");

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
                println!("Tamal POS Seed Data");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./tamal_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Tamal POS Seed Data");
    println!("======================");
    println!("Database: {}", db_path);
    println!();

    let store = SqliteStore::new(SqliteConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = schema::decode_catalog(&store.load(MENU).await?)?;
    if !existing.is_empty() {
        println!("⚠ Database already has {} products", existing.len());
        println!("  Skipping seed to keep the current catalog.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let catalog = default_catalog();
    store.save(MENU, &schema::encode_catalog(&catalog)).await?;
    for product in catalog.products() {
        println!(
            "  {} ({}) price {} cost {} stock {}",
            product.name,
            product.category,
            product.price,
            product.cost,
            product.stock.total()
        );
    }

    if store.load(VENTAS).await?.columns().is_empty() {
        store.save(VENTAS, &schema::encode_ledger(&Ledger::default())).await?;
    }
    if store.load(RECETAS).await?.columns().is_empty() {
        store.save(RECETAS, &schema::encode_recipes(&RecipeBook::default())).await?;
    }

    let tables = store.table_names().await?;
    println!();
    println!("✓ Tables: {}", tables.join(", "));
    println!("✓ Seed complete!");

    store.close().await;
    Ok(())
}
