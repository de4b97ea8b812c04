//! End-to-end sale, cancel, transfer and costing flows over real stores.

use chrono::NaiveDate;
use std::sync::Arc;
use tamal_core::{
    CartSession, Catalog, Category, CoreError, IngredientInput, Location, Money, Product,
    RecipeSession,
};
use tamal_engine::{Engine, EngineError, FixedClock, ReportFilter};
use tamal_store::schema::{self, MENU};
use tamal_store::{MemoryStore, SnapshotStore, SqliteStore};

fn clock() -> Arc<FixedClock> {
    let at = NaiveDate::from_ymd_opt(2024, 11, 2)
        .unwrap()
        .and_hms_opt(10, 15, 0)
        .unwrap();
    Arc::new(FixedClock::new(at))
}

fn tamal_verde(local1: i64, feria: i64) -> Product {
    let mut product = Product::new(
        "Tamal Verde",
        Category::Tamales,
        Money::from_cents(2000),
        Money::from_cents(850),
    );
    product.stock.set(Location::Local1, local1);
    product.stock.set(Location::Feria, feria);
    product
}

async fn seeded<S: SnapshotStore>(store: S, products: Vec<Product>) -> Engine<S> {
    let catalog = Catalog::from_products(products).unwrap();
    store.save(MENU, &schema::encode_catalog(&catalog)).await.unwrap();
    Engine::new(store).with_clock(clock())
}

#[tokio::test]
async fn sale_and_cancel_round_trip_on_sqlite() {
    let engine = seeded(SqliteStore::in_memory().await.unwrap(), vec![tamal_verde(50, 0)]).await;

    let mut cart = CartSession::new();
    cart.add("Tamal Verde", 3).unwrap();
    let ticket = engine.checkout(&mut cart, Location::Local1).await.unwrap();

    assert_eq!(ticket.total(), Money::from_cents(6000));
    assert_eq!(ticket.margin(), Money::from_cents(3450));
    let line_sum: Money = ticket.lines.iter().map(|l| l.revenue()).sum();
    assert_eq!(line_sum, ticket.total());
    assert_eq!(
        engine.load_catalog().await.unwrap().stock("Tamal Verde", Location::Local1).unwrap(),
        47
    );

    let summary = engine.sales_summary(ReportFilter::all()).await.unwrap();
    assert_eq!(summary.revenue, Money::from_cents(6000));
    assert_eq!(summary.cost, Money::from_cents(2550));

    engine.cancel(ticket.id.as_str()).await.unwrap();
    assert_eq!(
        engine.load_catalog().await.unwrap().stock("Tamal Verde", Location::Local1).unwrap(),
        50
    );
    let ledger = engine.load_ledger().await.unwrap();
    assert!(!ledger.contains_ticket(ticket.id.as_str()));
}

#[tokio::test]
async fn empty_location_rejects_checkout_without_mutation() {
    let store = Arc::new(MemoryStore::new());
    let engine = seeded(store.clone(), vec![tamal_verde(50, 0)]).await;
    let menu_before = store.snapshot(MENU).await;
    let saves_before = store.save_count();

    let mut cart = CartSession::new();
    cart.add("Tamal Verde", 1).unwrap();
    let err = engine.checkout(&mut cart, Location::Feria).await.unwrap_err();

    match err {
        EngineError::Core(CoreError::InsufficientStock {
            product,
            location,
            available,
            requested,
        }) => {
            assert_eq!(product, "Tamal Verde");
            assert_eq!(location, Location::Feria);
            assert_eq!((available, requested), (0, 1));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(store.save_count(), saves_before);
    assert_eq!(store.snapshot(MENU).await, menu_before);
    assert!(engine.load_ledger().await.unwrap().is_empty());
    assert_eq!(cart.units(), 1);
}

#[tokio::test]
async fn repeated_lines_are_checked_together() {
    let engine = seeded(MemoryStore::new(), vec![tamal_verde(5, 0)]).await;

    let mut cart = CartSession::new();
    cart.add("Tamal Verde", 3).unwrap();
    cart.add("Tamal Verde", 3).unwrap();
    assert!(engine.checkout(&mut cart, Location::Local1).await.is_err());
    assert_eq!(
        engine.load_catalog().await.unwrap().stock("Tamal Verde", Location::Local1).unwrap(),
        5
    );
}

#[tokio::test]
async fn transfer_then_sell_at_destination() {
    let engine = seeded(MemoryStore::new(), vec![tamal_verde(50, 0)]).await;

    engine
        .transfer("Tamal Verde", Location::Local1, Location::Feria, 12)
        .await
        .unwrap();

    let mut cart = CartSession::new();
    cart.add("Tamal Verde", 12).unwrap();
    engine.checkout(&mut cart, Location::Feria).await.unwrap();

    let catalog = engine.load_catalog().await.unwrap();
    assert_eq!(catalog.stock("Tamal Verde", Location::Local1).unwrap(), 38);
    assert_eq!(catalog.stock("Tamal Verde", Location::Feria).unwrap(), 0);

    let err = engine
        .transfer("Tamal Verde", Location::Feria, Location::Local2, 1)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Core(CoreError::InsufficientStock { .. })));
}

#[tokio::test]
async fn recipe_cost_flows_into_next_sale() {
    let engine = seeded(MemoryStore::new(), vec![tamal_verde(50, 0)]).await;

    let mut session = RecipeSession::new();
    engine.select_recipe(&mut session, "Tamal Verde").await.unwrap();
    session
        .add_line(
            "Masa",
            IngredientInput::Lot {
                purchase_cost: Money::from_cents(24000),
                fraction_used: 1.0,
            },
        )
        .unwrap();
    let commit = engine.commit_recipe(&session, 40).await.unwrap();
    assert_eq!(commit.unit_cost, Money::from_cents(600));

    let mut cart = CartSession::new();
    cart.add("Tamal Verde", 2).unwrap();
    let ticket = engine.checkout(&mut cart, Location::Local1).await.unwrap();
    assert_eq!(ticket.lines[0].unit_cost, Money::from_cents(600));
    assert_eq!(ticket.margin(), Money::from_cents(2800));
}
