//! # Table Schemas
//!
//! Conversion between stored tables and domain records. This is the only
//! place where text cells become typed values, so every default and
//! coercion rule lives here.
//!
//! ## Tables
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  menu     Categoria │ Producto │ Precio │ Costo │ Stock_Local1 │       │
//! │           Stock_Local2 │ Stock_Feria                                    │
//! │                                                                         │
//! │  ventas   Ticket_ID │ Fecha │ Hora │ Ubicacion │ Categoria │ Producto │ │
//! │           Cantidad │ Precio_Unit │ Costo_Unit │ Total_Venta │ Ganancia  │
//! │                                                                         │
//! │  recetas  Producto │ Ingrediente │ Cantidad_Base │ Costo_Ref           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Read Defaults
//! - Missing or unparseable numeric cell → 0 (logged when the cell was not
//!   blank)
//! - Missing `Categoria` → `General`
//! - Missing `Ubicacion` → `Local 1`
//! - Rows written before `Precio_Unit`/`Costo_Unit` existed derive them from
//!   `Total_Venta / Cantidad` and `(Total_Venta − Ganancia) / Cantidad`

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tracing::warn;

use tamal_core::{
    Catalog, Category, CoreError, Ledger, LineItem, Location, Money, Product, RecipeBook,
    RecipeLine, SaleLocation, StockLevels, TicketId,
};

use crate::error::{StoreError, StoreResult};
use crate::table::{parse_count, parse_money, parse_number, Record, Table};

// =============================================================================
// Table Names & Columns
// =============================================================================

pub const MENU: &str = "menu";
pub const VENTAS: &str = "ventas";
pub const RECETAS: &str = "recetas";

pub const MENU_COLUMNS: [&str; 7] = [
    "Categoria",
    "Producto",
    "Precio",
    "Costo",
    "Stock_Local1",
    "Stock_Local2",
    "Stock_Feria",
];

pub const VENTAS_COLUMNS: [&str; 11] = [
    "Ticket_ID",
    "Fecha",
    "Hora",
    "Ubicacion",
    "Categoria",
    "Producto",
    "Cantidad",
    "Precio_Unit",
    "Costo_Unit",
    "Total_Venta",
    "Ganancia",
];

pub const RECETAS_COLUMNS: [&str; 4] = ["Producto", "Ingrediente", "Cantidad_Base", "Costo_Ref"];

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

// =============================================================================
// Cell Readers
// =============================================================================

fn money_cell(table: &str, record: &Record<'_>, column: &str) -> Money {
    match record.non_empty(column) {
        None => Money::zero(),
        Some(cell) => parse_money(cell).unwrap_or_else(|| {
            warn!(table = %table, column = %column, cell = %cell, "Unparseable amount, using 0");
            Money::zero()
        }),
    }
}

fn count_cell(table: &str, record: &Record<'_>, column: &str) -> i64 {
    match record.non_empty(column) {
        None => 0,
        Some(cell) => parse_count(cell).unwrap_or_else(|| {
            warn!(table = %table, column = %column, cell = %cell, "Unparseable count, using 0");
            0
        }),
    }
}

fn measure_cell(table: &str, record: &Record<'_>, column: &str) -> f64 {
    match record.non_empty(column) {
        None => 0.0,
        Some(cell) => parse_number(cell).unwrap_or_else(|| {
            warn!(table = %table, column = %column, cell = %cell, "Unparseable number, using 0");
            0.0
        }),
    }
}

fn category_cell(table: &str, record: &Record<'_>) -> Category {
    match record.non_empty("Categoria") {
        None => Category::General,
        Some(label) => Category::from_label(label).unwrap_or_else(|| {
            warn!(table = %table, label = %label, "Unknown category, using General");
            Category::General
        }),
    }
}

fn format_measure(value: f64) -> String {
    format!("{}", value)
}

// =============================================================================
// menu
// =============================================================================

pub fn encode_catalog(catalog: &Catalog) -> Table {
    let mut table = Table::new(MENU_COLUMNS);
    for product in catalog.products() {
        table.push_row(vec![
            product.category.label().to_string(),
            product.name.clone(),
            product.price.to_plain_string(),
            product.cost.to_plain_string(),
            product.stock.get(Location::Local1).to_string(),
            product.stock.get(Location::Local2).to_string(),
            product.stock.get(Location::Feria).to_string(),
        ]);
    }
    table
}

/// Reads the `menu` table.
///
/// ## Errors
/// `Corrupt` if two rows share a product name.
pub fn decode_catalog(table: &Table) -> StoreResult<Catalog> {
    let mut products = Vec::with_capacity(table.len());
    for record in table.records() {
        let Some(name) = record.non_empty("Producto") else {
            warn!(table = MENU, "Skipping menu row without a product name");
            continue;
        };

        let stock = StockLevels::from_pairs(
            Location::ALL.map(|loc| (loc, count_cell(MENU, &record, loc.stock_column()))),
        );
        if Location::ALL.iter().any(|loc| stock.get(*loc) < 0) {
            warn!(product = %name, "Stored stock is negative");
        }

        products.push(Product {
            name: name.to_string(),
            category: category_cell(MENU, &record),
            price: money_cell(MENU, &record, "Precio"),
            cost: money_cell(MENU, &record, "Costo"),
            stock,
        });
    }

    Catalog::from_products(products).map_err(|err| match err {
        CoreError::DuplicateProduct(name) => {
            StoreError::corrupt(MENU, format!("duplicate product '{}'", name))
        }
        other => StoreError::corrupt(MENU, other),
    })
}

// =============================================================================
// ventas
// =============================================================================

pub fn encode_ledger(ledger: &Ledger) -> Table {
    let mut table = Table::new(VENTAS_COLUMNS);
    for line in ledger.lines() {
        table.push_row(vec![
            line.ticket_id.to_string(),
            line.date.format(DATE_FORMAT).to_string(),
            line.time.format(TIME_FORMAT).to_string(),
            line.location.label().to_string(),
            line.category.label().to_string(),
            line.product.clone(),
            line.quantity.to_string(),
            line.unit_price.to_plain_string(),
            line.unit_cost.to_plain_string(),
            line.revenue().to_plain_string(),
            line.margin().to_plain_string(),
        ]);
    }
    table
}

/// The timestamp encoded in a ticket id, if it has one.
fn ticket_timestamp(id: &TicketId) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(id.as_str(), "%Y%m%d-%H%M%S").ok()
}

fn sale_date(record: &Record<'_>, id: &TicketId) -> NaiveDate {
    record
        .non_empty("Fecha")
        .and_then(|cell| NaiveDate::parse_from_str(cell, DATE_FORMAT).ok())
        .or_else(|| ticket_timestamp(id).map(|at| at.date()))
        .or_else(|| NaiveDate::from_ymd_opt(1970, 1, 1))
        .unwrap_or(NaiveDate::MIN)
}

fn sale_time(record: &Record<'_>, id: &TicketId) -> NaiveTime {
    record
        .non_empty("Hora")
        .and_then(|cell| {
            NaiveTime::parse_from_str(cell, TIME_FORMAT)
                .or_else(|_| NaiveTime::parse_from_str(cell, "%H:%M"))
                .ok()
        })
        .or_else(|| ticket_timestamp(id).map(|at| at.time()))
        .unwrap_or_default()
}

/// Unit amount from a stored line total, for rows that predate the unit
/// columns.
fn per_unit(total: Money, quantity: i64) -> Money {
    total.checked_div_round(quantity).unwrap_or_default()
}

/// Reads the `ventas` table.
pub fn decode_ledger(table: &Table) -> Ledger {
    let mut lines = Vec::with_capacity(table.len());
    for record in table.records() {
        let Some(raw_id) = record.non_empty("Ticket_ID") else {
            warn!(table = VENTAS, "Skipping sale row without a ticket id");
            continue;
        };
        let ticket_id = TicketId::new(raw_id);
        let quantity = count_cell(VENTAS, &record, "Cantidad");
        let total = money_cell(VENTAS, &record, "Total_Venta");
        let profit = money_cell(VENTAS, &record, "Ganancia");

        let unit_price = match record.non_empty("Precio_Unit") {
            Some(_) => money_cell(VENTAS, &record, "Precio_Unit"),
            None => per_unit(total, quantity),
        };
        let unit_cost = match record.non_empty("Costo_Unit") {
            Some(_) => money_cell(VENTAS, &record, "Costo_Unit"),
            None => per_unit(total - profit, quantity),
        };

        let location = match record.non_empty("Ubicacion") {
            Some(label) => SaleLocation::parse(label),
            None => SaleLocation::Known(Location::Local1),
        };

        lines.push(LineItem {
            date: sale_date(&record, &ticket_id),
            time: sale_time(&record, &ticket_id),
            ticket_id,
            location,
            category: category_cell(VENTAS, &record),
            product: record.get("Producto").unwrap_or_default().to_string(),
            quantity,
            unit_price,
            unit_cost,
        });
    }
    Ledger::from_lines(lines)
}

// =============================================================================
// recetas
// =============================================================================

pub fn encode_recipes(book: &RecipeBook) -> Table {
    let mut table = Table::new(RECETAS_COLUMNS);
    for row in book.rows() {
        table.push_row(vec![
            row.product.clone(),
            row.ingredient.clone(),
            format_measure(row.quantity),
            row.cost.to_plain_string(),
        ]);
    }
    table
}

/// Reads the `recetas` table.
pub fn decode_recipes(table: &Table) -> RecipeBook {
    let rows = table
        .records()
        .filter_map(|record| {
            let Some(product) = record.non_empty("Producto") else {
                warn!(table = RECETAS, "Skipping recipe row without a product");
                return None;
            };
            Some(RecipeLine {
                product: product.to_string(),
                ingredient: record.get("Ingrediente").unwrap_or_default().to_string(),
                quantity: measure_cell(RECETAS, &record, "Cantidad_Base"),
                cost: money_cell(RECETAS, &record, "Costo_Ref"),
            })
        })
        .collect();
    RecipeBook::from_rows(rows)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn tamal() -> Product {
        let mut product = Product::new(
            "Tamal Verde",
            Category::Tamales,
            Money::from_cents(2000),
            Money::from_cents(850),
        );
        product.stock.set(Location::Local1, 50);
        product.stock.set(Location::Local2, 30);
        product
    }

    #[test]
    fn test_catalog_round_trip() {
        let catalog = Catalog::from_products(vec![tamal()]).unwrap();
        let table = encode_catalog(&catalog);

        assert_eq!(table.columns(), MENU_COLUMNS.map(String::from).as_slice());
        assert_eq!(
            table.rows()[0],
            cells(&["🌽 Tamales", "Tamal Verde", "20.00", "8.50", "50", "30", "0"])
        );
        assert_eq!(decode_catalog(&table).unwrap(), catalog);
    }

    #[test]
    fn test_currency_text_and_plain_numbers_normalize_identically() {
        let header = MENU_COLUMNS.map(String::from).to_vec();
        let formatted = Table::from_parts(
            header.clone(),
            vec![cells(&["🌽 Tamales", "Tamal Verde", "$20", "$8.50", "50", "30", "0"])],
        );
        let plain = Table::from_parts(
            header,
            vec![cells(&["Tamales", "Tamal Verde", "20", "8.5", "50.0", "30", ""])],
        );

        assert_eq!(decode_catalog(&formatted).unwrap(), decode_catalog(&plain).unwrap());
    }

    #[test]
    fn test_menu_defaults_for_missing_columns() {
        let table = Table::from_parts(
            cells(&["Producto", "Precio"]),
            vec![cells(&["Atole", "n/a"]), cells(&["", "5"])],
        );
        let catalog = decode_catalog(&table).unwrap();

        assert_eq!(catalog.len(), 1);
        let atole = catalog.get("Atole").unwrap();
        assert_eq!(atole.category, Category::General);
        assert_eq!(atole.price, Money::zero());
        assert_eq!(atole.stock.total(), 0);
    }

    #[test]
    fn test_duplicate_menu_rows_are_corrupt() {
        let table = Table::from_parts(
            cells(&["Producto"]),
            vec![cells(&["Atole"]), cells(&["Atole"])],
        );
        assert!(matches!(decode_catalog(&table), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn test_ledger_round_trip() {
        let mut catalog = Catalog::from_products(vec![tamal()]).unwrap();
        let mut ledger = Ledger::default();
        let now = NaiveDate::from_ymd_opt(2026, 5, 1)
            .unwrap()
            .and_hms_opt(13, 30, 5)
            .unwrap();
        tamal_core::ledger::checkout(
            &mut catalog,
            &mut ledger,
            Location::Local1,
            &[tamal_core::CartLine::new("Tamal Verde", 3)],
            now,
        )
        .unwrap();

        let table = encode_ledger(&ledger);
        assert_eq!(
            table.rows()[0],
            cells(&[
                "20260501-133005",
                "2026-05-01",
                "13:30:05",
                "Local 1",
                "🌽 Tamales",
                "Tamal Verde",
                "3",
                "20.00",
                "8.50",
                "60.00",
                "34.50",
            ])
        );
        assert_eq!(decode_ledger(&table), ledger);
    }

    #[test]
    fn test_legacy_ledger_rows() {
        let table = Table::from_parts(
            cells(&["Ticket_ID", "Fecha", "Hora", "Producto", "Cantidad", "Total_Venta", "Ganancia"]),
            vec![cells(&["20250102-080910", "", "", "Tamal Verde", "3", "$60", "34.5"])],
        );
        let ledger = decode_ledger(&table);
        let line = &ledger.lines()[0];

        assert_eq!(line.location, SaleLocation::Known(Location::Local1));
        assert_eq!(line.category, Category::General);
        assert_eq!(line.unit_price, Money::from_cents(2000));
        assert_eq!(line.unit_cost, Money::from_cents(850));
        assert_eq!(line.date, NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());
        assert_eq!(line.time, NaiveTime::from_hms_opt(8, 9, 10).unwrap());
    }

    #[test]
    fn test_unrecognized_location_is_kept() {
        let table = Table::from_parts(
            cells(&["Ticket_ID", "Ubicacion", "Producto", "Cantidad"]),
            vec![cells(&["t-1", "Bodega", "Atole", "1"])],
        );
        let ledger = decode_ledger(&table);
        assert_eq!(
            ledger.lines()[0].location,
            SaleLocation::Unrecognized("Bodega".to_string())
        );
    }

    #[test]
    fn test_recipes_round_trip() {
        let book = RecipeBook::from_rows(vec![RecipeLine {
            product: "Tamal Verde".to_string(),
            ingredient: "Masa".to_string(),
            quantity: 0.5,
            cost: Money::from_cents(15000),
        }]);
        let table = encode_recipes(&book);
        assert_eq!(table.rows()[0], cells(&["Tamal Verde", "Masa", "0.5", "150.00"]));
        assert_eq!(decode_recipes(&table), book);
    }
}
