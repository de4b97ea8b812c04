//! # Domain Types
//!
//! Core domain types used throughout Tamal POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │     Ticket      │   │   RecipeLine    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  name (key)     │   │  id (timestamp) │   │  product (FK)   │       │
//! │  │  category       │   │  location       │   │  ingredient     │       │
//! │  │  price / cost   │   │  lines ───────┐ │   │  quantity       │       │
//! │  │  stock[loc]     │   └───────────────┼─┘   │  cost           │       │
//! │  └─────────────────┘                   ▼     └─────────────────┘       │
//! │                                 ┌─────────────────┐                     │
//! │  ┌─────────────────┐            │    LineItem     │                     │
//! │  │    Location     │            │  product (name) │                     │
//! │  │  Local 1        │            │  quantity       │                     │
//! │  │  Local 2        │            │  unit_price ◄── snapshot at sale      │
//! │  │  Feria          │            │  unit_cost  ◄── snapshot at sale      │
//! │  └─────────────────┘            └─────────────────┘                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Cross references are by name or ticket id, never live pointers: every
//! engine operation reloads its inputs from the snapshot store.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::SUGGESTED_PRICE_FACTORS;

// =============================================================================
// Category
// =============================================================================

/// Menu category.
///
/// The five sellable categories carry the emoji labels the menu sheet has
/// always used; `General` is the label given to rows with no category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Tamales,
    Comida,
    Bebidas,
    Postres,
    Snacks,
    General,
}

impl Category {
    /// The categories shown as menu tabs, in display order.
    pub const MENU: [Category; 5] = [
        Category::Tamales,
        Category::Comida,
        Category::Bebidas,
        Category::Postres,
        Category::Snacks,
    ];

    /// Returns the label stored in the `Categoria` column.
    pub const fn label(&self) -> &'static str {
        match self {
            Category::Tamales => "🌽 Tamales",
            Category::Comida => "🍔 Comida",
            Category::Bebidas => "🥤 Bebidas",
            Category::Postres => "🍬 Postres",
            Category::Snacks => "🍟 Snacks",
            Category::General => "General",
        }
    }

    const fn plain_name(&self) -> &'static str {
        match self {
            Category::Tamales => "tamales",
            Category::Comida => "comida",
            Category::Bebidas => "bebidas",
            Category::Postres => "postres",
            Category::Snacks => "snacks",
            Category::General => "general",
        }
    }

    /// Reads a stored label, with or without its emoji.
    ///
    /// Returns `None` for text that names no category.
    pub fn from_label(label: &str) -> Option<Category> {
        let plain = label
            .trim_start_matches(|c: char| !c.is_alphanumeric())
            .trim()
            .to_lowercase();

        Category::MENU
            .iter()
            .chain(std::iter::once(&Category::General))
            .find(|c| c.plain_name() == plain)
            .copied()
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::General
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Location
// =============================================================================

/// One of the three fixed sites that hold stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    Local1,
    Local2,
    Feria,
}

impl Location {
    /// All locations in stock-column order. The first one is the fallback
    /// site for the legacy unknown-location policy.
    pub const ALL: [Location; 3] = [Location::Local1, Location::Local2, Location::Feria];

    /// Label stored in the `Ubicacion` column.
    pub const fn label(&self) -> &'static str {
        match self {
            Location::Local1 => "Local 1",
            Location::Local2 => "Local 2",
            Location::Feria => "Feria",
        }
    }

    /// Name of the catalog column holding this location's stock.
    pub const fn stock_column(&self) -> &'static str {
        match self {
            Location::Local1 => "Stock_Local1",
            Location::Local2 => "Stock_Local2",
            Location::Feria => "Stock_Feria",
        }
    }

    const fn index(&self) -> usize {
        match self {
            Location::Local1 => 0,
            Location::Local2 => 1,
            Location::Feria => 2,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Location {
    type Err = String;

    /// Accepts `"Local 1"`, `"local1"`, `"Stock_Local1"` and the like.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .trim_start_matches("Stock_")
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_')
            .collect::<String>()
            .to_lowercase();

        match key.as_str() {
            "local1" => Ok(Location::Local1),
            "local2" => Ok(Location::Local2),
            "feria" => Ok(Location::Feria),
            _ => Err(format!("Unknown location: '{}'", s.trim())),
        }
    }
}

/// What to do with a ledger line whose location label is not recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownLocationPolicy {
    /// Fail the operation with `CoreError::UnknownLocation`.
    #[default]
    Reject,
    /// Treat the line as belonging to the first location.
    FallbackFirst,
}

/// The location recorded on a ledger line.
///
/// Ledger rows are free text in the store, so a label may not name any
/// known site. The raw label is kept and resolved only when a stock column
/// is actually needed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SaleLocation {
    Known(Location),
    Unrecognized(String),
}

impl SaleLocation {
    /// Reads a stored `Ubicacion` label.
    pub fn parse(label: &str) -> Self {
        match label.parse::<Location>() {
            Ok(location) => SaleLocation::Known(location),
            Err(_) => SaleLocation::Unrecognized(label.trim().to_string()),
        }
    }

    /// Label to store and display.
    pub fn label(&self) -> &str {
        match self {
            SaleLocation::Known(location) => location.label(),
            SaleLocation::Unrecognized(label) => label,
        }
    }

    /// Returns the known location, if any.
    pub fn known(&self) -> Option<Location> {
        match self {
            SaleLocation::Known(location) => Some(*location),
            SaleLocation::Unrecognized(_) => None,
        }
    }

    /// Maps this label to a stock location under the given policy.
    pub fn resolve(&self, policy: UnknownLocationPolicy, ticket_id: &str) -> CoreResult<Location> {
        match (self, policy) {
            (SaleLocation::Known(location), _) => Ok(*location),
            (SaleLocation::Unrecognized(_), UnknownLocationPolicy::FallbackFirst) => {
                Ok(Location::ALL[0])
            }
            (SaleLocation::Unrecognized(label), UnknownLocationPolicy::Reject) => {
                Err(CoreError::UnknownLocation {
                    label: label.clone(),
                    ticket_id: ticket_id.to_string(),
                })
            }
        }
    }
}

impl From<Location> for SaleLocation {
    fn from(location: Location) -> Self {
        SaleLocation::Known(location)
    }
}

impl fmt::Display for SaleLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Stock Levels
// =============================================================================

/// Units on hand at each location.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevels([i64; 3]);

impl StockLevels {
    /// Builds stock levels from `(location, quantity)` pairs.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Location, i64)>) -> Self {
        let mut levels = StockLevels::default();
        for (location, qty) in pairs {
            levels.set(location, qty);
        }
        levels
    }

    #[inline]
    pub fn get(&self, location: Location) -> i64 {
        self.0[location.index()]
    }

    #[inline]
    pub fn set(&mut self, location: Location, qty: i64) {
        self.0[location.index()] = qty;
    }

    /// Units across every location.
    pub fn total(&self) -> i64 {
        self.0.iter().sum()
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product on the menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Display name, unique within the catalog.
    pub name: String,

    pub category: Category,

    /// Unit sale price.
    pub price: Money,

    /// Unit cost, usually derived from the product's recipe.
    pub cost: Money,

    pub stock: StockLevels,
}

impl Product {
    /// Creates a product with no stock anywhere.
    pub fn new(name: impl Into<String>, category: Category, price: Money, cost: Money) -> Self {
        Product {
            name: name.into(),
            category,
            price,
            cost,
            stock: StockLevels::default(),
        }
    }

    /// Unit margin (price − cost).
    #[inline]
    pub fn margin(&self) -> Money {
        self.price - self.cost
    }

    /// Suggested sale prices derived from cost (×1.5 and ×3.0).
    pub fn suggested_prices(&self) -> SuggestedPrices {
        let [(num_low, den_low), (num_high, den_high)] = SUGGESTED_PRICE_FACTORS;
        SuggestedPrices {
            conservative: self.cost.mul_ratio(num_low, den_low),
            premium: self.cost.mul_ratio(num_high, den_high),
        }
    }

    /// Read-only pricing view shown next to the stock editor.
    pub fn pricing_view(&self) -> PricingView {
        PricingView {
            name: self.name.clone(),
            category: self.category,
            price: self.price,
            cost: self.cost,
            margin: self.margin(),
            suggested: self.suggested_prices(),
        }
    }
}

/// Price tiers suggested from unit cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedPrices {
    /// cost × 1.5
    pub conservative: Money,
    /// cost × 3.0
    pub premium: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingView {
    pub name: String,
    pub category: Category,
    pub price: Money,
    pub cost: Money,
    pub margin: Money,
    pub suggested: SuggestedPrices,
}

// =============================================================================
// Ticket Id
// =============================================================================

/// Timestamp-derived ticket identifier (`YYYYMMDD-HHMMSS`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TicketId(String);

impl TicketId {
    const FORMAT: &'static str = "%Y%m%d-%H%M%S";

    /// Builds the id for a checkout at `at` (second resolution).
    pub fn from_timestamp(at: NaiveDateTime) -> Self {
        TicketId(at.format(Self::FORMAT).to_string())
    }

    /// Wraps a stored id, normalizing surrounding whitespace.
    pub fn new(raw: impl AsRef<str>) -> Self {
        TicketId(raw.as_ref().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compares against a caller-supplied id the way the ledger does.
    pub fn matches(&self, other: &str) -> bool {
        self.0 == other.trim()
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// One product-quantity entry of a ticket.
///
/// Uses the snapshot pattern: unit price and unit cost are frozen at the
/// moment of sale, so later catalog edits never rewrite history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub ticket_id: TicketId,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub location: SaleLocation,
    /// Category at time of sale (frozen).
    pub category: Category,
    pub product: String,
    pub quantity: i64,
    /// Unit price at time of sale (frozen).
    pub unit_price: Money,
    /// Unit cost at time of sale (frozen).
    pub unit_cost: Money,
}

impl LineItem {
    /// Line revenue (unit price × quantity).
    #[inline]
    pub fn revenue(&self) -> Money {
        self.unit_price * self.quantity
    }

    /// Line cost (unit cost × quantity).
    #[inline]
    pub fn cost(&self) -> Money {
        self.unit_cost * self.quantity
    }

    /// Line margin ((price − cost) × quantity).
    #[inline]
    pub fn margin(&self) -> Money {
        (self.unit_price - self.unit_cost) * self.quantity
    }

    pub fn sold_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }
}

// =============================================================================
// Ticket
// =============================================================================

/// A completed sale: one or more line items under one id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub created_at: NaiveDateTime,
    pub location: SaleLocation,
    pub lines: Vec<LineItem>,
}

impl Ticket {
    /// Ticket revenue (Σ line revenue).
    pub fn total(&self) -> Money {
        self.lines.iter().map(LineItem::revenue).sum()
    }

    /// Σ line margin.
    pub fn margin(&self) -> Money {
        self.lines.iter().map(LineItem::margin).sum()
    }

    /// Σ line cost.
    pub fn cost(&self) -> Money {
        self.lines.iter().map(LineItem::cost).sum()
    }

    /// Units across all lines.
    pub fn units(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}

// =============================================================================
// Recipe Line
// =============================================================================

/// One persisted ingredient row of a product's recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeLine {
    pub product: String,
    pub ingredient: String,
    /// Amount used (lot fraction or grams/ml, depending on how it was costed).
    pub quantity: f64,
    /// Contribution of this ingredient to the batch cost.
    pub cost: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================
