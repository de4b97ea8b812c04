//! # Ledger
//!
//! The append-only log of completed sales and the two operations that move
//! stock in lockstep with it: checkout and cancellation.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Checkout (pure part)                            │
//! │                                                                         │
//! │  cart lines ──► EmptyCart? ──► resolve products ──► snapshot price/cost│
//! │                                      │                                  │
//! │                                      ▼                                  │
//! │                     Catalog::apply_deltas(−qty per line)                │
//! │                     (validate all, then apply all)                      │
//! │                                      │                                  │
//! │                                      ▼                                  │
//! │                  next_ticket_id(now) ──► append lines ──► Ticket        │
//! │                                                                         │
//! │  The engine persists `ventas` then `menu` afterwards.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Cancellation
//! The exact inverse of checkout: every line of the ticket returns its
//! quantity to the location it was sold from, then the lines are dropped.
//! Location labels are resolved before anything is mutated, so a ticket with
//! an unrecognized label fails whole under the `Reject` policy.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, StockDelta};
use crate::error::{CoreError, CoreResult};
use crate::types::{LineItem, Location, SaleLocation, Ticket, TicketId, UnknownLocationPolicy};
use crate::validation::validate_quantity;

// =============================================================================
// Ledger
// =============================================================================

/// All persisted ledger lines, in stored order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    lines: Vec<LineItem>,
}

impl Ledger {
    pub fn from_lines(lines: Vec<LineItem>) -> Self {
        Ledger { lines }
    }

    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<LineItem> {
        self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn contains_ticket(&self, id: &str) -> bool {
        self.lines.iter().any(|line| line.ticket_id.matches(id))
    }

    /// Reassembles one ticket from its lines.
    pub fn ticket(&self, id: &str) -> Option<Ticket> {
        let lines: Vec<LineItem> = self
            .lines
            .iter()
            .filter(|line| line.ticket_id.matches(id))
            .cloned()
            .collect();
        ticket_from_lines(lines)
    }

    /// Groups every line into tickets, in order of first appearance.
    pub fn tickets(&self) -> Vec<Ticket> {
        let mut groups: Vec<Vec<LineItem>> = Vec::new();
        for line in &self.lines {
            match groups
                .iter_mut()
                .find(|group| group[0].ticket_id == line.ticket_id)
            {
                Some(group) => group.push(line.clone()),
                None => groups.push(vec![line.clone()]),
            }
        }
        groups.into_iter().filter_map(ticket_from_lines).collect()
    }

    /// Picks the id for a checkout at `now`.
    ///
    /// Ids have second resolution, so when `now` collides with an existing
    /// ticket the candidate moves forward one second at a time.
    pub fn next_ticket_id(&self, now: NaiveDateTime) -> (TicketId, NaiveDateTime) {
        let mut at = now;
        let mut id = TicketId::from_timestamp(at);
        while self.contains_ticket(id.as_str()) {
            at += Duration::seconds(1);
            id = TicketId::from_timestamp(at);
        }
        (id, at)
    }
}

fn ticket_from_lines(lines: Vec<LineItem>) -> Option<Ticket> {
    let first = lines.first()?;
    Some(Ticket {
        id: first.ticket_id.clone(),
        created_at: first.sold_at(),
        location: first.location.clone(),
        lines,
    })
}

// =============================================================================
// Checkout
// =============================================================================

/// A product and quantity requested at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product: String,
    pub quantity: i64,
}

impl CartLine {
    pub fn new(product: impl Into<String>, quantity: i64) -> Self {
        CartLine {
            product: product.into(),
            quantity,
        }
    }
}

/// Turns a cart into a ticket, decrementing stock at `location`.
///
/// On error neither `catalog` nor `ledger` has been touched.
///
/// ## Errors
/// - `EmptyCart` for an empty cart
/// - `Validation` for a non-positive or oversized quantity
/// - `UnknownProduct` if a line names no catalog product
/// - `InsufficientStock` naming the first product that runs short
pub fn checkout(
    catalog: &mut Catalog,
    ledger: &mut Ledger,
    location: Location,
    cart: &[CartLine],
    now: NaiveDateTime,
) -> CoreResult<Ticket> {
    if cart.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    let mut deltas = Vec::with_capacity(cart.len());
    let mut priced = Vec::with_capacity(cart.len());
    for line in cart {
        validate_quantity(line.quantity)?;
        let product = catalog.get(&line.product)?;
        deltas.push(StockDelta::new(product.name.clone(), location, -line.quantity));
        priced.push((product.clone(), line.quantity));
    }

    catalog.apply_deltas(&deltas)?;

    let (id, at) = ledger.next_ticket_id(now);
    let lines: Vec<LineItem> = priced
        .into_iter()
        .map(|(product, quantity)| LineItem {
            ticket_id: id.clone(),
            date: at.date(),
            time: at.time(),
            location: SaleLocation::Known(location),
            category: product.category,
            product: product.name,
            quantity,
            unit_price: product.price,
            unit_cost: product.cost,
        })
        .collect();

    ledger.lines.extend(lines.iter().cloned());

    Ok(Ticket {
        id,
        created_at: at,
        location: SaleLocation::Known(location),
        lines,
    })
}

// =============================================================================
// Cancellation
// =============================================================================

/// What a cancellation removed and restored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelledTicket {
    pub ticket_id: TicketId,
    /// The ledger lines that were removed.
    pub lines: Vec<LineItem>,
    /// Stock returned, one entry per restored line.
    pub restored: Vec<StockDelta>,
    /// Products no longer in the catalog; their lines were removed without
    /// restoring stock.
    pub skipped_products: Vec<String>,
}

/// Reverses a ticket: restores stock for each line and drops its lines.
///
/// ## Errors
/// - `TicketNotFound` if no line carries `ticket_id` (including a second
///   cancel of the same ticket)
/// - `UnknownLocation` under `UnknownLocationPolicy::Reject` when a line's
///   location label is unrecognized; nothing is mutated
pub fn cancel(
    catalog: &mut Catalog,
    ledger: &mut Ledger,
    ticket_id: &str,
    policy: UnknownLocationPolicy,
) -> CoreResult<CancelledTicket> {
    let matching: Vec<LineItem> = ledger
        .lines
        .iter()
        .filter(|line| line.ticket_id.matches(ticket_id))
        .cloned()
        .collect();

    let Some(first) = matching.first() else {
        return Err(CoreError::TicketNotFound(ticket_id.trim().to_string()));
    };
    let id = first.ticket_id.clone();

    let mut restored = Vec::with_capacity(matching.len());
    let mut skipped_products = Vec::new();
    for line in &matching {
        let location = line.location.resolve(policy, id.as_str())?;
        if catalog.contains(&line.product) {
            restored.push(StockDelta::new(line.product.clone(), location, line.quantity));
        } else {
            skipped_products.push(line.product.clone());
        }
    }

    catalog.apply_deltas(&restored)?;
    ledger.lines.retain(|line| line.ticket_id != id);

    Ok(CancelledTicket {
        ticket_id: id,
        lines: matching,
        restored,
        skipped_products,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::{Category, Product};
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 5, 1)
            .unwrap()
            .and_hms_opt(13, 30, 0)
            .unwrap()
    }

    fn catalog() -> Catalog {
        let mut tamal = Product::new(
            "Tamal Verde",
            Category::Tamales,
            Money::from_cents(2000),
            Money::from_cents(850),
        );
        tamal.stock.set(Location::Local1, 50);

        let mut atole = Product::new(
            "Atole",
            Category::Bebidas,
            Money::from_cents(1500),
            Money::from_cents(400),
        );
        atole.stock.set(Location::Local1, 5);

        Catalog::from_products(vec![tamal, atole]).unwrap()
    }

    #[test]
    fn test_checkout_snapshots_and_decrements() {
        let mut catalog = catalog();
        let mut ledger = Ledger::default();

        let ticket = checkout(
            &mut catalog,
            &mut ledger,
            Location::Local1,
            &[CartLine::new("Tamal Verde", 3)],
            now(),
        )
        .unwrap();

        assert_eq!(ticket.id.as_str(), "20260501-133000");
        assert_eq!(ticket.total(), Money::from_cents(6000));
        assert_eq!(ticket.margin(), Money::from_cents(3450));
        assert_eq!(catalog.stock("Tamal Verde", Location::Local1).unwrap(), 47);
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.lines()[0].unit_cost, Money::from_cents(850));
    }

    #[test]
    fn test_checkout_totals_are_line_sums() {
        let mut catalog = catalog();
        let mut ledger = Ledger::default();
        let cart = [CartLine::new("Tamal Verde", 2), CartLine::new("Atole", 3)];

        let ticket = checkout(&mut catalog, &mut ledger, Location::Local1, &cart, now()).unwrap();

        let revenue: Money = ticket.lines.iter().map(|l| l.revenue()).sum();
        assert_eq!(ticket.total(), revenue);
        assert_eq!(ticket.total(), Money::from_cents(8500));
        assert_eq!(ticket.margin(), ticket.total() - ticket.cost());
        assert_eq!(ticket.units(), 5);
    }

    #[test]
    fn test_later_price_change_does_not_rewrite_history() {
        let mut catalog = catalog();
        let mut ledger = Ledger::default();
        checkout(
            &mut catalog,
            &mut ledger,
            Location::Local1,
            &[CartLine::new("Atole", 1)],
            now(),
        )
        .unwrap();

        catalog.set_cost("Atole", Money::from_cents(999)).unwrap();
        assert_eq!(ledger.lines()[0].unit_cost, Money::from_cents(400));
    }

    #[test]
    fn test_checkout_failures_mutate_nothing() {
        let mut catalog = catalog();
        let mut ledger = Ledger::default();
        let before = catalog.clone();

        assert_eq!(
            checkout(&mut catalog, &mut ledger, Location::Local1, &[], now()),
            Err(CoreError::EmptyCart)
        );

        let cart = [CartLine::new("Tamal Verde", 1), CartLine::new("Pozole", 1)];
        assert_eq!(
            checkout(&mut catalog, &mut ledger, Location::Local1, &cart, now()),
            Err(CoreError::UnknownProduct("Pozole".to_string()))
        );

        let cart = [CartLine::new("Tamal Verde", 1)];
        let err = checkout(&mut catalog, &mut ledger, Location::Feria, &cart, now()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock { location: Location::Feria, available: 0, .. }
        ));

        let cart = [CartLine::new("Tamal Verde", 1), CartLine::new("Atole", 6)];
        assert!(checkout(&mut catalog, &mut ledger, Location::Local1, &cart, now()).is_err());

        assert_eq!(catalog, before);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_same_second_checkouts_get_distinct_ids() {
        let mut catalog = catalog();
        let mut ledger = Ledger::default();
        let cart = [CartLine::new("Tamal Verde", 1)];

        let first = checkout(&mut catalog, &mut ledger, Location::Local1, &cart, now()).unwrap();
        let second = checkout(&mut catalog, &mut ledger, Location::Local1, &cart, now()).unwrap();

        assert_eq!(first.id.as_str(), "20260501-133000");
        assert_eq!(second.id.as_str(), "20260501-133001");
        assert_eq!(ledger.tickets().len(), 2);
    }

    #[test]
    fn test_cancel_is_inverse_of_checkout() {
        let mut catalog = catalog();
        let mut ledger = Ledger::default();
        let before = catalog.clone();
        let cart = [CartLine::new("Tamal Verde", 3), CartLine::new("Atole", 2)];

        let ticket = checkout(&mut catalog, &mut ledger, Location::Local1, &cart, now()).unwrap();
        let cancelled = cancel(
            &mut catalog,
            &mut ledger,
            &format!(" {} ", ticket.id),
            UnknownLocationPolicy::Reject,
        )
        .unwrap();

        assert_eq!(cancelled.lines.len(), 2);
        assert!(cancelled.skipped_products.is_empty());
        assert_eq!(catalog, before);
        assert!(!ledger.contains_ticket(ticket.id.as_str()));

        assert_eq!(
            cancel(&mut catalog, &mut ledger, ticket.id.as_str(), UnknownLocationPolicy::Reject),
            Err(CoreError::TicketNotFound(ticket.id.to_string()))
        );
        assert_eq!(catalog, before);
    }

    #[test]
    fn test_cancel_skips_removed_products() {
        let mut catalog = catalog();
        let mut ledger = Ledger::default();
        let cart = [CartLine::new("Atole", 1)];
        let ticket = checkout(&mut catalog, &mut ledger, Location::Local1, &cart, now()).unwrap();

        catalog.remove("Atole").unwrap();
        let cancelled = cancel(
            &mut catalog,
            &mut ledger,
            ticket.id.as_str(),
            UnknownLocationPolicy::Reject,
        )
        .unwrap();

        assert_eq!(cancelled.skipped_products, vec!["Atole".to_string()]);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_cancel_unknown_location_policy() {
        let mut catalog = catalog();
        let line = LineItem {
            ticket_id: TicketId::new("20250101-100000"),
            date: now().date(),
            time: now().time(),
            location: SaleLocation::parse("Bodega"),
            category: Category::Tamales,
            product: "Tamal Verde".to_string(),
            quantity: 2,
            unit_price: Money::from_cents(2000),
            unit_cost: Money::from_cents(850),
        };
        let mut ledger = Ledger::from_lines(vec![line]);
        let before = (catalog.clone(), ledger.clone());

        let err = cancel(
            &mut catalog,
            &mut ledger,
            "20250101-100000",
            UnknownLocationPolicy::Reject,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::UnknownLocation { ref label, .. } if label == "Bodega"));
        assert_eq!((catalog.clone(), ledger.clone()), before);

        cancel(
            &mut catalog,
            &mut ledger,
            "20250101-100000",
            UnknownLocationPolicy::FallbackFirst,
        )
        .unwrap();
        assert_eq!(catalog.stock("Tamal Verde", Location::Local1).unwrap(), 52);
        assert!(ledger.is_empty());
    }
}
