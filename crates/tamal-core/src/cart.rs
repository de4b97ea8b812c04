//! # Cart Session
//!
//! The per-session cart a cashier builds before checkout.
//!
//! A `CartSession` is owned by one UI session and passed into engine calls
//! explicitly. It only records product names and quantities; prices are
//! read from the catalog at checkout time, so the running total shown while
//! building the cart is informational.
//!
//! ```text
//! add("Tamal Verde", 2) ──► [Tamal Verde × 2]
//! add("Tamal Verde", 1) ──► [Tamal Verde × 3]      (accumulates)
//! add("Atole", 1)       ──► [Tamal Verde × 3, Atole × 1]
//! set_quantity("Atole", 0) ──► [Tamal Verde × 3]   (zero removes)
//! ```

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::error::{CoreError, CoreResult};
use crate::ledger::CartLine;
use crate::money::Money;
use crate::validation::{validate_cart_size, validate_product_name, validate_quantity};

/// Cart contents for one session, in the order products were added.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartSession {
    lines: Vec<CartLine>,
}

impl CartSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `quantity` units of a product, merging with an existing line.
    ///
    /// ## Returns
    /// The product's quantity after the add.
    pub fn add(&mut self, product: &str, quantity: i64) -> CoreResult<i64> {
        validate_product_name(product)?;
        validate_quantity(quantity)?;
        let product = product.trim();

        if let Some(line) = self.lines.iter_mut().find(|l| l.product == product) {
            let combined = line.quantity + quantity;
            validate_quantity(combined)?;
            line.quantity = combined;
            return Ok(combined);
        }

        validate_cart_size(self.lines.len())?;
        self.lines.push(CartLine::new(product, quantity));
        Ok(quantity)
    }

    /// Replaces a product's quantity. Zero removes the line.
    pub fn set_quantity(&mut self, product: &str, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            self.remove(product);
            return Ok(());
        }
        validate_quantity(quantity)?;

        let product = product.trim();
        match self.lines.iter_mut().find(|l| l.product == product) {
            Some(line) => line.quantity = quantity,
            None => {
                validate_product_name(product)?;
                validate_cart_size(self.lines.len())?;
                self.lines.push(CartLine::new(product, quantity));
            }
        }
        Ok(())
    }

    /// Drops a product's line. Returns whether it was present.
    pub fn remove(&mut self, product: &str) -> bool {
        let product = product.trim();
        let before = self.lines.len();
        self.lines.retain(|l| l.product != product);
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Units across all lines.
    pub fn units(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Running total at current catalog prices.
    pub fn total(&self, catalog: &Catalog) -> CoreResult<Money> {
        self.lines.iter().try_fold(Money::zero(), |acc, line| {
            let product = catalog.get(&line.product)?;
            Ok(acc + product.price * line.quantity)
        })
    }
}

/// Change owed for a cash payment.
///
/// ## Example
/// ```rust
/// use tamal_core::{change_due, Money};
///
/// let change = change_due(Money::from_cents(6000), Money::from_cents(10000)).unwrap();
/// assert_eq!(change.cents(), 4000);
/// ```
pub fn change_due(total: Money, tendered: Money) -> CoreResult<Money> {
    if tendered < total {
        return Err(CoreError::InsufficientPayment {
            total: total.cents(),
            tendered: tendered.cents(),
        });
    }
    Ok(tendered - total)
}
