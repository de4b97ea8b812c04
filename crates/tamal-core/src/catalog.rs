//! # Catalog
//!
//! The product catalog: an in-memory projection of the last `menu` snapshot
//! loaded by the current operation.
//!
//! ## Stock Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Stock Adjustment Rules                              │
//! │                                                                         │
//! │  adjust_stock(p, loc, delta)                                           │
//! │       │                                                                 │
//! │       ├── stock[loc] + delta < 0 ? ──► InsufficientStock (no change)   │
//! │       │                                                                 │
//! │       └── OK ──► stock[loc] += delta, return new quantity              │
//! │                                                                         │
//! │  transfer(p, A, B, q)      = adjust(A, −q) + adjust(B, +q), atomic     │
//! │  apply_deltas([...])       = validate every delta, then apply all      │
//! │                                                                         │
//! │  The catalog holds no durability of its own: the engine saves the     │
//! │  whole `menu` table after every mutation.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Category, Location, PricingView, Product};
use crate::validation::{
    checked_stock_change, validate_amount, validate_product_name, validate_stock_quantity,
};

/// A signed stock change for one product at one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockDelta {
    pub product: String,
    pub location: Location,
    pub delta: i64,
}

impl StockDelta {
    pub fn new(product: impl Into<String>, location: Location, delta: i64) -> Self {
        StockDelta {
            product: product.into(),
            location,
            delta,
        }
    }
}

/// Result of a successful transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub product: String,
    pub from: Location,
    pub to: Location,
    pub quantity: i64,
    /// Stock left at the source after the move.
    pub from_remaining: i64,
    /// Stock at the destination after the move.
    pub to_total: i64,
}

/// Partial edit of a product's commercial fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PricingUpdate {
    pub price: Option<Money>,
    pub cost: Option<Money>,
    pub category: Option<Category>,
}

/// Ordered collection of products keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Builds a catalog from snapshot rows, keeping their order.
    ///
    /// ## Errors
    /// `DuplicateProduct` if two rows share a name.
    pub fn from_products(products: Vec<Product>) -> CoreResult<Self> {
        let mut catalog = Catalog {
            products: Vec::with_capacity(products.len()),
        };
        for product in products {
            if catalog.contains(&product.name) {
                return Err(CoreError::DuplicateProduct(product.name));
            }
            catalog.products.push(product);
        }
        Ok(catalog)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn into_products(self) -> Vec<Product> {
        self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Looks up a product by name.
    pub fn get(&self, name: &str) -> CoreResult<&Product> {
        self.position(name)
            .map(|idx| &self.products[idx])
            .ok_or_else(|| CoreError::UnknownProduct(name.trim().to_string()))
    }

    fn get_mut(&mut self, name: &str) -> CoreResult<&mut Product> {
        match self.position(name) {
            Some(idx) => Ok(&mut self.products[idx]),
            None => Err(CoreError::UnknownProduct(name.trim().to_string())),
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.products.iter().position(|p| p.name == name)
    }

    /// Products of one menu tab, in catalog order.
    pub fn list_by_category(&self, category: Category) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(move |p| p.category == category)
    }

    /// Pricing view (margin + suggested prices) for one product.
    pub fn pricing_view(&self, name: &str) -> CoreResult<PricingView> {
        self.get(name).map(Product::pricing_view)
    }

    // =========================================================================
    // Catalog Edits
    // =========================================================================

    /// Adds a new product.
    ///
    /// ## Errors
    /// - `DuplicateProduct` if the name exists
    /// - `Validation` for an empty name, negative price/cost or stock
    pub fn create(&mut self, mut product: Product) -> CoreResult<()> {
        validate_product_name(&product.name)?;
        validate_amount("price", product.price)?;
        validate_amount("cost", product.cost)?;
        for location in Location::ALL {
            if product.stock.get(location) < 0 {
                return Err(ValidationError::MustNotBeNegative {
                    field: location.stock_column().to_string(),
                }
                .into());
            }
        }

        product.name = product.name.trim().to_string();
        if self.contains(&product.name) {
            return Err(CoreError::DuplicateProduct(product.name));
        }

        self.products.push(product);
        Ok(())
    }

    /// Removes a product row.
    pub fn remove(&mut self, name: &str) -> CoreResult<Product> {
        let idx = self
            .position(name)
            .ok_or_else(|| CoreError::UnknownProduct(name.trim().to_string()))?;
        Ok(self.products.remove(idx))
    }

    /// Edits price, cost and/or category.
    pub fn update_pricing(&mut self, name: &str, update: PricingUpdate) -> CoreResult<&Product> {
        if let Some(price) = update.price {
            validate_amount("price", price)?;
        }
        if let Some(cost) = update.cost {
            validate_amount("cost", cost)?;
        }

        let product = self.get_mut(name)?;
        if let Some(price) = update.price {
            product.price = price;
        }
        if let Some(cost) = update.cost {
            product.cost = cost;
        }
        if let Some(category) = update.category {
            product.category = category;
        }
        Ok(product)
    }

    /// Overwrites the unit cost (recipe commit).
    pub fn set_cost(&mut self, name: &str, cost: Money) -> CoreResult<()> {
        validate_amount("cost", cost)?;
        self.get_mut(name)?.cost = cost;
        Ok(())
    }

    // =========================================================================
    // Stock
    // =========================================================================

    pub fn stock(&self, name: &str, location: Location) -> CoreResult<i64> {
        Ok(self.get(name)?.stock.get(location))
    }

    /// Applies a signed change to one location's stock.
    ///
    /// ## Returns
    /// The new quantity.
    ///
    /// ## Errors
    /// `InsufficientStock` if the result would be negative, a validation
    /// error if it would not fit in `i64`; stock is left unchanged either way.
    pub fn adjust_stock(&mut self, name: &str, location: Location, delta: i64) -> CoreResult<i64> {
        let product = self.get_mut(name)?;
        let available = product.stock.get(location);
        let updated = checked_stock_change(available, delta)?;

        if updated < 0 {
            return Err(CoreError::InsufficientStock {
                product: product.name.clone(),
                location,
                available,
                requested: -delta,
            });
        }

        product.stock.set(location, updated);
        Ok(updated)
    }

    /// Moves units between two locations without changing total stock.
    ///
    /// Both legs apply or neither does.
    pub fn transfer(
        &mut self,
        name: &str,
        from: Location,
        to: Location,
        quantity: i64,
    ) -> CoreResult<TransferReceipt> {
        validate_stock_quantity(quantity)?;
        if from == to {
            return Err(ValidationError::Invalid {
                field: "location".to_string(),
                reason: "source and destination are the same".to_string(),
            }
            .into());
        }

        let product = self.get_mut(name)?;
        let available = product.stock.get(from);
        if available < quantity {
            return Err(CoreError::InsufficientStock {
                product: product.name.clone(),
                location: from,
                available,
                requested: quantity,
            });
        }
        let from_remaining = available - quantity;
        let to_total = checked_stock_change(product.stock.get(to), quantity)?;

        product.stock.set(from, from_remaining);
        product.stock.set(to, to_total);
        let product_name = product.name.clone();

        Ok(TransferReceipt {
            product: product_name,
            from,
            to,
            quantity,
            from_remaining,
            to_total,
        })
    }

    /// Validates every delta against current stock, then applies all of them.
    ///
    /// Deltas for the same product and location are netted first, so a cart
    /// with two lines of the same product is checked against its combined
    /// quantity.
    ///
    /// ## Errors
    /// The first `UnknownProduct` or `InsufficientStock` found; in that case
    /// no delta is applied.
    pub fn apply_deltas(&mut self, deltas: &[StockDelta]) -> CoreResult<()> {
        let mut netted: Vec<(usize, Location, i64)> = Vec::with_capacity(deltas.len());
        for delta in deltas {
            let idx = self
                .position(&delta.product)
                .ok_or_else(|| CoreError::UnknownProduct(delta.product.trim().to_string()))?;
            match netted
                .iter_mut()
                .find(|(i, loc, _)| *i == idx && *loc == delta.location)
            {
                Some(entry) => entry.2 = checked_stock_change(entry.2, delta.delta)?,
                None => netted.push((idx, delta.location, delta.delta)),
            }
        }

        for &(idx, location, delta) in &netted {
            let product = &self.products[idx];
            let available = product.stock.get(location);
            if checked_stock_change(available, delta)? < 0 {
                return Err(CoreError::InsufficientStock {
                    product: product.name.clone(),
                    location,
                    available,
                    requested: -delta,
                });
            }
        }

        for (idx, location, delta) in netted {
            let stock = &mut self.products[idx].stock;
            stock.set(location, stock.get(location) + delta);
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
