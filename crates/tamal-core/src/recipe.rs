//! # Recipe Costing
//!
//! Derives a product's unit cost from the ingredients that go into one batch.
//!
//! ## Costing Modes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Costing Modes                                   │
//! │                                                                         │
//! │  Lot mode  (whole batch, divided by yield)                             │
//! │  ─────────────────────────────────────────                              │
//! │   contribution = purchase_cost × fraction_used      (0.0 ..= 1.0)      │
//! │   unit cost    = Σ contributions / yield            (yield ≥ 1)        │
//! │                                                                         │
//! │   $300 masa lot, all of it + $125 pork, all of it, yield 50           │
//! │   → $425.00 / 50 = $8.50 per tamal                                     │
//! │                                                                         │
//! │  Unit mode (per gram / per ml, one piece)                              │
//! │  ─────────────────────────────────────────                              │
//! │   contribution = purchase_cost / package_size × amount_used           │
//! │   unit cost    = Σ contributions                    (yield is 1)       │
//! │                                                                         │
//! │   $40 per 1000 g masa, 120 g used → $4.80                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Session Lifecycle
//! A [`RecipeSession`] is the working list for one selected product.
//! Selecting a different product reloads the list from the persisted
//! [`RecipeBook`]; re-selecting the same product keeps unsaved edits.
//! [`RecipeSession::commit`] produces a [`RecipeCommit`] that the engine
//! applies to the catalog and the book before saving both tables.

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::RecipeLine;
use crate::validation::{
    validate_amount, validate_fraction, validate_ingredient_label, validate_measure,
    validate_package_size,
};

// =============================================================================
// Ingredient Input
// =============================================================================

/// How ingredient costs are allocated to one unit of product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostingMode {
    /// Whole-batch fractions divided by the batch yield.
    #[default]
    Lot,
    /// Per-unit-of-measure scaling for a single piece.
    Unit,
}

/// Purchase data for one ingredient, as entered in the calculator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum IngredientInput {
    /// Share of a whole purchased lot.
    Lot {
        purchase_cost: Money,
        /// 1.0 means the entire lot went into the batch.
        fraction_used: f64,
    },
    /// Amount drawn from a package of known size.
    Unit {
        purchase_cost: Money,
        /// Package size in grams, ml or pieces.
        package_size: f64,
        /// Amount used, in the same unit as `package_size`.
        amount_used: f64,
    },
}

impl IngredientInput {
    pub fn mode(&self) -> CostingMode {
        match self {
            IngredientInput::Lot { .. } => CostingMode::Lot,
            IngredientInput::Unit { .. } => CostingMode::Unit,
        }
    }

    /// The quantity stored with the recipe row.
    pub fn amount_used(&self) -> f64 {
        match *self {
            IngredientInput::Lot { fraction_used, .. } => fraction_used,
            IngredientInput::Unit { amount_used, .. } => amount_used,
        }
    }

    /// Cost this ingredient adds to the batch, rounded to the cent.
    pub fn contribution(&self) -> CoreResult<Money> {
        match *self {
            IngredientInput::Lot {
                purchase_cost,
                fraction_used,
            } => {
                validate_amount("purchase cost", purchase_cost)?;
                validate_fraction("fraction used", fraction_used)?;
                Ok(purchase_cost.scale(fraction_used))
            }
            IngredientInput::Unit {
                purchase_cost,
                package_size,
                amount_used,
            } => {
                validate_amount("purchase cost", purchase_cost)?;
                validate_package_size(package_size)?;
                validate_measure("amount used", amount_used)?;
                Ok(purchase_cost.scale(amount_used / package_size))
            }
        }
    }
}

/// One line of the working ingredient list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientLine {
    pub label: String,
    pub contribution: Money,
    pub amount_used: f64,
}

impl From<&RecipeLine> for IngredientLine {
    fn from(row: &RecipeLine) -> Self {
        IngredientLine {
            label: row.ingredient.clone(),
            contribution: row.cost,
            amount_used: row.quantity,
        }
    }
}

// =============================================================================
// Recipe Book
// =============================================================================

/// Every persisted recipe row (`recetas` table), in stored order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeBook {
    rows: Vec<RecipeLine>,
}

impl RecipeBook {
    pub fn from_rows(rows: Vec<RecipeLine>) -> Self {
        RecipeBook { rows }
    }

    pub fn rows(&self) -> &[RecipeLine] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<RecipeLine> {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows of one product's recipe.
    pub fn for_product<'a>(&'a self, product: &'a str) -> impl Iterator<Item = &'a RecipeLine> + 'a {
        let product = product.trim();
        self.rows.iter().filter(move |row| row.product == product)
    }

    /// Replaces a product's rows wholesale: drop the old ones, append the new.
    pub fn replace_product(&mut self, product: &str, rows: Vec<RecipeLine>) {
        let product = product.trim();
        self.rows.retain(|row| row.product != product);
        self.rows.extend(rows);
    }
}

// =============================================================================
// Recipe Session
// =============================================================================

/// Working set of the recipe calculator for one session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeSession {
    product: Option<String>,
    mode: CostingMode,
    lines: Vec<IngredientLine>,
}

impl RecipeSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects the product being costed.
    ///
    /// Switching to a different product replaces the working list with that
    /// product's persisted rows (or nothing). Returns `true` when the list
    /// was reset.
    pub fn select(&mut self, product: &str, book: &RecipeBook) -> bool {
        let product = product.trim();
        if self.product.as_deref() == Some(product) {
            return false;
        }

        self.lines = book.for_product(product).map(IngredientLine::from).collect();
        self.product = Some(product.to_string());
        true
    }

    pub fn product(&self) -> Option<&str> {
        self.product.as_deref()
    }

    pub fn mode(&self) -> CostingMode {
        self.mode
    }

    /// Chooses how the committed total is turned into a unit cost.
    pub fn set_mode(&mut self, mode: CostingMode) {
        self.mode = mode;
    }

    /// Costs an ingredient and appends it to the working list.
    pub fn add_line(&mut self, label: &str, input: IngredientInput) -> CoreResult<&IngredientLine> {
        validate_ingredient_label(label)?;
        let contribution = input.contribution()?;

        self.lines.push(IngredientLine {
            label: label.trim().to_string(),
            contribution,
            amount_used: input.amount_used(),
        });
        Ok(&self.lines[self.lines.len() - 1])
    }

    /// Removes the line at `index`.
    pub fn remove_line(&mut self, index: usize) -> CoreResult<IngredientLine> {
        if index >= self.lines.len() {
            return Err(ValidationError::OutOfRange {
                field: "ingredient index".to_string(),
                min: 0,
                max: self.lines.len() as i64 - 1,
            }
            .into());
        }
        Ok(self.lines.remove(index))
    }

    pub fn lines(&self) -> &[IngredientLine] {
        &self.lines
    }

    /// Batch cost: Σ contributions.
    pub fn total(&self) -> Money {
        self.lines.iter().map(|l| l.contribution).sum()
    }

    /// The divisor actually applied for `yield_count` in the current mode.
    fn effective_yield(&self, yield_count: u32) -> CoreResult<u32> {
        match self.mode {
            CostingMode::Unit => Ok(1),
            CostingMode::Lot if yield_count == 0 => Err(CoreError::InvalidYield(yield_count)),
            CostingMode::Lot => Ok(yield_count),
        }
    }

    /// Unit cost the current list would commit, without changing anything.
    pub fn preview(&self, yield_count: u32) -> CoreResult<Money> {
        let divisor = self.effective_yield(yield_count)?;
        self.total()
            .checked_div_round(i64::from(divisor))
            .ok_or(CoreError::InvalidYield(yield_count))
    }

    /// Fixes the unit cost and the rows to persist for the selected product.
    ///
    /// ## Errors
    /// - `InvalidYield` for a zero yield in lot mode
    /// - `Validation` if no product is selected
    pub fn commit(&self, yield_count: u32) -> CoreResult<RecipeCommit> {
        let product = self.product.clone().ok_or_else(|| ValidationError::Required {
            field: "product".to_string(),
        })?;
        let unit_cost = self.preview(yield_count)?;

        let rows = self
            .lines
            .iter()
            .map(|line| RecipeLine {
                product: product.clone(),
                ingredient: line.label.clone(),
                quantity: line.amount_used,
                cost: line.contribution,
            })
            .collect();

        Ok(RecipeCommit {
            product,
            total: self.total(),
            yield_count: self.effective_yield(yield_count)?,
            unit_cost,
            rows,
        })
    }
}

/// A committed costing, ready to apply to the catalog and recipe book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeCommit {
    pub product: String,
    pub total: Money,
    pub yield_count: u32,
    pub unit_cost: Money,
    pub rows: Vec<RecipeLine>,
}

impl RecipeCommit {
    /// Writes the unit cost into the catalog and replaces the product's rows.
    ///
    /// The catalog is checked first, so an unknown product leaves the book
    /// untouched.
    pub fn apply(&self, catalog: &mut Catalog, book: &mut RecipeBook) -> CoreResult<()> {
        catalog.set_cost(&self.product, self.unit_cost)?;
        book.replace_product(&self.product, self.rows.clone());
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
