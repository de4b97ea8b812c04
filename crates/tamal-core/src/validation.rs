//! # Validation Module
//!
//! Input validation utilities for Tamal POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: UI collaborator                                              │
//! │  ├── Free-text checks (ingredient labels, product names)               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: tamal-core (THIS MODULE)                                     │
//! │  └── Business rule validation before any mutation                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Snapshot store boundary                                      │
//! │  └── Numeric normalization of stored cells                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 200 characters
///
/// ## Example
/// ```rust
/// use tamal_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Tamal Verde").is_ok());
/// assert!(validate_product_name("  ").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_label("name", name, 200)
}

/// Validates an ingredient label (e.g. "Masa", "Carne de cerdo").
pub fn validate_ingredient_label(label: &str) -> ValidationResult<()> {
    validate_label("ingredient", label, 100)
}

fn validate_label(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a cart line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a stock movement quantity (transfers).
///
/// Only positivity is checked; how much can move is bounded by the source
/// location's stock, not by [`MAX_ITEM_QUANTITY`].
pub fn validate_stock_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Adds a signed stock change to `current`.
///
/// `i64::MIN` is never accepted as a change, so the negated change is
/// always representable.
///
/// ## Example
/// ```rust
/// use tamal_core::validation::checked_stock_change;
///
/// assert_eq!(checked_stock_change(50, -3).unwrap(), 47);
/// assert!(checked_stock_change(1, i64::MAX).is_err());
/// assert!(checked_stock_change(0, i64::MIN).is_err());
/// ```
pub fn checked_stock_change(current: i64, delta: i64) -> ValidationResult<i64> {
    if delta == i64::MIN {
        return Err(stock_out_of_range());
    }
    current.checked_add(delta).ok_or_else(stock_out_of_range)
}

fn stock_out_of_range() -> ValidationError {
    ValidationError::OutOfRange {
        field: "stock".to_string(),
        min: -i64::MAX,
        max: i64::MAX,
    }
}

/// Validates a price or cost.
///
/// ## Example
/// ```rust
/// use tamal_core::money::Money;
/// use tamal_core::validation::validate_amount;
///
/// assert!(validate_amount("price", Money::from_cents(2000)).is_ok());
/// assert!(validate_amount("price", Money::zero()).is_ok());
/// assert!(validate_amount("price", Money::from_cents(-1)).is_err());
/// ```
pub fn validate_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a physical measurement (grams, ml, lot fraction).
pub fn validate_measure(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite {
            field: field.to_string(),
        });
    }

    if value < 0.0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a share of a full lot (0.0 = nothing, 1.0 = the whole batch).
pub fn validate_fraction(field: &str, value: f64) -> ValidationResult<()> {
    validate_measure(field, value)?;

    if value > 1.0 {
        return Err(ValidationError::invalid(field, "must be a share between 0 and 1"));
    }

    Ok(())
}

/// Validates a package size used as a divisor.
pub fn validate_package_size(value: f64) -> ValidationResult<()> {
    validate_measure("package size", value)?;

    if value == 0.0 {
        return Err(ValidationError::MustBePositive {
            field: "package size".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates cart size (number of distinct products) before adding one more.
pub fn validate_cart_size(current_items: usize) -> ValidationResult<()> {
    if current_items >= MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "cart items".to_string(),
            min: 0,
            max: MAX_CART_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
