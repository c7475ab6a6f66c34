//! Money and volume arithmetic using rust_decimal for precision
//!
//! All stored quantities are `f64`; every calculation goes through
//! `Decimal` internally and is converted back for storage/serialization.

use rust_decimal::prelude::*;

use shared::error::{DomainError, DomainResult};

/// Rounding for monetary values (2 decimal places, half away from zero)
const MONEY_PLACES: u32 = 2;

/// Rounding for volumes and meter readings (3 decimal places)
const VOLUME_PLACES: u32 = 3;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Convert f64 to Decimal; non-finite values degrade to zero with an error log
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_else(|| {
        tracing::error!(value = ?value, "Non-finite f64 in decimal calculation, defaulting to zero");
        Decimal::ZERO
    })
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_money_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(MONEY_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or(0.0)
}

/// Convert Decimal back to f64 for storage, rounded to 3 decimal places
#[inline]
pub fn to_volume_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(VOLUME_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or(0.0)
}

/// Compare two monetary values for equality (within 0.01 tolerance)
pub fn money_eq(a: f64, b: f64) -> bool {
    let diff = (to_decimal(a) - to_decimal(b)).abs();
    diff < MONEY_TOLERANCE
}

/// Reject NaN / Infinity at the engine boundary
#[inline]
pub fn require_finite(value: f64, field_name: &str) -> DomainResult<()> {
    if !value.is_finite() {
        return Err(DomainError::validation(format!(
            "{field_name} must be a finite number, got {value}"
        )));
    }
    Ok(())
}

/// `quantity × unit_price`, rounded to money precision
pub fn sale_value(quantity: f64, unit_price: f64) -> f64 {
    to_money_f64(to_decimal(quantity) * to_decimal(unit_price))
}

/// `amount / total × 100`, rounded to 2 dp; zero total yields 0
pub fn percentage_of(amount: f64, total: f64) -> f64 {
    let total = to_decimal(total);
    if total.is_zero() {
        return 0.0;
    }
    to_money_f64(to_decimal(amount) / total * Decimal::from(100))
}
