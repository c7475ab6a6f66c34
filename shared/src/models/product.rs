//! Product Model (fuel commodity)

use serde::{Deserialize, Serialize};

/// A stored and dispensed commodity
///
/// `unit_price` is the *current* price. The metering ledger and the
/// correction cascade always value quantities at this price, never at a
/// historical snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub name: String,
    /// Unit of measure ("L" by default)
    pub unit: String,
    /// Current unit price
    pub unit_price: f64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    pub unit: Option<String>,
    pub unit_price: f64,
}
