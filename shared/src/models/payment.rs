//! Payment Allocation Model (支付方式分摊)

use serde::{Deserialize, Serialize};

/// Payment-method category
///
/// Resolved once at configuration time from the method-code mapping table,
/// never re-matched per allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum MethodCategory {
    Cash,
    Card,
    Transfer,
    Other,
}

/// One payment method's share of a shift's takings
///
/// Invariant: Σ amounts over all methods of a shift equals the shift's
/// `total_sales` within ε = 0.01.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PaymentAllocation {
    pub id: i64,
    pub shift_id: i64,
    /// Method code ("CASH", "TARJETA", ...)
    pub method: String,
    /// Category resolved from the method catalog
    pub category: MethodCategory,
    pub amount: f64,
    /// `amount / shift total × 100`, 2 decimal places
    pub percentage: f64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Allocation input when closing a shift
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationInput {
    pub method: String,
    pub amount: f64,
}

/// Per-category totals of one shift's allocations
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotals {
    pub cash: f64,
    pub card: f64,
    pub transfer: f64,
    pub other: f64,
}
