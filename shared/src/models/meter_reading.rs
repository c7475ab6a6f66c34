//! Meter Reading Model (计量台账)

use serde::{Deserialize, Serialize};

/// One hose's cumulative meter record for one shift
///
/// Invariants:
/// - `quantity_sold = current_reading − previous_reading ≥ 0`
/// - `sale_value = quantity_sold × unit_price`
/// - for chronologically adjacent shifts of one hose, the later record's
///   `previous_reading` equals the earlier record's `current_reading`
///
/// Created when a shift is closed; mutated only through the correction
/// cascade; never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct MeterReading {
    pub id: i64,
    pub shift_id: i64,
    pub hose_id: i64,
    pub previous_reading: f64,
    pub current_reading: f64,
    pub quantity_sold: f64,
    /// Product unit price used for valuation (current price at record time)
    pub unit_price: f64,
    pub sale_value: f64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Per-hose counter input when closing a shift
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HoseReadingInput {
    pub hose_id: i64,
    /// The hose's cumulative counter at shift end
    pub current_reading: f64,
}
