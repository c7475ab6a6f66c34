//! Shift Closure Model (班次管理)

use serde::{Deserialize, Serialize};

use super::meter_reading::HoseReadingInput;
use super::payment::AllocationInput;

/// Shift lifecycle state
///
/// `Open` and `Closed` shifts are editable; `Finalized` locks the shift
/// against any further correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum ShiftStatus {
    Open,
    Closed,
    Finalized,
}

impl Default for ShiftStatus {
    fn default() -> Self {
        Self::Open
    }
}

/// One operating shift at one station
///
/// Shifts chain chronologically per station by `(business_date,
/// start_time)`; the pair is unique per station so chain ties cannot exist.
/// Totals aggregate the shift's meter readings; the category buckets break
/// `total_sales` down by payment-method category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ShiftClosure {
    pub id: i64,
    pub station_id: i64,
    /// Business date (YYYY-MM-DD)
    pub business_date: String,
    /// Shift start time (HH:MM:SS)
    pub start_time: String,
    pub status: ShiftStatus,
    /// Operator employee ID
    pub operator_id: Option<i64>,
    /// Operator display name
    pub operator_name: Option<String>,
    /// Total quantity sold across all hoses
    pub total_volume: f64,
    /// Total sale value across all hoses
    pub total_sales: f64,
    pub cash_total: f64,
    pub card_total: f64,
    pub transfer_total: f64,
    pub other_total: f64,
    pub note: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Open shift payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftOpen {
    pub station_id: i64,
    /// Business date (YYYY-MM-DD)
    pub business_date: String,
    /// Start time (HH:MM:SS)
    pub start_time: String,
    pub operator_id: Option<i64>,
    pub operator_name: Option<String>,
    pub note: Option<String>,
}

/// Close shift payload
///
/// One reading per hose that sold during the shift, plus the full
/// payment-method breakdown of the shift's takings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftClose {
    pub readings: Vec<HoseReadingInput>,
    pub allocations: Vec<AllocationInput>,
    pub note: Option<String>,
}
