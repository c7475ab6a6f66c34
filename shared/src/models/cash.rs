//! Cash Movement and Cash Register Models

use serde::{Deserialize, Serialize};

/// Direction of a cash movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum CashDirection {
    In,
    Out,
}

/// A single cash-drawer movement of one shift
///
/// Immutable once created, except through the explicit correction path
/// (the per-shift sales movement is adjusted when a cascade changes the
/// shift's cash takings).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CashMovement {
    pub id: i64,
    pub shift_id: i64,
    pub direction: CashDirection,
    pub amount: f64,
    /// Movement concept ("SHIFT_SALES" for the maintained sales movement)
    pub concept: String,
    pub created_at: i64,
}

/// Manual cash movement payload (deposits / withdrawals)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashMovementCreate {
    pub shift_id: i64,
    pub direction: CashDirection,
    pub amount: f64,
    pub concept: String,
}

/// Per-station cash register
///
/// `current_balance` is a cache of the chain-derived closing balance of the
/// station's latest shift. It is recomputed from the full shift chain after
/// every mutation, never incrementally drifted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CashRegister {
    pub id: i64,
    pub station_id: i64,
    pub opening_balance: f64,
    pub current_balance: f64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Chain-derived opening/closing balance of one shift
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChainedCashBalance {
    pub opening_balance: f64,
    pub closing_balance: f64,
}
