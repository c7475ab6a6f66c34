//! Dispenser and Hose Models

use serde::{Deserialize, Serialize};

/// A fuel dispenser at one station
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Dispenser {
    pub id: i64,
    pub station_id: i64,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create dispenser payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispenserCreate {
    pub station_id: i64,
    pub name: String,
}

/// A single dispensing outlet with its own cumulative meter
///
/// `last_reading` is a derived convenience cache of the hose's latest
/// cumulative meter value. It is refreshed best-effort after commits and is
/// never a source of truth — the meter ledger is.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Hose {
    pub id: i64,
    pub dispenser_id: i64,
    /// The single product this hose dispenses
    pub product_id: i64,
    pub label: String,
    /// Cached last cumulative meter reading
    pub last_reading: f64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create hose payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoseCreate {
    pub dispenser_id: i64,
    pub product_id: i64,
    pub label: String,
    /// Initial meter value (factory counter), defaults to 0
    pub last_reading: Option<f64>,
}
