//! Vessel Model (储罐 — storage tank / tanker compartment)

use serde::{Deserialize, Serialize};

/// A storage vessel whose fill level is measured by dip height
///
/// `current_height` / `current_volume` are mutated on every dip reading or
/// computed fill. A vessel is never deleted while movements reference it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Vessel {
    pub id: i64,
    pub station_id: i64,
    /// The commodity stored in this vessel
    pub product_id: i64,
    pub name: String,
    /// Total capacity in `unit`
    pub capacity: f64,
    /// Minimum safe level
    pub min_level: f64,
    /// Last recorded dip height
    pub current_height: f64,
    /// Volume derived from the last dip via the calibration table
    pub current_volume: f64,
    pub unit: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create vessel payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VesselCreate {
    pub station_id: i64,
    pub product_id: i64,
    pub name: String,
    pub capacity: f64,
    pub min_level: Option<f64>,
    pub unit: Option<String>,
}

/// One (height, volume) pair of a vessel's calibration table
///
/// Heights are strictly ascending per vessel. The table is replaceable
/// wholesale (delete-all-then-insert) but never partially mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CalibrationPoint {
    pub id: i64,
    pub vessel_id: i64,
    pub height: f64,
    pub volume: f64,
}

/// Calibration point input (table replacement / geometry generation)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPointInput {
    pub height: f64,
    pub volume: f64,
}

/// Result of validating a vessel's calibration table
///
/// Non-ascending heights and non-finite values are errors; decreasing
/// volumes are warnings only, since legacy tables may be imperfect.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalibrationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl CalibrationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}
