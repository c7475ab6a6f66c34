//! Domain error type for the station accounting engine
//!
//! Every failing engine operation resolves to one of these variants.
//! All of them abort the enclosing transaction; nothing is partially
//! applied. Non-critical cache refresh failures are logged by the engine
//! and never surface here.

use thiserror::Error;

/// Engine-level error enum
///
/// Structured variants carry the offending identifiers so callers can
/// report exactly which vessel/hose/shift violated which bound.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Dip height outside the calibration table's covered range
    #[error(
        "vessel {vessel_id}: height {height} outside calibration range [{min}, {max}]"
    )]
    CalibrationRange {
        vessel_id: i64,
        height: f64,
        min: f64,
        max: f64,
    },

    /// Vessel has no calibration points at all
    #[error("vessel {vessel_id}: no calibration data")]
    MissingCalibrationData { vessel_id: i64 },

    /// New cumulative meter reading below the previous one
    #[error("hose {hose_id}: reading {current} is below previous reading {previous}")]
    NonMonotonicReading {
        hose_id: i64,
        previous: f64,
        current: f64,
    },

    /// Edit attempted on a finalized shift
    #[error("shift {shift_id} is finalized and can no longer be corrected")]
    ShiftLocked { shift_id: i64 },

    /// Forward chain walk hit the safety bound — investigable, never silent
    #[error("chain walk starting at shift {shift_id} exceeded {max_hops} hops")]
    ChainBoundExceeded { shift_id: i64, max_hops: u32 },

    /// Referenced entity absent
    #[error("not found: {0}")]
    NotFound(String),

    /// Business rule conflict (duplicate shift window, double close, ...)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Input rejected before touching storage
    #[error("validation error: {0}")]
    Validation(String),

    /// Underlying storage failure
    #[error("database error: {0}")]
    Database(String),
}

impl DomainError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }
}

/// Result alias for engine operations
pub type DomainResult<T> = Result<T, DomainError>;
