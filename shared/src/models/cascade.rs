//! Correction cascade result types

use serde::{Deserialize, Serialize};

use super::meter_reading::MeterReading;

/// Phase of the correction state machine
///
/// `Validating → Applying → Propagating → Reconciling → Committed`.
/// A successful outcome always reports `Committed`; failures surface as a
/// `DomainError` and the transaction is rolled back (`Aborted`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadePhase {
    Validating,
    Applying,
    Propagating,
    Reconciling,
    Committed,
    Aborted,
}

/// Summary of one correction's forward cascade
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CascadeSummary {
    pub phase: CascadePhase,
    /// Quantity delta of the edited reading (new − old)
    pub delta_quantity: f64,
    /// Sale-value delta of the edited shift (new − old)
    pub delta_value: f64,
    /// Shifts visited by the forward walk (with or without a reading)
    pub shifts_visited: u32,
    /// Downstream readings rewritten to restore chain continuity
    pub readings_updated: u32,
}

/// Full result of `correct_meter_reading`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionOutcome {
    /// The edited reading after the correction
    pub reading: MeterReading,
    pub cascade: CascadeSummary,
}
