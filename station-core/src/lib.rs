//! station-core — forecourt inventory and shift accounting engine
//!
//! Library-level engine consumed in-process by the surrounding CRUD/API
//! layer. It owns no wire format. Two tightly coupled halves:
//!
//! 1. **Calibration** — dip height → volume per vessel via an ordered
//!    lookup table with linear interpolation and boundary validation.
//! 2. **Shift-chain reconciliation** — per-hose cumulative meter readings
//!    scoped to chronologically ordered shifts; correcting a historical
//!    reading cascades forward through every later shift of that hose
//!    while keeping payment allocations, shift totals and the register
//!    balance coherent, all inside one transaction.

pub mod audit;
pub mod calibration;
pub mod config;
pub mod db;
pub mod logger;
pub mod metering;
pub mod money;
pub mod reconcile;
pub mod register;
pub mod shifts;
pub mod time;

// Re-exports
pub use calibration::CalibrationService;
pub use config::{Config, MethodCatalog};
pub use db::DbService;
pub use reconcile::CascadeReconciler;
pub use register::RegisterService;
pub use shifts::ShiftService;
