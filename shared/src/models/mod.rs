//! Entity models
//!
//! Plain data structs shared between the engine and its embedders.
//! All derive `serde`; `sqlx::FromRow` is gated behind the `db` feature so
//! non-database consumers stay light.

pub mod cascade;
pub mod cash;
pub mod dispenser;
pub mod meter_reading;
pub mod payment;
pub mod product;
pub mod shift;
pub mod station;
pub mod vessel;

// Re-exports
pub use cascade::{CascadePhase, CascadeSummary, CorrectionOutcome};
pub use cash::{
    CashDirection, CashMovement, CashMovementCreate, CashRegister, ChainedCashBalance,
};
pub use dispenser::{Dispenser, DispenserCreate, Hose, HoseCreate};
pub use meter_reading::{HoseReadingInput, MeterReading};
pub use payment::{AllocationInput, CategoryTotals, MethodCategory, PaymentAllocation};
pub use product::{Product, ProductCreate};
pub use shift::{ShiftClose, ShiftClosure, ShiftOpen, ShiftStatus};
pub use station::{Station, StationCreate};
pub use vessel::{CalibrationPoint, CalibrationPointInput, CalibrationReport, Vessel, VesselCreate};
