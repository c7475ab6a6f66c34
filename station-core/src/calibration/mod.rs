//! Calibration interpolation (标定表)
//!
//! Converts a dip height measured in a vessel into a volume through an
//! ordered (height, volume) lookup table. Exact table heights return their
//! stored volume; anything between two points is linearly interpolated;
//! anything outside the covered range is rejected, except height 0 on a
//! table that starts above 0 (empty-vessel bootstrap).

pub mod service;

pub use service::CalibrationService;

use shared::error::{DomainError, DomainResult};
use shared::models::{CalibrationPoint, CalibrationPointInput, CalibrationReport};

use crate::money::{to_decimal, to_volume_f64};

/// One vessel's in-memory calibration table, points ordered by height
#[derive(Debug, Clone)]
pub struct CalibrationTable {
    vessel_id: i64,
    points: Vec<CalibrationPointInput>,
}

impl CalibrationTable {
    /// Build from repository rows (already ordered by height)
    pub fn from_rows(vessel_id: i64, rows: &[CalibrationPoint]) -> Self {
        let points = rows
            .iter()
            .map(|p| CalibrationPointInput {
                height: p.height,
                volume: p.volume,
            })
            .collect();
        Self { vessel_id, points }
    }

    pub fn from_points(vessel_id: i64, mut points: Vec<CalibrationPointInput>) -> Self {
        points.sort_by(|a, b| a.height.total_cmp(&b.height));
        Self { vessel_id, points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Convert a dip height into a volume
    ///
    /// Height 0 below the table minimum maps to volume 0 (empty-vessel
    /// bootstrap); any other out-of-range height fails with the violated
    /// bound. An empty table fails fast.
    pub fn height_to_volume(&self, height: f64) -> DomainResult<f64> {
        let (first, last) = match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => {
                return Err(DomainError::MissingCalibrationData {
                    vessel_id: self.vessel_id,
                });
            }
        };

        if height < first.height {
            if height == 0.0 {
                return Ok(0.0);
            }
            return Err(DomainError::CalibrationRange {
                vessel_id: self.vessel_id,
                height,
                min: first.height,
                max: last.height,
            });
        }
        if height > last.height {
            return Err(DomainError::CalibrationRange {
                vessel_id: self.vessel_id,
                height,
                min: first.height,
                max: last.height,
            });
        }

        // Exact match short-circuits
        if let Some(point) = self.points.iter().find(|p| p.height == height) {
            return Ok(point.volume);
        }

        // Locate the bracketing pair; bounds were checked above so the
        // window scan always finds one.
        let bracket = self
            .points
            .windows(2)
            .find(|w| w[0].height < height && height < w[1].height);
        let Some([low, high]) = bracket else {
            return Err(DomainError::MissingCalibrationData {
                vessel_id: self.vessel_id,
            });
        };

        let ratio = (to_decimal(height) - to_decimal(low.height))
            / (to_decimal(high.height) - to_decimal(low.height));
        let volume = to_decimal(low.volume)
            + ratio * (to_decimal(high.volume) - to_decimal(low.volume));
        Ok(to_volume_f64(volume))
    }

    /// Signed volume difference between two dip heights
    pub fn volume_delta(&self, height_before: f64, height_after: f64) -> DomainResult<f64> {
        let before = self.height_to_volume(height_before)?;
        let after = self.height_to_volume(height_after)?;
        Ok(to_volume_f64(to_decimal(after) - to_decimal(before)))
    }

    /// Validate the table
    ///
    /// Errors: empty table, non-finite or negative values, non-ascending
    /// heights. Warnings: decreasing volumes (tolerated legacy data).
    pub fn validate(&self) -> CalibrationReport {
        let mut report = CalibrationReport::default();

        if self.points.is_empty() {
            report.errors.push("no calibration data".to_string());
            return report;
        }

        for (i, point) in self.points.iter().enumerate() {
            if !point.height.is_finite() || !point.volume.is_finite() {
                report
                    .errors
                    .push(format!("point {i}: non-finite height or volume"));
            }
            if point.height < 0.0 {
                report
                    .errors
                    .push(format!("point {i}: negative height {}", point.height));
            }
            if point.volume < 0.0 {
                report
                    .errors
                    .push(format!("point {i}: negative volume {}", point.volume));
            }
        }

        for (i, pair) in self.points.windows(2).enumerate() {
            if pair[1].height <= pair[0].height {
                report.errors.push(format!(
                    "heights not strictly ascending at point {}: {} after {}",
                    i + 1,
                    pair[1].height,
                    pair[0].height
                ));
            }
            if pair[1].volume < pair[0].volume {
                report.warnings.push(format!(
                    "volume decreases at point {}: {} after {}",
                    i + 1,
                    pair[1].volume,
                    pair[0].volume
                ));
            }
        }

        report
    }
}

/// Generate a cylindrical-vessel table: `volume = π·r²·h / 1000` (cm³ → L)
pub fn generate_cylinder(
    diameter_cm: f64,
    max_height_cm: f64,
    step_cm: f64,
) -> DomainResult<Vec<CalibrationPointInput>> {
    if !(diameter_cm > 0.0 && max_height_cm > 0.0 && step_cm > 0.0) {
        return Err(DomainError::validation(format!(
            "diameter, max height and step must be positive (got {diameter_cm}, {max_height_cm}, {step_cm})"
        )));
    }

    let radius = diameter_cm / 2.0;
    let area = std::f64::consts::PI * radius * radius;

    let mut points = Vec::new();
    let mut height = 0.0;
    while height < max_height_cm {
        points.push(CalibrationPointInput {
            height,
            volume: to_volume_f64(to_decimal(area * height / 1000.0)),
        });
        height += step_cm;
    }
    // Always close the table at the rim
    points.push(CalibrationPointInput {
        height: max_height_cm,
        volume: to_volume_f64(to_decimal(area * max_height_cm / 1000.0)),
    });
    Ok(points)
}
