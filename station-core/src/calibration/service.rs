//! Calibration service — persistence-aware operations on vessel tables

use shared::error::{DomainError, DomainResult};
use shared::models::{CalibrationPointInput, CalibrationReport, Vessel};

use super::CalibrationTable;
use crate::audit::{self, AuditAction, AuditEvent};
use crate::db::DbService;
use crate::db::repository::{calibration, vessel};

/// Dip-reading ingestion and calibration-table maintenance for vessels
#[derive(Clone)]
pub struct CalibrationService {
    db: DbService,
}

impl CalibrationService {
    pub fn new(db: DbService) -> Self {
        Self { db }
    }

    /// Convert a dip height into a volume for one vessel
    pub async fn interpolate_height(&self, vessel_id: i64, height: f64) -> DomainResult<f64> {
        crate::money::require_finite(height, "height")?;
        let mut conn = self
            .db
            .pool
            .acquire()
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        load_vessel(&mut conn, vessel_id).await?;
        let table = load_table(&mut conn, vessel_id).await?;
        table.height_to_volume(height)
    }

    /// Record a vessel fill measured as a dip-height change
    ///
    /// Validates both heights against the table, persists the vessel's new
    /// level, and returns the signed volume delta. One transaction, audit
    /// entry included.
    pub async fn record_vessel_fill(
        &self,
        vessel_id: i64,
        previous_height: f64,
        new_height: f64,
    ) -> DomainResult<f64> {
        crate::money::require_finite(previous_height, "previous_height")?;
        crate::money::require_finite(new_height, "new_height")?;

        let mut tx = self
            .db
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        let stored = load_vessel(&mut tx, vessel_id).await?;
        let table = load_table(&mut tx, vessel_id).await?;

        let delta = table.volume_delta(previous_height, new_height)?;
        let new_volume = table.height_to_volume(new_height)?;
        vessel::update_level(&mut tx, vessel_id, new_height, new_volume).await?;

        audit::append(
            &mut tx,
            AuditEvent {
                action: AuditAction::VesselFillRecorded,
                resource_type: "vessel".into(),
                resource_id: vessel_id.to_string(),
                operator_id: None,
                operator_name: None,
                description: format!(
                    "Vessel fill: height {previous_height} → {new_height} ({delta:+} {})",
                    stored.unit
                ),
                details: serde_json::json!({
                    "previous_height": previous_height,
                    "new_height": new_height,
                    "previous_volume": stored.current_volume,
                    "new_volume": new_volume,
                    "volume_delta": delta,
                }),
            },
        )
        .await?;

        tx.commit()
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        tracing::info!(
            vessel_id,
            previous_height,
            new_height,
            delta,
            "Vessel fill recorded"
        );
        Ok(delta)
    }

    /// Validate a vessel's stored calibration table
    pub async fn validate_vessel(&self, vessel_id: i64) -> DomainResult<CalibrationReport> {
        let mut conn = self
            .db
            .pool
            .acquire()
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        load_vessel(&mut conn, vessel_id).await?;
        let table = load_table(&mut conn, vessel_id).await?;
        Ok(table.validate())
    }

    /// Replace a vessel's calibration table wholesale
    ///
    /// The candidate table is validated first; errors reject the whole
    /// replacement and the previous table stays intact. Warnings are
    /// tolerated and returned.
    pub async fn replace_table(
        &self,
        vessel_id: i64,
        points: Vec<CalibrationPointInput>,
    ) -> DomainResult<CalibrationReport> {
        let candidate = CalibrationTable::from_points(vessel_id, points);
        let report = candidate.validate();
        if !report.is_valid() {
            return Err(DomainError::validation(format!(
                "calibration table rejected: {}",
                report.errors.join("; ")
            )));
        }
        for warning in &report.warnings {
            tracing::warn!(vessel_id, warning, "Calibration table warning");
        }

        let mut tx = self
            .db
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        load_vessel(&mut tx, vessel_id).await?;
        let count = calibration::replace_all(&mut tx, vessel_id, &candidate.points).await?;

        audit::append(
            &mut tx,
            AuditEvent {
                action: AuditAction::CalibrationReplaced,
                resource_type: "vessel".into(),
                resource_id: vessel_id.to_string(),
                operator_id: None,
                operator_name: None,
                description: format!("Calibration table replaced ({count} points)"),
                details: serde_json::json!({
                    "points": count,
                    "warnings": report.warnings,
                }),
            },
        )
        .await?;

        tx.commit()
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        tracing::info!(vessel_id, points = count, "Calibration table replaced");
        Ok(report)
    }
}

async fn load_vessel(conn: &mut sqlx::SqliteConnection, vessel_id: i64) -> DomainResult<Vessel> {
    vessel::find_by_id(conn, vessel_id)
        .await?
        .ok_or_else(|| DomainError::not_found(format!("vessel {vessel_id}")))
}

async fn load_table(
    conn: &mut sqlx::SqliteConnection,
    vessel_id: i64,
) -> DomainResult<CalibrationTable> {
    let rows = calibration::find_by_vessel(conn, vessel_id).await?;
    Ok(CalibrationTable::from_rows(vessel_id, &rows))
}
