//! Correction cascade (修正级联)
//!
//! A historical meter reading can be wrong — misread counter, typo at shift
//! close. Fixing it is never a point edit: every later shift of the same
//! hose chains off the corrected counter, the edited shift's totals and
//! payment breakdown must re-balance, and the cash register follows. The
//! reconciler runs the whole repair as one state machine inside one
//! transaction:
//!
//! `Validating → Applying → Propagating → Reconciling → Committed`
//!
//! Any failure rolls the transaction back (`Aborted`) and leaves the chain
//! untouched. Downstream shifts keep their own `quantity_sold` fixed; only
//! the reading boundaries shift to restore continuity.

pub mod allocation;

use std::sync::Arc;

use rust_decimal::Decimal;
use sqlx::SqliteConnection;

use shared::error::{DomainError, DomainResult};
use shared::models::{
    CascadePhase, CascadeSummary, CorrectionOutcome, ShiftClosure, ShiftStatus,
};

use crate::audit::{self, AuditAction, AuditEvent};
use crate::config::Config;
use crate::db::DbService;
use crate::db::repository::{hose, meter_reading, product, shift};
use crate::money::{sale_value, to_decimal, to_money_f64, to_volume_f64};
use crate::register;
use crate::shifts::chain::ChainCursor;

/// Applies meter-reading corrections and cascades them forward
#[derive(Clone)]
pub struct CascadeReconciler {
    db: DbService,
    config: Arc<Config>,
}

impl CascadeReconciler {
    pub fn new(db: DbService, config: Arc<Config>) -> Self {
        Self { db, config }
    }

    /// Correct a historical reading's `quantity_sold` and repair everything
    /// downstream of it
    ///
    /// The edited shift must not be finalized. Downstream shifts may be
    /// finalized or not — their quantities are held fixed either way, only
    /// their reading boundaries move. Rewritten readings are revalued at
    /// the product's current price.
    pub async fn correct_meter_reading(
        &self,
        reading_id: i64,
        new_quantity_sold: f64,
        operator_id: Option<i64>,
        operator_name: Option<String>,
    ) -> DomainResult<CorrectionOutcome> {
        let mut tx = self
            .db
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        // Validating
        crate::money::require_finite(new_quantity_sold, "quantity_sold")?;
        if new_quantity_sold <= 0.0 {
            return Err(DomainError::validation(format!(
                "corrected quantity must be positive: {new_quantity_sold}"
            )));
        }
        let old = meter_reading::find_by_id(&mut tx, reading_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("meter reading {reading_id}")))?;
        let edited_shift = shift::find_by_id(&mut tx, old.shift_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("shift {}", old.shift_id)))?;
        if edited_shift.status == ShiftStatus::Finalized {
            return Err(DomainError::ShiftLocked {
                shift_id: edited_shift.id,
            });
        }
        let hose = hose::find_by_id(&mut tx, old.hose_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("hose {}", old.hose_id)))?;

        // Applying — rewrite the edited reading at the current price
        let new_quantity = to_volume_f64(to_decimal(new_quantity_sold));
        let unit_price = product::current_price(&mut tx, hose.product_id).await?;
        let new_current = to_volume_f64(to_decimal(old.previous_reading) + to_decimal(new_quantity));
        let new_value = sale_value(new_quantity, unit_price);

        let delta_quantity = to_volume_f64(to_decimal(new_quantity) - to_decimal(old.quantity_sold));
        let delta_value = to_money_f64(to_decimal(new_value) - to_decimal(old.sale_value));

        if delta_quantity == 0.0 && delta_value == 0.0 {
            // Nothing to repair, not even a revaluation
            tracing::info!(reading_id, "Correction is a no-op, nothing changed");
            return Ok(CorrectionOutcome {
                reading: old,
                cascade: CascadeSummary {
                    phase: CascadePhase::Committed,
                    delta_quantity: 0.0,
                    delta_value: 0.0,
                    shifts_visited: 0,
                    readings_updated: 0,
                },
            });
        }

        meter_reading::update_correction(
            &mut tx,
            old.id,
            old.previous_reading,
            new_current,
            new_quantity,
            unit_price,
            new_value,
        )
        .await?;

        // Propagating — walk forward, carrying the corrected counter
        let (shifts_visited, readings_updated, chain_tail) = self
            .propagate(&mut tx, &edited_shift, old.hose_id, hose.product_id, new_current)
            .await?;

        // Reconciling — the edited shift's totals, breakdown and register
        self.reconcile_edited_shift(&mut tx, &edited_shift, delta_value)
            .await?;

        audit::append(
            &mut tx,
            AuditEvent {
                action: AuditAction::MeterReadingCorrected,
                resource_type: "meter_reading".into(),
                resource_id: old.id.to_string(),
                operator_id,
                operator_name,
                description: format!(
                    "Reading {} corrected: quantity {} -> {new_quantity}, cascaded over {} downstream readings",
                    old.id, old.quantity_sold, readings_updated
                ),
                details: serde_json::json!({
                    "before": &old,
                    "after": {
                        "previous_reading": old.previous_reading,
                        "current_reading": new_current,
                        "quantity_sold": new_quantity,
                        "unit_price": unit_price,
                        "sale_value": new_value,
                    },
                    "delta_quantity": delta_quantity,
                    "delta_value": delta_value,
                    "shifts_visited": shifts_visited,
                    "readings_updated": readings_updated,
                }),
            },
        )
        .await?;

        tx.commit()
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        tracing::info!(
            reading_id,
            delta_quantity,
            delta_value,
            shifts_visited,
            readings_updated,
            "Correction committed"
        );

        // Best-effort cache refresh outside the transaction
        self.refresh_hose_cache(old.hose_id, chain_tail).await;

        let mut conn = self
            .db
            .pool
            .acquire()
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        let reading = meter_reading::find_by_id(&mut conn, reading_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("meter reading {reading_id}")))?;

        Ok(CorrectionOutcome {
            reading,
            cascade: CascadeSummary {
                phase: CascadePhase::Committed,
                delta_quantity,
                delta_value,
                shifts_visited,
                readings_updated,
            },
        })
    }

    /// Forward walk over later shifts of the same hose
    ///
    /// Each downstream reading keeps its own `quantity_sold`; its window is
    /// re-anchored on the carried counter and revalued at the current
    /// price. Returns `(shifts_visited, readings_updated, final_counter)`.
    async fn propagate(
        &self,
        conn: &mut SqliteConnection,
        edited_shift: &ShiftClosure,
        hose_id: i64,
        product_id: i64,
        mut carried: f64,
    ) -> DomainResult<(u32, u32, f64)> {
        let mut cursor = ChainCursor::after(edited_shift.clone(), self.config.max_chain_hops);
        let mut readings_updated = 0u32;

        while let Some(next_shift) = cursor.next(&mut *conn).await? {
            let Some(downstream) =
                meter_reading::find_by_shift_and_hose(&mut *conn, next_shift.id, hose_id).await?
            else {
                // Hose idle that shift, the counter carries through unchanged
                continue;
            };

            let quantity = downstream.quantity_sold;
            let new_previous = carried;
            let new_current = to_volume_f64(to_decimal(new_previous) + to_decimal(quantity));
            if new_current < new_previous {
                return Err(DomainError::NonMonotonicReading {
                    hose_id,
                    previous: new_previous,
                    current: new_current,
                });
            }
            let unit_price = product::current_price(&mut *conn, product_id).await?;
            let value = sale_value(quantity, unit_price);
            meter_reading::update_correction(
                &mut *conn,
                downstream.id,
                new_previous,
                new_current,
                quantity,
                unit_price,
                value,
            )
            .await?;
            readings_updated += 1;
            carried = new_current;
        }

        Ok((cursor.hops(), readings_updated, carried))
    }

    /// Re-balance the edited shift after its reading changed
    ///
    /// Downstream shifts deliberately keep their totals: their quantities
    /// did not change, and revaluation deltas from price drift are absorbed
    /// only where the correction originated.
    async fn reconcile_edited_shift(
        &self,
        conn: &mut SqliteConnection,
        edited_shift: &ShiftClosure,
        delta_value: f64,
    ) -> DomainResult<()> {
        let readings = meter_reading::find_by_shift(&mut *conn, edited_shift.id).await?;
        let mut total_quantity = Decimal::ZERO;
        let mut total_value = Decimal::ZERO;
        for reading in &readings {
            total_quantity += to_decimal(reading.quantity_sold);
            total_value += to_decimal(reading.sale_value);
        }
        let total_volume = to_volume_f64(total_quantity);
        let total_sales = to_money_f64(total_value);

        let adjustment =
            allocation::apply_delta(&mut *conn, edited_shift.id, delta_value, total_sales).await?;
        shift::update_totals(
            &mut *conn,
            edited_shift.id,
            total_volume,
            total_sales,
            adjustment.buckets,
        )
        .await?;

        if adjustment.applied_delta != 0.0 {
            register::apply_cash_delta(
                &mut *conn,
                edited_shift.station_id,
                edited_shift.id,
                adjustment.applied_delta,
                self.config.max_chain_hops,
            )
            .await?;
        }

        tracing::debug!(
            shift_id = edited_shift.id,
            total_volume,
            total_sales,
            applied_delta = adjustment.applied_delta,
            method = adjustment.method.as_deref().unwrap_or("-"),
            "Edited shift reconciled"
        );
        Ok(())
    }

    /// Post-commit refresh of the hose's `last_reading` cache
    async fn refresh_hose_cache(&self, hose_id: i64, counter: f64) {
        let mut conn = match self.db.pool.acquire().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!(hose_id, error = %e, "Hose cache refresh skipped: no connection");
                return;
            }
        };
        if let Err(e) = hose::update_last_reading(&mut conn, hose_id, counter).await {
            tracing::warn!(hose_id, error = %e, "Hose cache refresh failed");
        }
    }
}
