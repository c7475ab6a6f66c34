//! Shift lifecycle (班次生命周期)
//!
//! Open → Closed → Finalized. Closing a shift records every hose's meter
//! reading through the ledger, checks the payment breakdown against the
//! metered total, creates the shift's cash-sales movement and refreshes
//! the register cache — one transaction. Finalizing locks the shift
//! against corrections.

pub mod chain;

use std::sync::Arc;

use rust_decimal::Decimal;

use shared::error::{DomainError, DomainResult};
use shared::models::{
    CashDirection, CashMovement, CashMovementCreate, MeterReading, PaymentAllocation, ShiftClose,
    ShiftClosure, ShiftOpen, ShiftStatus,
};

use crate::audit::{self, AuditAction, AuditEvent};
use crate::config::Config;
use crate::db::DbService;
use crate::db::repository::{
    allocation, cash_movement, hose, meter_reading, register, shift, station,
};
use crate::metering;
use crate::money::{money_eq, percentage_of, to_decimal, to_money_f64, to_volume_f64};
use crate::reconcile::allocation::bucket_totals;
use crate::register as register_chain;
use crate::time;

/// Shift lifecycle operations for one database
#[derive(Clone)]
pub struct ShiftService {
    db: DbService,
    config: Arc<Config>,
}

impl ShiftService {
    pub fn new(db: DbService, config: Arc<Config>) -> Self {
        Self { db, config }
    }

    /// Open a new shift for a station
    ///
    /// The shift window must parse, must not lie in the future (business
    /// timezone), must follow the station's latest shift, and the station
    /// may have at most one open shift.
    pub async fn open_shift(&self, data: ShiftOpen) -> DomainResult<ShiftClosure> {
        let date = time::parse_date(&data.business_date)?;
        time::parse_time(&data.start_time)?;
        time::validate_not_future(date, self.config.timezone)?;

        let mut tx = self
            .db
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        station::find_by_id(&mut tx, data.station_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("station {}", data.station_id)))?;

        if shift::find_open_by_station(&mut tx, data.station_id)
            .await?
            .is_some()
        {
            return Err(DomainError::conflict(format!(
                "station {} already has an open shift",
                data.station_id
            )));
        }

        // The chain only grows at its end. A backfilled shift would make
        // the meter ledger resolve previous readings out of chain order.
        if let Some(latest) = shift::find_latest(&mut tx, data.station_id).await?
            && (data.business_date.as_str(), data.start_time.as_str())
                <= (latest.business_date.as_str(), latest.start_time.as_str())
        {
            return Err(DomainError::conflict(format!(
                "shift window {} {} does not follow the station's latest shift ({} {})",
                data.business_date, data.start_time, latest.business_date, latest.start_time
            )));
        }

        // Register must exist before the first balance derivation
        register::ensure(&mut tx, data.station_id).await?;

        let created = shift::create(&mut tx, data).await.map_err(|e| match e {
            crate::db::repository::RepoError::Duplicate(_) => DomainError::conflict(
                "a shift with the same start date and time already exists".to_string(),
            ),
            other => other.into(),
        })?;

        audit::append(
            &mut tx,
            AuditEvent {
                action: AuditAction::ShiftOpened,
                resource_type: "shift".into(),
                resource_id: created.id.to_string(),
                operator_id: created.operator_id,
                operator_name: created.operator_name.clone(),
                description: format!(
                    "Shift opened at station {} ({} {})",
                    created.station_id, created.business_date, created.start_time
                ),
                details: serde_json::json!({
                    "station_id": created.station_id,
                    "business_date": created.business_date,
                    "start_time": created.start_time,
                }),
            },
        )
        .await?;

        tx.commit()
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        tracing::info!(
            shift_id = created.id,
            station_id = created.station_id,
            date = %created.business_date,
            time = %created.start_time,
            "Shift opened"
        );
        Ok(created)
    }

    /// Close a shift: record meter readings, balance the payment
    /// breakdown, create the cash-sales movement, refresh the register
    pub async fn close_shift(&self, shift_id: i64, data: ShiftClose) -> DomainResult<ShiftClosure> {
        let mut tx = self
            .db
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        let current = shift::find_by_id(&mut tx, shift_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("shift {shift_id}")))?;
        match current.status {
            ShiftStatus::Open => {}
            ShiftStatus::Closed => {
                return Err(DomainError::conflict(format!(
                    "shift {shift_id} is already closed"
                )));
            }
            ShiftStatus::Finalized => return Err(DomainError::ShiftLocked { shift_id }),
        }

        // Record every hose's counter through the ledger
        let mut total_quantity = Decimal::ZERO;
        let mut total_value = Decimal::ZERO;
        let mut recorded = Vec::with_capacity(data.readings.len());
        for input in &data.readings {
            let hose_station = hose::station_id(&mut tx, input.hose_id).await?;
            if hose_station != current.station_id {
                return Err(DomainError::validation(format!(
                    "hose {} belongs to station {}, not station {}",
                    input.hose_id, hose_station, current.station_id
                )));
            }
            let reading =
                metering::record_reading(&mut tx, input.hose_id, shift_id, input.current_reading)
                    .await?;
            total_quantity += to_decimal(reading.quantity_sold);
            total_value += to_decimal(reading.sale_value);
            recorded.push(reading);
        }
        let total_volume = to_volume_f64(total_quantity);
        let total_sales = to_money_f64(total_value);

        // The breakdown must cover the metered total within tolerance
        let mut allocated = Decimal::ZERO;
        for input in &data.allocations {
            crate::money::require_finite(input.amount, "allocation amount")?;
            if input.amount < 0.0 {
                return Err(DomainError::validation(format!(
                    "allocation amount cannot be negative: {} {}",
                    input.method, input.amount
                )));
            }
            allocated += to_decimal(input.amount);
        }
        if !money_eq(to_money_f64(allocated), total_sales) {
            return Err(DomainError::validation(format!(
                "payment allocations sum to {} but metered sales total is {total_sales}",
                to_money_f64(allocated)
            )));
        }

        let mut allocations = Vec::with_capacity(data.allocations.len());
        for input in &data.allocations {
            let category = self.config.methods.classify(&input.method);
            let inserted = allocation::insert(
                &mut tx,
                shift_id,
                input.method.trim().to_uppercase().as_str(),
                category,
                to_money_f64(to_decimal(input.amount)),
                percentage_of(input.amount, total_sales),
            )
            .await
            .map_err(|e| match e {
                crate::db::repository::RepoError::Duplicate(_) => DomainError::conflict(format!(
                    "duplicate payment method in breakdown: {}",
                    input.method
                )),
                other => other.into(),
            })?;
            allocations.push(inserted);
        }
        let buckets = bucket_totals(&allocations);

        shift::update_totals(&mut tx, shift_id, total_volume, total_sales, buckets).await?;
        shift::update_status(&mut tx, shift_id, ShiftStatus::Closed).await?;
        if let Some(note) = &data.note {
            shift::update_note(&mut tx, shift_id, note).await?;
        }

        // The cash share of the takings enters the drawer
        if buckets.cash > 0.0 {
            cash_movement::insert(
                &mut tx,
                shift_id,
                CashDirection::In,
                buckets.cash,
                cash_movement::SHIFT_SALES,
            )
            .await?;
        }
        register_chain::recompute_register(
            &mut tx,
            current.station_id,
            self.config.max_chain_hops,
        )
        .await?;

        audit::append(
            &mut tx,
            AuditEvent {
                action: AuditAction::ShiftClosed,
                resource_type: "shift".into(),
                resource_id: shift_id.to_string(),
                operator_id: current.operator_id,
                operator_name: current.operator_name.clone(),
                description: format!(
                    "Shift closed: {total_volume} sold for {total_sales} across {} hoses",
                    recorded.len()
                ),
                details: serde_json::json!({
                    "total_volume": total_volume,
                    "total_sales": total_sales,
                    "cash_total": buckets.cash,
                    "card_total": buckets.card,
                    "transfer_total": buckets.transfer,
                    "other_total": buckets.other,
                }),
            },
        )
        .await?;

        tx.commit()
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        tracing::info!(shift_id, total_volume, total_sales, "Shift closed");

        // Best-effort cache refresh — derived data, never aborts the close
        self.refresh_hose_caches(&recorded).await;

        let mut conn = self
            .db
            .pool
            .acquire()
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        shift::find_by_id(&mut conn, shift_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("shift {shift_id}")))
    }

    /// Lock a closed shift against any further correction
    pub async fn finalize_shift(&self, shift_id: i64) -> DomainResult<ShiftClosure> {
        let mut tx = self
            .db
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        let current = shift::find_by_id(&mut tx, shift_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("shift {shift_id}")))?;
        match current.status {
            ShiftStatus::Closed => {}
            ShiftStatus::Open => {
                return Err(DomainError::conflict(format!(
                    "shift {shift_id} must be closed before it can be finalized"
                )));
            }
            ShiftStatus::Finalized => {
                return Err(DomainError::conflict(format!(
                    "shift {shift_id} is already finalized"
                )));
            }
        }

        shift::update_status(&mut tx, shift_id, ShiftStatus::Finalized).await?;

        audit::append(
            &mut tx,
            AuditEvent {
                action: AuditAction::ShiftFinalized,
                resource_type: "shift".into(),
                resource_id: shift_id.to_string(),
                operator_id: current.operator_id,
                operator_name: current.operator_name.clone(),
                description: format!("Shift {shift_id} finalized"),
                details: serde_json::json!({}),
            },
        )
        .await?;

        tx.commit()
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        tracing::info!(shift_id, "Shift finalized");
        Ok(ShiftClosure {
            status: ShiftStatus::Finalized,
            ..current
        })
    }

    /// Record a manual cash deposit or withdrawal for a shift
    pub async fn record_cash_movement(
        &self,
        data: CashMovementCreate,
    ) -> DomainResult<CashMovement> {
        crate::money::require_finite(data.amount, "amount")?;
        if data.amount <= 0.0 {
            return Err(DomainError::validation(format!(
                "cash movement amount must be positive: {}",
                data.amount
            )));
        }

        let mut tx = self
            .db
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        let current = shift::find_by_id(&mut tx, data.shift_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("shift {}", data.shift_id)))?;
        if current.status == ShiftStatus::Finalized {
            return Err(DomainError::ShiftLocked {
                shift_id: data.shift_id,
            });
        }

        let movement = cash_movement::insert(
            &mut tx,
            data.shift_id,
            data.direction,
            to_money_f64(to_decimal(data.amount)),
            &data.concept,
        )
        .await?;
        register_chain::recompute_register(
            &mut tx,
            current.station_id,
            self.config.max_chain_hops,
        )
        .await?;

        audit::append(
            &mut tx,
            AuditEvent {
                action: AuditAction::CashMovementRecorded,
                resource_type: "cash_movement".into(),
                resource_id: movement.id.to_string(),
                operator_id: current.operator_id,
                operator_name: current.operator_name.clone(),
                description: format!(
                    "Manual cash {:?} of {} ({})",
                    movement.direction, movement.amount, movement.concept
                ),
                details: serde_json::json!({
                    "shift_id": data.shift_id,
                    "direction": movement.direction,
                    "amount": movement.amount,
                    "concept": movement.concept,
                }),
            },
        )
        .await?;

        tx.commit()
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        Ok(movement)
    }

    /// All shifts of a station in chain order
    pub async fn shift_chain(&self, station_id: i64) -> DomainResult<Vec<ShiftClosure>> {
        let mut conn = self
            .db
            .pool
            .acquire()
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        Ok(shift::find_all_chain_order(&mut conn, station_id).await?)
    }

    /// Meter readings of one shift
    pub async fn readings_of(&self, shift_id: i64) -> DomainResult<Vec<MeterReading>> {
        let mut conn = self
            .db
            .pool
            .acquire()
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        Ok(meter_reading::find_by_shift(&mut conn, shift_id).await?)
    }

    /// Payment breakdown of one shift
    pub async fn allocations_of(&self, shift_id: i64) -> DomainResult<Vec<PaymentAllocation>> {
        let mut conn = self
            .db
            .pool
            .acquire()
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        Ok(allocation::find_by_shift(&mut conn, shift_id).await?)
    }

    /// Cash movements of one shift
    pub async fn movements_of(&self, shift_id: i64) -> DomainResult<Vec<CashMovement>> {
        let mut conn = self
            .db
            .pool
            .acquire()
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        Ok(cash_movement::find_by_shift(&mut conn, shift_id).await?)
    }

    /// Post-commit refresh of hose `last_reading` caches — log and continue
    async fn refresh_hose_caches(&self, readings: &[MeterReading]) {
        let mut conn = match self.db.pool.acquire().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!(error = %e, "Hose cache refresh skipped: no connection");
                return;
            }
        };
        for reading in readings {
            if let Err(e) =
                hose::update_last_reading(&mut conn, reading.hose_id, reading.current_reading)
                    .await
            {
                tracing::warn!(
                    hose_id = reading.hose_id,
                    error = %e,
                    "Hose cache refresh failed"
                );
            }
        }
    }
}
