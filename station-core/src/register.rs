//! Cash register accumulator (收银余额链)
//!
//! The chain walk is the single source of truth: a shift's opening balance
//! is the register's configured opening balance plus the net cash movement
//! of every earlier shift. The register row's `current_balance` is only a
//! cache of the latest shift's closing balance, recomputed from the walk
//! after every mutation — it is never incrementally drifted.

use std::sync::Arc;

use rust_decimal::Decimal;
use sqlx::SqliteConnection;

use shared::error::{DomainError, DomainResult};
use shared::models::{CashDirection, ChainedCashBalance};

use crate::config::Config;
use crate::db::DbService;
use crate::db::repository::{cash_movement, register, shift};
use crate::money::{to_decimal, to_money_f64};

/// Read-side service over the per-station cash balance chain
#[derive(Clone)]
pub struct RegisterService {
    db: DbService,
    config: Arc<Config>,
}

impl RegisterService {
    pub fn new(db: DbService, config: Arc<Config>) -> Self {
        Self { db, config }
    }

    /// Chain-derived opening/closing balance of one shift
    pub async fn chained_cash_balance(
        &self,
        station_id: i64,
        shift_id: i64,
    ) -> DomainResult<ChainedCashBalance> {
        let mut conn = self
            .db
            .pool
            .acquire()
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        chained_balance(&mut conn, station_id, shift_id, self.config.max_chain_hops).await
    }
}

/// Net cash movement of one shift (Σ IN − Σ OUT)
pub(crate) async fn net_cash(conn: &mut SqliteConnection, shift_id: i64) -> DomainResult<Decimal> {
    let movements = cash_movement::find_by_shift(conn, shift_id).await?;
    let mut net = Decimal::ZERO;
    for movement in &movements {
        match movement.direction {
            CashDirection::In => net += to_decimal(movement.amount),
            CashDirection::Out => net -= to_decimal(movement.amount),
        }
    }
    Ok(net)
}

/// Walk the chain from its start and derive one shift's balances
pub(crate) async fn chained_balance(
    conn: &mut SqliteConnection,
    station_id: i64,
    shift_id: i64,
    max_hops: u32,
) -> DomainResult<ChainedCashBalance> {
    let reg = register::find_by_station(&mut *conn, station_id)
        .await?
        .ok_or_else(|| {
            DomainError::not_found(format!("cash register for station {station_id}"))
        })?;

    let shifts = shift::find_all_chain_order(&mut *conn, station_id).await?;

    let mut opening = to_decimal(reg.opening_balance);
    let mut hops: u32 = 0;
    for s in &shifts {
        hops += 1;
        if hops > max_hops {
            return Err(DomainError::ChainBoundExceeded { shift_id, max_hops });
        }
        let net = net_cash(&mut *conn, s.id).await?;
        if s.id == shift_id {
            return Ok(ChainedCashBalance {
                opening_balance: to_money_f64(opening),
                closing_balance: to_money_f64(opening + net),
            });
        }
        opening += net;
    }

    Err(DomainError::not_found(format!(
        "shift {shift_id} in chain of station {station_id}"
    )))
}

/// Re-derive and store the register's cached current balance
pub(crate) async fn recompute_register(
    conn: &mut SqliteConnection,
    station_id: i64,
    max_hops: u32,
) -> DomainResult<f64> {
    let reg = register::ensure(&mut *conn, station_id).await?;
    let shifts = shift::find_all_chain_order(&mut *conn, station_id).await?;

    let mut balance = to_decimal(reg.opening_balance);
    let mut hops: u32 = 0;
    for s in &shifts {
        hops += 1;
        if hops > max_hops {
            return Err(DomainError::ChainBoundExceeded {
                shift_id: s.id,
                max_hops,
            });
        }
        balance += net_cash(&mut *conn, s.id).await?;
    }

    let balance = to_money_f64(balance);
    register::update_current_balance(&mut *conn, station_id, balance).await?;
    tracing::debug!(station_id, balance, "Register cache recomputed from chain");
    Ok(balance)
}

/// Adjust a shift's maintained sales movement by a cash delta, then refresh
/// the register cache from the chain
pub(crate) async fn apply_cash_delta(
    conn: &mut SqliteConnection,
    station_id: i64,
    shift_id: i64,
    delta: f64,
    max_hops: u32,
) -> DomainResult<()> {
    match cash_movement::find_sales_movement(&mut *conn, shift_id).await? {
        Some(movement) => {
            let mut new_amount = to_decimal(movement.amount) + to_decimal(delta);
            if new_amount.is_sign_negative() {
                tracing::warn!(
                    shift_id,
                    amount = movement.amount,
                    delta,
                    "Cash sales movement would go negative, flooring at zero"
                );
                new_amount = Decimal::ZERO;
            }
            cash_movement::update_amount(&mut *conn, movement.id, to_money_f64(new_amount))
                .await?;
        }
        None if delta > 0.0 => {
            cash_movement::insert(
                &mut *conn,
                shift_id,
                CashDirection::In,
                to_money_f64(to_decimal(delta)),
                cash_movement::SHIFT_SALES,
            )
            .await?;
        }
        None => {
            tracing::warn!(
                shift_id,
                delta,
                "No sales cash movement to absorb negative delta, skipping"
            );
        }
    }

    recompute_register(conn, station_id, max_hops).await?;
    Ok(())
}
