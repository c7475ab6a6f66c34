//! Meter reading ledger (计量台账)
//!
//! One record per (shift, hose): previous cumulative counter, new counter,
//! quantity sold and its valuation. Valuation always uses the product's
//! *current* unit price, never a historical snapshot.

use sqlx::SqliteConnection;

use shared::error::{DomainError, DomainResult};
use shared::models::MeterReading;

use crate::db::repository::{hose, meter_reading, product};
use crate::money::{sale_value, to_decimal, to_volume_f64};

/// Record one hose's counter for a shift being closed
///
/// The previous reading is the hose's chronologically latest ledger entry,
/// falling back to the hose's cached `last_reading` for a hose with no
/// history yet. Runs on the caller's connection so shift close stays one
/// transaction.
pub async fn record_reading(
    conn: &mut SqliteConnection,
    hose_id: i64,
    shift_id: i64,
    new_current_reading: f64,
) -> DomainResult<MeterReading> {
    crate::money::require_finite(new_current_reading, "current_reading")?;

    let hose = hose::find_by_id(&mut *conn, hose_id)
        .await?
        .ok_or_else(|| DomainError::not_found(format!("hose {hose_id}")))?;

    let previous_reading = match meter_reading::find_latest_for_hose(&mut *conn, hose_id).await? {
        Some(latest) => latest.current_reading,
        None => hose.last_reading,
    };

    if new_current_reading < previous_reading {
        return Err(DomainError::NonMonotonicReading {
            hose_id,
            previous: previous_reading,
            current: new_current_reading,
        });
    }

    let quantity_sold =
        to_volume_f64(to_decimal(new_current_reading) - to_decimal(previous_reading));
    let unit_price = product::current_price(&mut *conn, hose.product_id).await?;
    let value = sale_value(quantity_sold, unit_price);

    let reading = meter_reading::insert(
        conn,
        shift_id,
        hose_id,
        previous_reading,
        new_current_reading,
        quantity_sold,
        unit_price,
        value,
    )
    .await?;

    tracing::debug!(
        hose_id,
        shift_id,
        previous_reading,
        new_current_reading,
        quantity_sold,
        "Meter reading recorded"
    );
    Ok(reading)
}
