//! Meter Reading Repository
//!
//! Readings are created at shift close and mutated only by the correction
//! cascade. There is no delete function.

use sqlx::SqliteConnection;

use shared::models::MeterReading;

use super::{RepoError, RepoResult};

const COLUMNS: &str = "id, shift_id, hose_id, previous_reading, current_reading, \
                       quantity_sold, unit_price, sale_value, created_at, updated_at";

pub async fn find_by_id(
    conn: &mut SqliteConnection,
    id: i64,
) -> RepoResult<Option<MeterReading>> {
    let reading = sqlx::query_as::<_, MeterReading>(&format!(
        "SELECT {COLUMNS} FROM meter_reading WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(reading)
}

pub async fn find_by_shift_and_hose(
    conn: &mut SqliteConnection,
    shift_id: i64,
    hose_id: i64,
) -> RepoResult<Option<MeterReading>> {
    let reading = sqlx::query_as::<_, MeterReading>(&format!(
        "SELECT {COLUMNS} FROM meter_reading WHERE shift_id = ? AND hose_id = ?"
    ))
    .bind(shift_id)
    .bind(hose_id)
    .fetch_optional(conn)
    .await?;
    Ok(reading)
}

pub async fn find_by_shift(
    conn: &mut SqliteConnection,
    shift_id: i64,
) -> RepoResult<Vec<MeterReading>> {
    let readings = sqlx::query_as::<_, MeterReading>(&format!(
        "SELECT {COLUMNS} FROM meter_reading WHERE shift_id = ? ORDER BY hose_id ASC"
    ))
    .bind(shift_id)
    .fetch_all(conn)
    .await?;
    Ok(readings)
}

/// The hose's chronologically latest reading, by shift chain order
pub async fn find_latest_for_hose(
    conn: &mut SqliteConnection,
    hose_id: i64,
) -> RepoResult<Option<MeterReading>> {
    let reading = sqlx::query_as::<_, MeterReading>(
        "SELECT r.id, r.shift_id, r.hose_id, r.previous_reading, r.current_reading, \
                r.quantity_sold, r.unit_price, r.sale_value, r.created_at, r.updated_at \
         FROM meter_reading r \
         JOIN shift_closure s ON s.id = r.shift_id \
         WHERE r.hose_id = ? \
         ORDER BY s.business_date DESC, s.start_time DESC LIMIT 1",
    )
    .bind(hose_id)
    .fetch_optional(conn)
    .await?;
    Ok(reading)
}

#[allow(clippy::too_many_arguments)]
pub async fn insert(
    conn: &mut SqliteConnection,
    shift_id: i64,
    hose_id: i64,
    previous_reading: f64,
    current_reading: f64,
    quantity_sold: f64,
    unit_price: f64,
    sale_value: f64,
) -> RepoResult<MeterReading> {
    let now = shared::util::now_millis();
    let reading = sqlx::query_as::<_, MeterReading>(&format!(
        "INSERT INTO meter_reading \
         (shift_id, hose_id, previous_reading, current_reading, quantity_sold, unit_price, sale_value, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) \
         RETURNING {COLUMNS}"
    ))
    .bind(shift_id)
    .bind(hose_id)
    .bind(previous_reading)
    .bind(current_reading)
    .bind(quantity_sold)
    .bind(unit_price)
    .bind(sale_value)
    .bind(now)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(reading)
}

/// Rewrite a reading during a correction cascade
#[allow(clippy::too_many_arguments)]
pub async fn update_correction(
    conn: &mut SqliteConnection,
    id: i64,
    previous_reading: f64,
    current_reading: f64,
    quantity_sold: f64,
    unit_price: f64,
    sale_value: f64,
) -> RepoResult<()> {
    let now = shared::util::now_millis();
    let result = sqlx::query(
        "UPDATE meter_reading SET previous_reading = ?, current_reading = ?, \
         quantity_sold = ?, unit_price = ?, sale_value = ?, updated_at = ? WHERE id = ?",
    )
    .bind(previous_reading)
    .bind(current_reading)
    .bind(quantity_sold)
    .bind(unit_price)
    .bind(sale_value)
    .bind(now)
    .bind(id)
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("meter reading {id}")));
    }
    Ok(())
}
