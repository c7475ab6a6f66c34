//! Shift Closure Repository
//!
//! Chain order is `(business_date, start_time)` ascending; both are TEXT
//! in lexicographically sortable formats, so string comparison is
//! chronological comparison.

use sqlx::SqliteConnection;

use shared::models::{CategoryTotals, ShiftClosure, ShiftOpen, ShiftStatus};

use super::{RepoError, RepoResult};

const COLUMNS: &str = "id, station_id, business_date, start_time, status, operator_id, \
                       operator_name, total_volume, total_sales, cash_total, card_total, \
                       transfer_total, other_total, note, created_at, updated_at";

pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<ShiftClosure>> {
    let shift = sqlx::query_as::<_, ShiftClosure>(&format!(
        "SELECT {COLUMNS} FROM shift_closure WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(shift)
}

/// The station's currently open shift, if any (at most one by construction)
pub async fn find_open_by_station(
    conn: &mut SqliteConnection,
    station_id: i64,
) -> RepoResult<Option<ShiftClosure>> {
    let shift = sqlx::query_as::<_, ShiftClosure>(&format!(
        "SELECT {COLUMNS} FROM shift_closure WHERE station_id = ? AND status = 'OPEN' LIMIT 1"
    ))
    .bind(station_id)
    .fetch_optional(conn)
    .await?;
    Ok(shift)
}

/// The minimal shift strictly after `(business_date, start_time)` for a station
pub async fn find_following(
    conn: &mut SqliteConnection,
    station_id: i64,
    business_date: &str,
    start_time: &str,
) -> RepoResult<Option<ShiftClosure>> {
    let shift = sqlx::query_as::<_, ShiftClosure>(&format!(
        "SELECT {COLUMNS} FROM shift_closure \
         WHERE station_id = ? \
           AND (business_date > ? OR (business_date = ? AND start_time > ?)) \
         ORDER BY business_date ASC, start_time ASC LIMIT 1"
    ))
    .bind(station_id)
    .bind(business_date)
    .bind(business_date)
    .bind(start_time)
    .fetch_optional(conn)
    .await?;
    Ok(shift)
}

/// All shifts of a station in chain order
/// The station's chain-latest shift, if any
pub async fn find_latest(
    conn: &mut SqliteConnection,
    station_id: i64,
) -> RepoResult<Option<ShiftClosure>> {
    let shift = sqlx::query_as::<_, ShiftClosure>(&format!(
        "SELECT {COLUMNS} FROM shift_closure WHERE station_id = ? \
         ORDER BY business_date DESC, start_time DESC LIMIT 1"
    ))
    .bind(station_id)
    .fetch_optional(conn)
    .await?;
    Ok(shift)
}

pub async fn find_all_chain_order(
    conn: &mut SqliteConnection,
    station_id: i64,
) -> RepoResult<Vec<ShiftClosure>> {
    let shifts = sqlx::query_as::<_, ShiftClosure>(&format!(
        "SELECT {COLUMNS} FROM shift_closure WHERE station_id = ? \
         ORDER BY business_date ASC, start_time ASC"
    ))
    .bind(station_id)
    .fetch_all(conn)
    .await?;
    Ok(shifts)
}

pub async fn create(conn: &mut SqliteConnection, data: ShiftOpen) -> RepoResult<ShiftClosure> {
    let now = shared::util::now_millis();
    let shift = sqlx::query_as::<_, ShiftClosure>(&format!(
        "INSERT INTO shift_closure \
         (station_id, business_date, start_time, status, operator_id, operator_name, note, created_at, updated_at) \
         VALUES (?, ?, ?, 'OPEN', ?, ?, ?, ?, ?) \
         RETURNING {COLUMNS}"
    ))
    .bind(data.station_id)
    .bind(&data.business_date)
    .bind(&data.start_time)
    .bind(data.operator_id)
    .bind(data.operator_name.as_deref())
    .bind(data.note.as_deref())
    .bind(now)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(shift)
}

pub async fn update_status(
    conn: &mut SqliteConnection,
    id: i64,
    status: ShiftStatus,
) -> RepoResult<()> {
    let now = shared::util::now_millis();
    let result = sqlx::query("UPDATE shift_closure SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status)
        .bind(now)
        .bind(id)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("shift {id}")));
    }
    Ok(())
}

pub async fn update_note(conn: &mut SqliteConnection, id: i64, note: &str) -> RepoResult<()> {
    let now = shared::util::now_millis();
    let result = sqlx::query("UPDATE shift_closure SET note = ?, updated_at = ? WHERE id = ?")
        .bind(note)
        .bind(now)
        .bind(id)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("shift {id}")));
    }
    Ok(())
}

/// Persist a shift's recomputed totals and category buckets
pub async fn update_totals(
    conn: &mut SqliteConnection,
    id: i64,
    total_volume: f64,
    total_sales: f64,
    buckets: CategoryTotals,
) -> RepoResult<()> {
    let now = shared::util::now_millis();
    let result = sqlx::query(
        "UPDATE shift_closure SET total_volume = ?, total_sales = ?, cash_total = ?, \
         card_total = ?, transfer_total = ?, other_total = ?, updated_at = ? WHERE id = ?",
    )
    .bind(total_volume)
    .bind(total_sales)
    .bind(buckets.cash)
    .bind(buckets.card)
    .bind(buckets.transfer)
    .bind(buckets.other)
    .bind(now)
    .bind(id)
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("shift {id}")));
    }
    Ok(())
}
