//! Cash Register Repository

use sqlx::SqliteConnection;

use shared::models::CashRegister;

use super::{RepoError, RepoResult};

const COLUMNS: &str =
    "id, station_id, opening_balance, current_balance, created_at, updated_at";

pub async fn find_by_station(
    conn: &mut SqliteConnection,
    station_id: i64,
) -> RepoResult<Option<CashRegister>> {
    let register = sqlx::query_as::<_, CashRegister>(&format!(
        "SELECT {COLUMNS} FROM cash_register WHERE station_id = ?"
    ))
    .bind(station_id)
    .fetch_optional(conn)
    .await?;
    Ok(register)
}

pub async fn create(
    conn: &mut SqliteConnection,
    station_id: i64,
    opening_balance: f64,
) -> RepoResult<CashRegister> {
    let now = shared::util::now_millis();
    let register = sqlx::query_as::<_, CashRegister>(&format!(
        "INSERT INTO cash_register (station_id, opening_balance, current_balance, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?) \
         RETURNING {COLUMNS}"
    ))
    .bind(station_id)
    .bind(opening_balance)
    .bind(opening_balance)
    .bind(now)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(register)
}

/// Fetch the station's register, creating a zero-balance one if missing
pub async fn ensure(conn: &mut SqliteConnection, station_id: i64) -> RepoResult<CashRegister> {
    if let Some(register) = find_by_station(&mut *conn, station_id).await? {
        return Ok(register);
    }
    create(conn, station_id, 0.0).await
}

/// Overwrite the cached current balance with a chain-derived value
pub async fn update_current_balance(
    conn: &mut SqliteConnection,
    station_id: i64,
    current_balance: f64,
) -> RepoResult<()> {
    let now = shared::util::now_millis();
    let result = sqlx::query(
        "UPDATE cash_register SET current_balance = ?, updated_at = ? WHERE station_id = ?",
    )
    .bind(current_balance)
    .bind(now)
    .bind(station_id)
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!(
            "cash register for station {station_id}"
        )));
    }
    Ok(())
}
