//! Hose Repository

use sqlx::SqliteConnection;

use shared::models::{Hose, HoseCreate};

use super::{RepoError, RepoResult};

const COLUMNS: &str = "id, dispenser_id, product_id, label, last_reading, created_at, updated_at";

pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<Hose>> {
    let hose = sqlx::query_as::<_, Hose>(&format!("SELECT {COLUMNS} FROM hose WHERE id = ?"))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(hose)
}

/// Station a hose belongs to (through its dispenser)
pub async fn station_id(conn: &mut SqliteConnection, hose_id: i64) -> RepoResult<i64> {
    let station: Option<i64> = sqlx::query_scalar(
        "SELECT d.station_id FROM hose h JOIN dispenser d ON d.id = h.dispenser_id WHERE h.id = ?",
    )
    .bind(hose_id)
    .fetch_optional(conn)
    .await?;
    station.ok_or_else(|| RepoError::NotFound(format!("hose {hose_id}")))
}

pub async fn create(conn: &mut SqliteConnection, data: HoseCreate) -> RepoResult<Hose> {
    let now = shared::util::now_millis();
    let hose = sqlx::query_as::<_, Hose>(&format!(
        "INSERT INTO hose (dispenser_id, product_id, label, last_reading, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?) \
         RETURNING {COLUMNS}"
    ))
    .bind(data.dispenser_id)
    .bind(data.product_id)
    .bind(&data.label)
    .bind(data.last_reading.unwrap_or(0.0))
    .bind(now)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(hose)
}

/// Refresh the hose's cached last cumulative reading
pub async fn update_last_reading(
    conn: &mut SqliteConnection,
    id: i64,
    last_reading: f64,
) -> RepoResult<()> {
    let now = shared::util::now_millis();
    let result = sqlx::query("UPDATE hose SET last_reading = ?, updated_at = ? WHERE id = ?")
        .bind(last_reading)
        .bind(now)
        .bind(id)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("hose {id}")));
    }
    Ok(())
}
