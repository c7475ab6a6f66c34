//! Vessel Repository

use sqlx::SqliteConnection;

use shared::models::{Vessel, VesselCreate};

use super::{RepoError, RepoResult};

const COLUMNS: &str = "id, station_id, product_id, name, capacity, min_level, \
                       current_height, current_volume, unit, created_at, updated_at";

pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<Vessel>> {
    let vessel =
        sqlx::query_as::<_, Vessel>(&format!("SELECT {COLUMNS} FROM vessel WHERE id = ?"))
            .bind(id)
            .fetch_optional(conn)
            .await?;
    Ok(vessel)
}

pub async fn create(conn: &mut SqliteConnection, data: VesselCreate) -> RepoResult<Vessel> {
    if data.capacity <= 0.0 {
        return Err(RepoError::Validation(format!(
            "Vessel capacity must be positive: {}",
            data.capacity
        )));
    }
    let now = shared::util::now_millis();
    let vessel = sqlx::query_as::<_, Vessel>(&format!(
        "INSERT INTO vessel (station_id, product_id, name, capacity, min_level, unit, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?) \
         RETURNING {COLUMNS}"
    ))
    .bind(data.station_id)
    .bind(data.product_id)
    .bind(&data.name)
    .bind(data.capacity)
    .bind(data.min_level.unwrap_or(0.0))
    .bind(data.unit.as_deref().unwrap_or("L"))
    .bind(now)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(vessel)
}

/// Record the vessel's latest dip reading and derived volume
pub async fn update_level(
    conn: &mut SqliteConnection,
    id: i64,
    height: f64,
    volume: f64,
) -> RepoResult<()> {
    let now = shared::util::now_millis();
    let result = sqlx::query(
        "UPDATE vessel SET current_height = ?, current_volume = ?, updated_at = ? WHERE id = ?",
    )
    .bind(height)
    .bind(volume)
    .bind(now)
    .bind(id)
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("vessel {id}")));
    }
    Ok(())
}
