//! Dispenser Repository

use sqlx::SqliteConnection;

use shared::models::{Dispenser, DispenserCreate};

use super::RepoResult;

pub async fn create(conn: &mut SqliteConnection, data: DispenserCreate) -> RepoResult<Dispenser> {
    let now = shared::util::now_millis();
    let dispenser = sqlx::query_as::<_, Dispenser>(
        "INSERT INTO dispenser (station_id, name, created_at, updated_at) VALUES (?, ?, ?, ?) \
         RETURNING id, station_id, name, created_at, updated_at",
    )
    .bind(data.station_id)
    .bind(&data.name)
    .bind(now)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(dispenser)
}
