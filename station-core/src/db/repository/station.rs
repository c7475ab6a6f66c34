//! Station Repository

use sqlx::SqliteConnection;

use shared::models::{Station, StationCreate};

use super::RepoResult;

pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<Station>> {
    let station = sqlx::query_as::<_, Station>(
        "SELECT id, name, created_at, updated_at FROM station WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(station)
}

pub async fn create(conn: &mut SqliteConnection, data: StationCreate) -> RepoResult<Station> {
    let now = shared::util::now_millis();
    let station = sqlx::query_as::<_, Station>(
        "INSERT INTO station (name, created_at, updated_at) VALUES (?, ?, ?) \
         RETURNING id, name, created_at, updated_at",
    )
    .bind(&data.name)
    .bind(now)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(station)
}
