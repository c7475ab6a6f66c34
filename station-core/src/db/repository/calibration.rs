//! Calibration Point Repository
//!
//! Tables are replaced wholesale; there is deliberately no single-point
//! update function.

use sqlx::SqliteConnection;

use shared::models::{CalibrationPoint, CalibrationPointInput};

use super::RepoResult;

/// All points of a vessel, ordered by ascending height
pub async fn find_by_vessel(
    conn: &mut SqliteConnection,
    vessel_id: i64,
) -> RepoResult<Vec<CalibrationPoint>> {
    let points = sqlx::query_as::<_, CalibrationPoint>(
        "SELECT id, vessel_id, height, volume FROM calibration_point \
         WHERE vessel_id = ? ORDER BY height ASC",
    )
    .bind(vessel_id)
    .fetch_all(conn)
    .await?;
    Ok(points)
}

/// Delete-all-then-insert replacement of a vessel's table
///
/// Caller wraps this in a transaction so a rejected replacement leaves the
/// previous table intact.
pub async fn replace_all(
    conn: &mut SqliteConnection,
    vessel_id: i64,
    points: &[CalibrationPointInput],
) -> RepoResult<usize> {
    sqlx::query("DELETE FROM calibration_point WHERE vessel_id = ?")
        .bind(vessel_id)
        .execute(&mut *conn)
        .await?;

    for point in points {
        sqlx::query("INSERT INTO calibration_point (vessel_id, height, volume) VALUES (?, ?, ?)")
            .bind(vessel_id)
            .bind(point.height)
            .bind(point.volume)
            .execute(&mut *conn)
            .await?;
    }
    Ok(points.len())
}
