//! Cash Movement Repository

use sqlx::SqliteConnection;

use shared::models::{CashDirection, CashMovement};

use super::{RepoError, RepoResult};

/// Concept of the per-shift cash-sales movement maintained by
/// close/correction
pub const SHIFT_SALES: &str = "SHIFT_SALES";

const COLUMNS: &str = "id, shift_id, direction, amount, concept, created_at";

pub async fn find_by_shift(
    conn: &mut SqliteConnection,
    shift_id: i64,
) -> RepoResult<Vec<CashMovement>> {
    let movements = sqlx::query_as::<_, CashMovement>(&format!(
        "SELECT {COLUMNS} FROM cash_movement WHERE shift_id = ? ORDER BY id ASC"
    ))
    .bind(shift_id)
    .fetch_all(conn)
    .await?;
    Ok(movements)
}

/// The shift's maintained sales movement, if it exists
pub async fn find_sales_movement(
    conn: &mut SqliteConnection,
    shift_id: i64,
) -> RepoResult<Option<CashMovement>> {
    let movement = sqlx::query_as::<_, CashMovement>(&format!(
        "SELECT {COLUMNS} FROM cash_movement \
         WHERE shift_id = ? AND concept = ? AND direction = 'IN' LIMIT 1"
    ))
    .bind(shift_id)
    .bind(SHIFT_SALES)
    .fetch_optional(conn)
    .await?;
    Ok(movement)
}

pub async fn insert(
    conn: &mut SqliteConnection,
    shift_id: i64,
    direction: CashDirection,
    amount: f64,
    concept: &str,
) -> RepoResult<CashMovement> {
    if amount < 0.0 {
        return Err(RepoError::Validation(format!(
            "Cash movement amount cannot be negative: {amount}"
        )));
    }
    let now = shared::util::now_millis();
    let movement = sqlx::query_as::<_, CashMovement>(&format!(
        "INSERT INTO cash_movement (shift_id, direction, amount, concept, created_at) \
         VALUES (?, ?, ?, ?, ?) \
         RETURNING {COLUMNS}"
    ))
    .bind(shift_id)
    .bind(direction)
    .bind(amount)
    .bind(concept)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(movement)
}

/// Adjust a movement's amount (correction path only)
pub async fn update_amount(conn: &mut SqliteConnection, id: i64, amount: f64) -> RepoResult<()> {
    if amount < 0.0 {
        return Err(RepoError::Validation(format!(
            "Cash movement amount cannot be negative: {amount}"
        )));
    }
    let result = sqlx::query("UPDATE cash_movement SET amount = ? WHERE id = ?")
        .bind(amount)
        .bind(id)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("cash movement {id}")));
    }
    Ok(())
}
