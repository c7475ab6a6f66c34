//! Payment Allocation Repository

use sqlx::SqliteConnection;

use shared::models::{MethodCategory, PaymentAllocation};

use super::{RepoError, RepoResult};

const COLUMNS: &str =
    "id, shift_id, method, category, amount, percentage, created_at, updated_at";

pub async fn find_by_shift(
    conn: &mut SqliteConnection,
    shift_id: i64,
) -> RepoResult<Vec<PaymentAllocation>> {
    let allocations = sqlx::query_as::<_, PaymentAllocation>(&format!(
        "SELECT {COLUMNS} FROM payment_allocation WHERE shift_id = ? ORDER BY amount DESC, method ASC"
    ))
    .bind(shift_id)
    .fetch_all(conn)
    .await?;
    Ok(allocations)
}

pub async fn insert(
    conn: &mut SqliteConnection,
    shift_id: i64,
    method: &str,
    category: MethodCategory,
    amount: f64,
    percentage: f64,
) -> RepoResult<PaymentAllocation> {
    let now = shared::util::now_millis();
    let allocation = sqlx::query_as::<_, PaymentAllocation>(&format!(
        "INSERT INTO payment_allocation \
         (shift_id, method, category, amount, percentage, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?) \
         RETURNING {COLUMNS}"
    ))
    .bind(shift_id)
    .bind(method)
    .bind(category)
    .bind(amount)
    .bind(percentage)
    .bind(now)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(allocation)
}

pub async fn update_amount(
    conn: &mut SqliteConnection,
    id: i64,
    amount: f64,
    percentage: f64,
) -> RepoResult<()> {
    let now = shared::util::now_millis();
    let result = sqlx::query(
        "UPDATE payment_allocation SET amount = ?, percentage = ?, updated_at = ? WHERE id = ?",
    )
    .bind(amount)
    .bind(percentage)
    .bind(now)
    .bind(id)
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("payment allocation {id}")));
    }
    Ok(())
}
