//! Product Repository
//!
//! `unit_price` here is the "current price" lookup the metering ledger and
//! the correction cascade value quantities against.

use sqlx::SqliteConnection;

use shared::models::{Product, ProductCreate};

use super::{RepoError, RepoResult};

pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        "SELECT id, name, unit, unit_price, created_at, updated_at FROM product WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(product)
}

/// Current unit price of a product
pub async fn current_price(conn: &mut SqliteConnection, id: i64) -> RepoResult<f64> {
    let price: Option<f64> = sqlx::query_scalar("SELECT unit_price FROM product WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    price.ok_or_else(|| RepoError::NotFound(format!("product {id}")))
}

pub async fn create(conn: &mut SqliteConnection, data: ProductCreate) -> RepoResult<Product> {
    if data.unit_price < 0.0 {
        return Err(RepoError::Validation(format!(
            "Unit price cannot be negative: {}",
            data.unit_price
        )));
    }
    let now = shared::util::now_millis();
    let product = sqlx::query_as::<_, Product>(
        "INSERT INTO product (name, unit, unit_price, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?) \
         RETURNING id, name, unit, unit_price, created_at, updated_at",
    )
    .bind(&data.name)
    .bind(data.unit.as_deref().unwrap_or("L"))
    .bind(data.unit_price)
    .bind(now)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(product)
}

pub async fn update_price(conn: &mut SqliteConnection, id: i64, unit_price: f64) -> RepoResult<()> {
    if unit_price < 0.0 {
        return Err(RepoError::Validation(format!(
            "Unit price cannot be negative: {unit_price}"
        )));
    }
    let now = shared::util::now_millis();
    let result = sqlx::query("UPDATE product SET unit_price = ?, updated_at = ? WHERE id = ?")
        .bind(unit_price)
        .bind(now)
        .bind(id)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("product {id}")));
    }
    Ok(())
}
