use sqlx::PgPool;

use crate::models::category::{Category, CategoryPayload};
use crate::types::CategoryId;

const CATEGORY_COLUMNS: &str = "category_id, category_name, description, image_url, created_at";

pub async fn list_categories(pool: &PgPool) -> Result<Vec<Category>, sqlx::Error> {
    let query = format!("SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY category_name");
    sqlx::query_as::<_, Category>(&query).fetch_all(pool).await
}

pub async fn find_category(
    pool: &PgPool,
    id: CategoryId,
) -> Result<Option<Category>, sqlx::Error> {
    let query = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE category_id = $1");
    sqlx::query_as::<_, Category>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn create_category(
    pool: &PgPool,
    payload: &CategoryPayload,
) -> Result<Category, sqlx::Error> {
    let query = format!(
        "INSERT INTO categories (category_name, description, image_url) \
         VALUES ($1, $2, $3) RETURNING {CATEGORY_COLUMNS}"
    );
    sqlx::query_as::<_, Category>(&query)
        .bind(payload.category_name.trim())
        .bind(&payload.description)
        .bind(&payload.image_url)
        .fetch_one(pool)
        .await
}

pub async fn update_category(
    pool: &PgPool,
    id: CategoryId,
    payload: &CategoryPayload,
) -> Result<Option<Category>, sqlx::Error> {
    let query = format!(
        "UPDATE categories SET category_name = $1, description = $2, image_url = $3 \
         WHERE category_id = $4 RETURNING {CATEGORY_COLUMNS}"
    );
    sqlx::query_as::<_, Category>(&query)
        .bind(payload.category_name.trim())
        .bind(&payload.description)
        .bind(&payload.image_url)
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn count_products_in_category(
    pool: &PgPool,
    id: CategoryId,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products WHERE category_id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
}

/// Returns whether a row was deleted.
pub async fn delete_category(pool: &PgPool, id: CategoryId) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM categories WHERE category_id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() == 1)
}
