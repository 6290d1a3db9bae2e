use sqlx::PgPool;

use crate::models::product::{CreateProductPayload, ProductView, UpdateProductPayload};
use crate::types::{CategoryId, ProductId};

const PRODUCT_VIEW: &str = r#"
    SELECT p.product_id, p.category_id, p.product_name, p.description, p.price,
           p.product_quantity, p.image_url, c.category_name
    FROM products p
    LEFT JOIN categories c ON p.category_id = c.category_id
"#;

pub async fn list_products(pool: &PgPool) -> Result<Vec<ProductView>, sqlx::Error> {
    let query = format!("{PRODUCT_VIEW} ORDER BY p.created_at DESC");
    sqlx::query_as::<_, ProductView>(&query)
        .fetch_all(pool)
        .await
}

pub async fn list_products_by_category(
    pool: &PgPool,
    category_id: CategoryId,
) -> Result<Vec<ProductView>, sqlx::Error> {
    let query = format!("{PRODUCT_VIEW} WHERE p.category_id = $1 ORDER BY p.product_name");
    sqlx::query_as::<_, ProductView>(&query)
        .bind(category_id)
        .fetch_all(pool)
        .await
}

pub async fn find_product(
    pool: &PgPool,
    id: ProductId,
) -> Result<Option<ProductView>, sqlx::Error> {
    let query = format!("{PRODUCT_VIEW} WHERE p.product_id = $1");
    sqlx::query_as::<_, ProductView>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn category_exists(pool: &PgPool, id: CategoryId) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM categories WHERE category_id = $1)",
    )
    .bind(id)
    .fetch_one(pool)
    .await
}

pub async fn create_product(
    pool: &PgPool,
    category_id: CategoryId,
    price: f64,
    quantity: i32,
    payload: &CreateProductPayload,
) -> Result<ProductId, sqlx::Error> {
    sqlx::query_scalar::<_, ProductId>(
        "INSERT INTO products (category_id, product_name, description, price, product_quantity, image_url) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING product_id",
    )
    .bind(category_id)
    .bind(payload.product_name.trim())
    .bind(&payload.description)
    .bind(price)
    .bind(quantity)
    .bind(&payload.image_url)
    .fetch_one(pool)
    .await
}

/// Keeps the stored image when the payload carries none. Returns whether a
/// row was updated.
pub async fn update_product(
    pool: &PgPool,
    id: ProductId,
    price: f64,
    quantity: i32,
    payload: &UpdateProductPayload,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE products SET product_name = $1, description = $2, price = $3, \
         product_quantity = $4, image_url = COALESCE($5, image_url) WHERE product_id = $6",
    )
    .bind(payload.product_name.trim())
    .bind(&payload.description)
    .bind(price)
    .bind(quantity)
    .bind(&payload.image_url)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn delete_product(pool: &PgPool, id: ProductId) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM products WHERE product_id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() == 1)
}
