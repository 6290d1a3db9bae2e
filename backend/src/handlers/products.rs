use axum::extract::State;
use axum::Json;

use crate::{
    error::AppError,
    extract::{ApiJson, ApiPath},
    models::product::{CreateProductPayload, ProductView, UpdateProductPayload},
    repositories::product as repo,
    response::{message, success, ApiResponse},
    state::AppState,
    types::{CategoryId, ProductId},
    validation::{require_present, rules::validate_price},
};

type HandlerResult<T> = Result<Json<ApiResponse<T>>, AppError>;

fn product_not_found() -> AppError {
    AppError::NotFound("Product not found".to_string())
}

/// Price must be present and positive; quantity defaults to zero and may
/// not be negative.
fn check_stock(price: Option<f64>, quantity: Option<i32>) -> Result<(f64, i32), AppError> {
    let price = price.ok_or_else(|| AppError::Validation("Price is required".to_string()))?;
    validate_price(price).map_err(|err| {
        AppError::Validation(
            err.message
                .map(|m| m.to_string())
                .unwrap_or_else(|| "Invalid price".to_string()),
        )
    })?;

    let quantity = quantity.unwrap_or(0);
    if quantity < 0 {
        return Err(AppError::Validation(
            "Quantity cannot be negative".to_string(),
        ));
    }
    Ok((price, quantity))
}

pub async fn list_products(State(state): State<AppState>) -> HandlerResult<Vec<ProductView>> {
    Ok(success(repo::list_products(&state.pool).await?))
}

pub async fn list_products_by_category(
    State(state): State<AppState>,
    ApiPath(category_id): ApiPath<CategoryId>,
) -> HandlerResult<Vec<ProductView>> {
    let products = repo::list_products_by_category(&state.pool, category_id).await?;
    Ok(success(products))
}

pub async fn get_product(
    State(state): State<AppState>,
    ApiPath(product_id): ApiPath<ProductId>,
) -> HandlerResult<ProductView> {
    let product = repo::find_product(&state.pool, product_id)
        .await?
        .ok_or_else(product_not_found)?;
    Ok(success(product))
}

pub async fn create_product(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateProductPayload>,
) -> HandlerResult<ProductView> {
    require_present(&[&payload.product_name], "Product name is required")?;
    let category_id = payload
        .category_id
        .ok_or_else(|| AppError::Validation("Category is required".to_string()))?;
    let (price, quantity) = check_stock(payload.price, payload.product_quantity)?;

    if !repo::category_exists(&state.pool, category_id).await? {
        return Err(AppError::NotFound("Category not found".to_string()));
    }

    let product_id =
        repo::create_product(&state.pool, category_id, price, quantity, &payload).await?;
    tracing::info!(product_id = %product_id, "product created");

    let product = repo::find_product(&state.pool, product_id)
        .await?
        .ok_or_else(product_not_found)?;
    Ok(success(product))
}

pub async fn update_product(
    State(state): State<AppState>,
    ApiPath(product_id): ApiPath<ProductId>,
    ApiJson(payload): ApiJson<UpdateProductPayload>,
) -> HandlerResult<ProductView> {
    require_present(&[&payload.product_name], "Product name is required")?;
    let (price, quantity) = check_stock(payload.price, payload.product_quantity)?;

    if !repo::update_product(&state.pool, product_id, price, quantity, &payload).await? {
        return Err(product_not_found());
    }

    let product = repo::find_product(&state.pool, product_id)
        .await?
        .ok_or_else(product_not_found)?;
    Ok(success(product))
}

pub async fn delete_product(
    State(state): State<AppState>,
    ApiPath(product_id): ApiPath<ProductId>,
) -> HandlerResult<String> {
    if !repo::delete_product(&state.pool, product_id).await? {
        return Err(product_not_found());
    }
    tracing::info!(product_id = %product_id, "product deleted");
    Ok(message("Product deleted successfully"))
}
