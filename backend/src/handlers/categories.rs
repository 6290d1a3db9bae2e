use axum::extract::State;
use axum::Json;

use crate::{
    error::{is_unique_violation, AppError},
    extract::{ApiJson, ApiPath},
    models::category::{Category, CategoryPayload},
    repositories::category as repo,
    response::{message, success, ApiResponse},
    state::AppState,
    types::CategoryId,
    validation::require_present,
};

type HandlerResult<T> = Result<Json<ApiResponse<T>>, AppError>;

fn category_not_found() -> AppError {
    AppError::NotFound("Category not found".to_string())
}

fn map_write_error(err: sqlx::Error) -> AppError {
    if is_unique_violation(&err) {
        AppError::Conflict("Category already exists".to_string())
    } else {
        err.into()
    }
}

pub async fn list_categories(State(state): State<AppState>) -> HandlerResult<Vec<Category>> {
    let categories = repo::list_categories(&state.pool).await?;
    Ok(success(categories))
}

pub async fn get_category(
    State(state): State<AppState>,
    ApiPath(category_id): ApiPath<CategoryId>,
) -> HandlerResult<Category> {
    let category = repo::find_category(&state.pool, category_id)
        .await?
        .ok_or_else(category_not_found)?;
    Ok(success(category))
}

pub async fn create_category(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CategoryPayload>,
) -> HandlerResult<Category> {
    require_present(&[&payload.category_name], "Category name is required")?;
    let category = repo::create_category(&state.pool, &payload)
        .await
        .map_err(map_write_error)?;
    tracing::info!(category_id = %category.category_id, "category created");
    Ok(success(category))
}

pub async fn update_category(
    State(state): State<AppState>,
    ApiPath(category_id): ApiPath<CategoryId>,
    ApiJson(payload): ApiJson<CategoryPayload>,
) -> HandlerResult<Category> {
    require_present(&[&payload.category_name], "Category name is required")?;
    let category = repo::update_category(&state.pool, category_id, &payload)
        .await
        .map_err(map_write_error)?
        .ok_or_else(category_not_found)?;
    Ok(success(category))
}

pub async fn delete_category(
    State(state): State<AppState>,
    ApiPath(category_id): ApiPath<CategoryId>,
) -> HandlerResult<String> {
    let products = repo::count_products_in_category(&state.pool, category_id).await?;
    if products > 0 {
        return Err(AppError::Validation(
            "Cannot delete category with existing products".to_string(),
        ));
    }
    if !repo::delete_category(&state.pool, category_id).await? {
        return Err(category_not_found());
    }
    tracing::info!(category_id = %category_id, "category deleted");
    Ok(message("Category deleted successfully"))
}
