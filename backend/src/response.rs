use axum::Json;
use serde::Serialize;

/// Success half of the response envelope. Errors are rendered by
/// [`crate::error::AppError`].
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: &'static str,
    pub data: T,
}

pub fn success<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        status: "success",
        data,
    })
}

pub fn message(text: &str) -> Json<ApiResponse<String>> {
    success(text.to_string())
}
