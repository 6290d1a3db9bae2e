use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::{CategoryId, ProductId};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
/// A product joined with the name of its category.
pub struct ProductView {
    pub product_id: ProductId,
    pub category_id: CategoryId,
    pub product_name: String,
    pub description: Option<String>,
    pub price: f64,
    pub product_quantity: i32,
    pub image_url: Option<String>,
    pub category_name: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateProductPayload {
    pub category_id: Option<CategoryId>,
    pub product_name: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub product_quantity: Option<i32>,
    pub image_url: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateProductPayload {
    pub product_name: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub product_quantity: Option<i32>,
    /// Replaces the stored image reference when present.
    pub image_url: Option<String>,
}
