use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Brand, Category, CategoryWithChildren, ProductSummary};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<ProductSummary>)]
    pub items: Vec<ProductSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct CategoryList {
    #[schema(value_type = Vec<Category>)]
    pub items: Vec<Category>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct CategoryTree {
    #[schema(value_type = Vec<CategoryWithChildren>)]
    pub items: Vec<CategoryWithChildren>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct BrandList {
    #[schema(value_type = Vec<Brand>)]
    pub items: Vec<Brand>,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub slug: Option<String>,
    pub sku: String,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub mrp: i64,
    pub selling_price: i64,
    pub b2b_price: Option<i64>,
    #[serde(default)]
    pub stock_quantity: i32,
    pub min_order_quantity: Option<i32>,
    pub unit: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub attributes: Option<serde_json::Value>,
    pub category_id: Option<uuid::Uuid>,
    pub brand_id: Option<uuid::Uuid>,
    #[serde(default)]
    pub is_featured: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub mrp: Option<i64>,
    pub selling_price: Option<i64>,
    pub b2b_price: Option<i64>,
    pub stock_quantity: Option<i32>,
    pub min_order_quantity: Option<i32>,
    pub unit: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub attributes: Option<serde_json::Value>,
    pub category_id: Option<uuid::Uuid>,
    pub brand_id: Option<uuid::Uuid>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct AddImageRequest {
    pub image_url: String,
    pub alt_text: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct AdjustStockRequest {
    /// Signed change; the result never drops below zero.
    pub adjustment: i32,
    pub reason: Option<String>,
}
