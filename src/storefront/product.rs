use serde::{Deserialize, Serialize};

use crate::{models::UserType, pricing};

fn default_min_order() -> i32 {
    1
}

fn default_unit() -> String {
    "pcs".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductImageRef {
    #[serde(default)]
    pub id: String,
    pub image_url: String,
    #[serde(default)]
    pub alt_text: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
}

/// A product as the storefront sees it. Deserializes from both the API's
/// listing and detail shapes; fields a shape lacks take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub sku: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub short_description: Option<String>,
    pub mrp: i64,
    pub selling_price: i64,
    #[serde(default)]
    pub b2b_price: Option<i64>,
    #[serde(default)]
    pub stock_quantity: i32,
    #[serde(default = "default_min_order")]
    pub min_order_quantity: i32,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub brand_id: Option<String>,
    #[serde(default)]
    pub brand_name: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub primary_image: Option<String>,
    #[serde(default)]
    pub images: Vec<ProductImageRef>,
}

impl Product {
    pub fn image_url(&self) -> Option<&str> {
        self.primary_image.as_deref().or_else(|| {
            self.images
                .iter()
                .find(|img| img.is_primary)
                .or_else(|| self.images.first())
                .map(|img| img.image_url.as_str())
        })
    }

    pub fn discount_percentage(&self) -> i64 {
        pricing::discount_percentage(self.mrp, self.selling_price)
    }

    /// Price shown to a buyer of the given tier.
    pub fn price_for(&self, user_type: UserType) -> i64 {
        pricing::unit_price_for(user_type, self.selling_price, self.b2b_price)
    }

    pub fn in_stock(&self) -> bool {
        self.is_active && self.stock_quantity > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_json_fills_defaults() {
        let json = serde_json::json!({
            "id": "5f0c6f4e-6d8e-4d8e-9d5e-2b1f1f7b9a10",
            "name": "Rose Face Mist",
            "slug": "rose-face-mist",
            "sku": "SKN-002",
            "mrp": 34900,
            "selling_price": 24900,
            "discount_percentage": 29,
            "stock_quantity": 300,
            "is_featured": true,
            "primary_image": "https://cdn.test/mist.jpg"
        });
        let product: Product = serde_json::from_value(json).unwrap();
        assert_eq!(product.min_order_quantity, 1);
        assert_eq!(product.unit, "pcs");
        assert!(product.is_active);
        assert_eq!(product.image_url(), Some("https://cdn.test/mist.jpg"));
        assert_eq!(product.discount_percentage(), 29);
        assert_eq!(product.price_for(UserType::B2B), 24900);
    }

    #[test]
    fn image_falls_back_to_first_when_none_primary() {
        let json = serde_json::json!({
            "id": "1", "name": "x", "slug": "x", "sku": "X", "mrp": 100, "selling_price": 90,
            "images": [
                { "image_url": "a.jpg" },
                { "image_url": "b.jpg" }
            ]
        });
        let product: Product = serde_json::from_value(json).unwrap();
        assert_eq!(product.image_url(), Some("a.jpg"));
    }
}
