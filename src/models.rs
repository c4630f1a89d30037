use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entity::{
        addresses, brands, categories, order_items, orders, product_images, products, users,
    },
    pricing,
};

macro_rules! string_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("invalid {}: {other}", stringify!($name))),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
pub enum UserType {
    #[default]
    B2B,
    B2C,
}

string_enum!(UserType { B2B => "B2B", B2C => "B2C" });

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    Customer,
    Admin,
    SuperAdmin,
}

string_enum!(UserRole {
    Customer => "customer",
    Admin => "admin",
    SuperAdmin => "super_admin",
});

impl UserRole {
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::SuperAdmin)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

string_enum!(OrderStatus {
    Pending => "pending",
    Confirmed => "confirmed",
    Processing => "processing",
    Shipped => "shipped",
    Delivered => "delivered",
    Cancelled => "cancelled",
});

impl OrderStatus {
    pub fn is_cancellable(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Confirmed)
    }

    /// Delivered and cancelled orders accept no further status changes.
    pub fn is_closed(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
    Cod,
}

string_enum!(PaymentStatus {
    Pending => "pending",
    Paid => "paid",
    Failed => "failed",
    Refunded => "refunded",
    Cod => "cod",
});

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub phone: Option<String>,
    pub full_name: Option<String>,
    pub business_name: Option<String>,
    pub gst_number: Option<String>,
    pub user_type: UserType,
    pub role: UserRole,
    pub is_active: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Category {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct CategoryWithChildren {
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<Category>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Brand {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub logo_url: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ProductImage {
    pub id: Uuid,
    pub product_id: Uuid,
    pub image_url: String,
    pub alt_text: Option<String>,
    pub sort_order: i32,
    pub is_primary: bool,
}

/// Listing row for product grids.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ProductSummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub sku: String,
    pub short_description: Option<String>,
    pub mrp: i64,
    pub selling_price: i64,
    pub b2b_price: Option<i64>,
    pub discount_percentage: i64,
    pub stock_quantity: i32,
    pub is_featured: bool,
    pub primary_image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub sku: String,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub mrp: i64,
    pub selling_price: i64,
    pub b2b_price: Option<i64>,
    pub stock_quantity: i32,
    pub min_order_quantity: i32,
    pub unit: String,
    #[schema(value_type = Object)]
    pub attributes: serde_json::Value,
    pub category_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
    pub is_active: bool,
    pub is_featured: bool,
    pub images: Vec<ProductImage>,
    pub category: Option<Category>,
    pub brand: Option<Brand>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Address {
    pub id: Uuid,
    pub user_id: Uuid,
    pub label: String,
    pub full_name: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

/// Address copied onto an order at checkout.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ShippingAddress {
    pub full_name: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String {
    "India".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct CartItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub product_name: String,
    pub product_slug: String,
    pub product_sku: String,
    pub unit_price: i64,
    pub primary_image: Option<String>,
    pub total_price: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Cart {
    pub items: Vec<CartItem>,
    pub items_count: i64,
    pub subtotal: i64,
    pub tax_amount: i64,
    pub total_amount: i64,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct WishlistItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_slug: String,
    pub product_sku: String,
    pub selling_price: i64,
    pub mrp: i64,
    pub primary_image: Option<String>,
    pub is_in_stock: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub product_sku: String,
    pub unit_price: i64,
    pub quantity: i32,
    pub total_price: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub order_number: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<String>,
    pub subtotal: i64,
    pub discount_amount: i64,
    pub shipping_amount: i64,
    pub tax_amount: i64,
    pub total_amount: i64,
    pub notes: Option<String>,
    pub shipping_address: Option<ShippingAddress>,
    pub items: Vec<OrderItem>,
    pub placed_at: Option<DateTime<Utc>>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct OrderSummary {
    pub id: Uuid,
    pub order_number: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub total_amount: i64,
    pub items_count: i64,
    pub placed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// Entity conversions. Unknown enum strings fall back to the default variant
// so a hand-edited row never takes a listing down.

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            phone: model.phone,
            full_name: model.full_name,
            business_name: model.business_name,
            gst_number: model.gst_number,
            user_type: model.user_type.parse().unwrap_or_default(),
            role: model.role.parse().unwrap_or_default(),
            is_active: model.is_active,
            is_verified: model.is_verified,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<categories::Model> for Category {
    fn from(model: categories::Model) -> Self {
        Self {
            id: model.id,
            parent_id: model.parent_id,
            name: model.name,
            slug: model.slug,
            description: model.description,
            image_url: model.image_url,
            sort_order: model.sort_order,
            is_active: model.is_active,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<brands::Model> for Brand {
    fn from(model: brands::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
            logo_url: model.logo_url,
            description: model.description,
            is_active: model.is_active,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<product_images::Model> for ProductImage {
    fn from(model: product_images::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            image_url: model.image_url,
            alt_text: model.alt_text,
            sort_order: model.sort_order,
            is_primary: model.is_primary,
        }
    }
}

/// Primary image, else the first by sort order, else none.
pub fn primary_image_url(images: &[product_images::Model]) -> Option<String> {
    images
        .iter()
        .find(|img| img.is_primary)
        .or_else(|| images.iter().min_by_key(|img| img.sort_order))
        .map(|img| img.image_url.clone())
}

impl ProductSummary {
    pub fn from_entity(model: products::Model, images: &[product_images::Model]) -> Self {
        Self {
            discount_percentage: pricing::discount_percentage(model.mrp, model.selling_price),
            primary_image: primary_image_url(images),
            id: model.id,
            name: model.name,
            slug: model.slug,
            sku: model.sku,
            short_description: model.short_description,
            mrp: model.mrp,
            selling_price: model.selling_price,
            b2b_price: model.b2b_price,
            stock_quantity: model.stock_quantity,
            is_featured: model.is_featured,
        }
    }
}

impl Product {
    pub fn from_entity(
        model: products::Model,
        mut images: Vec<product_images::Model>,
        category: Option<categories::Model>,
        brand: Option<brands::Model>,
    ) -> Self {
        images.sort_by_key(|img| img.sort_order);
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
            sku: model.sku,
            description: model.description,
            short_description: model.short_description,
            mrp: model.mrp,
            selling_price: model.selling_price,
            b2b_price: model.b2b_price,
            stock_quantity: model.stock_quantity,
            min_order_quantity: model.min_order_quantity,
            unit: model.unit,
            attributes: model.attributes,
            category_id: model.category_id,
            brand_id: model.brand_id,
            is_active: model.is_active,
            is_featured: model.is_featured,
            images: images.into_iter().map(ProductImage::from).collect(),
            category: category.map(Category::from),
            brand: brand.map(Brand::from),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<addresses::Model> for Address {
    fn from(model: addresses::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            label: model.label,
            full_name: model.full_name,
            phone: model.phone,
            address_line1: model.address_line1,
            address_line2: model.address_line2,
            city: model.city,
            state: model.state,
            postal_code: model.postal_code,
            country: model.country,
            is_default: model.is_default,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<&addresses::Model> for ShippingAddress {
    fn from(model: &addresses::Model) -> Self {
        Self {
            full_name: model.full_name.clone(),
            phone: model.phone.clone(),
            address_line1: model.address_line1.clone(),
            address_line2: model.address_line2.clone(),
            city: model.city.clone(),
            state: model.state.clone(),
            postal_code: model.postal_code.clone(),
            country: model.country.clone(),
        }
    }
}

impl From<order_items::Model> for OrderItem {
    fn from(model: order_items::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            product_name: model.product_name,
            product_sku: model.product_sku,
            unit_price: model.unit_price,
            quantity: model.quantity,
            total_price: model.total_price,
        }
    }
}

impl Order {
    pub fn from_entity(model: orders::Model, items: Vec<order_items::Model>) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            order_number: model.order_number,
            status: model.status.parse().unwrap_or_default(),
            payment_status: model.payment_status.parse().unwrap_or_default(),
            payment_method: model.payment_method,
            subtotal: model.subtotal,
            discount_amount: model.discount_amount,
            shipping_amount: model.shipping_amount,
            tax_amount: model.tax_amount,
            total_amount: model.total_amount,
            notes: model.notes,
            shipping_address: serde_json::from_value(model.shipping_address).ok(),
            items: items.into_iter().map(OrderItem::from).collect(),
            placed_at: model.placed_at.map(|dt| dt.with_timezone(&Utc)),
            shipped_at: model.shipped_at.map(|dt| dt.with_timezone(&Utc)),
            delivered_at: model.delivered_at.map(|dt| dt.with_timezone(&Utc)),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl OrderSummary {
    pub fn from_entity(model: orders::Model, items_count: i64) -> Self {
        Self {
            id: model.id,
            order_number: model.order_number,
            status: model.status.parse().unwrap_or_default(),
            payment_status: model.payment_status.parse().unwrap_or_default(),
            total_amount: model.total_amount,
            items_count,
            placed_at: model.placed_at.map(|dt| dt.with_timezone(&Utc)),
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_round_trip_through_their_column_text() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), *status);
        }
        assert_eq!("super_admin".parse::<UserRole>().unwrap(), UserRole::SuperAdmin);
        assert!("archived".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn serde_names_match_column_text() {
        let json = serde_json::to_string(&PaymentStatus::Cod).unwrap();
        assert_eq!(json, "\"cod\"");
        let json = serde_json::to_string(&UserType::B2C).unwrap();
        assert_eq!(json, "\"B2C\"");
    }

    #[test]
    fn only_pending_and_confirmed_orders_cancel() {
        assert!(OrderStatus::Pending.is_cancellable());
        assert!(OrderStatus::Confirmed.is_cancellable());
        assert!(!OrderStatus::Shipped.is_cancellable());
    }

    #[test]
    fn delivered_and_cancelled_orders_are_closed() {
        assert!(OrderStatus::Delivered.is_closed());
        assert!(OrderStatus::Cancelled.is_closed());
        assert!(!OrderStatus::Shipped.is_closed());
        assert!(!OrderStatus::Pending.is_closed());
    }

    #[test]
    fn admin_roles() {
        assert!(UserRole::SuperAdmin.is_admin());
        assert!(!UserRole::Customer.is_admin());
    }
}
