use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::models::{OrderStatus, PaymentStatus, UserRole};

/// Pages past this read as the last one; keeps the offset well inside `i64`.
pub const MAX_PAGE: i64 = 1_000_000;

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema, IntoParams)]
pub struct Pagination {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl Pagination {
    pub fn new(page: i64, page_size: i64) -> Self {
        Self {
            page: Some(page),
            page_size: Some(page_size),
        }
    }

    /// Returns `(page, page_size, offset)` with page in 1..=MAX_PAGE and
    /// page_size in 1..=100.
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).clamp(1, MAX_PAGE);
        let page_size = self.page_size.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * page_size;
        (page, page_size, offset)
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, ToSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema, IntoParams)]
pub struct ProductQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub category_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
    /// Case-insensitive match on name or description.
    pub search: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub is_featured: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema, IntoParams)]
pub struct FeaturedQuery {
    pub limit: Option<u64>,
}

impl FeaturedQuery {
    pub fn limit(&self) -> u64 {
        self.limit.unwrap_or(10).clamp(1, 50)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema, IntoParams)]
pub struct OrderListQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub status: Option<OrderStatus>,
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema, IntoParams)]
pub struct AdminOrderQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema, IntoParams)]
pub struct AdminProductQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub search: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema, IntoParams)]
pub struct UserListQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema, IntoParams)]
pub struct LowStockQuery {
    pub threshold: Option<i32>,
}

// Query strings are decoded flat, so list queries carry their own paging
// fields instead of flattening `Pagination`.
macro_rules! paged {
    ($($query:ty),+) => {
        $(impl $query {
            pub fn pagination(&self) -> Pagination {
                Pagination {
                    page: self.page,
                    page_size: self.page_size,
                }
            }
        })+
    };
}

paged!(
    ProductQuery,
    OrderListQuery,
    AdminOrderQuery,
    AdminProductQuery,
    UserListQuery
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_is_clamped() {
        assert_eq!(Pagination::default().normalize(), (1, 20, 0));
        assert_eq!(Pagination::new(3, 500).normalize(), (3, 100, 200));
        assert_eq!(Pagination::new(0, 0).normalize(), (1, 1, 0));
    }

    #[test]
    fn huge_page_numbers_do_not_overflow() {
        let (page, page_size, offset) = Pagination::new(i64::MAX, 20).normalize();
        assert_eq!(page, MAX_PAGE);
        assert_eq!(page_size, 20);
        assert_eq!(offset, (MAX_PAGE - 1) * 20);

        let (_, _, offset) = Pagination::new(i64::MAX, i64::MAX).normalize();
        assert_eq!(offset, (MAX_PAGE - 1) * 100);
    }

    #[test]
    fn featured_limit_is_clamped() {
        assert_eq!(FeaturedQuery::default().limit(), 10);
        assert_eq!(FeaturedQuery { limit: Some(99) }.limit(), 50);
        assert_eq!(FeaturedQuery { limit: Some(0) }.limit(), 1);
    }

    #[test]
    fn list_queries_expose_their_paging() {
        let query = ProductQuery {
            page: Some(2),
            page_size: Some(10),
            ..Default::default()
        };
        assert_eq!(query.pagination().normalize(), (2, 10, 10));
    }
}
