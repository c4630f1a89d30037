use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        admin::{
            AdminProductList, DashboardStats, RecentOrder, StockLevel, UpdateOrderStatusRequest,
            UpdatePaymentStatusRequest, UpdateUserRoleRequest, UserList,
        },
        auth::{
            LoginResponse, RefreshRequest, RequestOtpRequest, RequestOtpResponse, TokenPair,
            VerifyOtpRequest,
        },
        cart::{AddToCartRequest, UpdateCartItemRequest},
        orders::{CheckoutRequest, OrderList},
        products::{
            AddImageRequest, AdjustStockRequest, BrandList, CategoryList, CategoryTree,
            CreateProductRequest, ProductList, UpdateProductRequest,
        },
        users::{AddressList, CreateAddressRequest, UpdateAddressRequest, UpdateProfileRequest},
        wishlist::{AddToWishlistRequest, WishlistList},
    },
    models::{
        Address, Brand, Cart, CartItem, Category, CategoryWithChildren, Order, OrderItem,
        OrderStatus, OrderSummary, PaymentStatus, Product, ProductImage, ProductSummary,
        ShippingAddress, User, UserRole, UserType, WishlistItem,
    },
    response::{ApiResponse, Meta},
    routes::{admin, auth, cart, categories, health, orders, products, users, wishlist},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Pranjay Storefront API", description = "Cosmetics catalog, cart, wishlist, checkout and orders"),
    paths(
        health::health_check,
        auth::request_otp,
        auth::verify_otp,
        auth::refresh,
        users::get_me,
        users::update_me,
        users::list_addresses,
        users::create_address,
        users::update_address,
        users::delete_address,
        products::list_products,
        products::featured_products,
        products::get_product,
        categories::list_categories,
        categories::category_tree,
        categories::get_category,
        categories::list_brands,
        cart::get_cart,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_from_cart,
        cart::clear_cart,
        wishlist::list_wishlist,
        wishlist::add_to_wishlist,
        wishlist::remove_from_wishlist,
        wishlist::move_to_cart,
        orders::checkout,
        orders::list_orders,
        orders::get_order,
        orders::cancel_order,
        admin::dashboard,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::update_payment_status,
        admin::cancel_order_admin,
        admin::list_products,
        admin::create_product,
        admin::list_low_stock,
        admin::update_product,
        admin::delete_product,
        admin::add_image,
        admin::remove_image,
        admin::adjust_stock,
        admin::list_users,
        admin::get_user,
        admin::set_user_role,
        admin::deactivate_user,
        admin::reactivate_user
    ),
    components(
        schemas(
            User,
            UserType,
            UserRole,
            Address,
            ShippingAddress,
            Category,
            CategoryWithChildren,
            Brand,
            Product,
            ProductImage,
            ProductSummary,
            Cart,
            CartItem,
            WishlistItem,
            Order,
            OrderItem,
            OrderSummary,
            OrderStatus,
            PaymentStatus,
            RequestOtpRequest,
            RequestOtpResponse,
            VerifyOtpRequest,
            RefreshRequest,
            TokenPair,
            LoginResponse,
            UpdateProfileRequest,
            CreateAddressRequest,
            UpdateAddressRequest,
            AddressList,
            ProductList,
            CategoryList,
            CategoryTree,
            BrandList,
            AddToCartRequest,
            UpdateCartItemRequest,
            AddToWishlistRequest,
            WishlistList,
            CheckoutRequest,
            OrderList,
            CreateProductRequest,
            UpdateProductRequest,
            AddImageRequest,
            AdjustStockRequest,
            UpdateOrderStatusRequest,
            UpdatePaymentStatusRequest,
            AdminProductList,
            DashboardStats,
            RecentOrder,
            StockLevel,
            UpdateUserRoleRequest,
            UserList,
            health::HealthData,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<Cart>,
            ApiResponse<Order>,
            ApiResponse<OrderList>,
            ApiResponse<LoginResponse>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "OTP login and token refresh"),
        (name = "Users", description = "Profile and saved addresses"),
        (name = "Products", description = "Product catalog"),
        (name = "Catalog", description = "Categories and brands"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Wishlist", description = "Wishlist endpoints"),
        (name = "Orders", description = "Checkout and order history"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_versioned_paths() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        assert!(paths.iter().any(|p| p.as_str() == "/api/v1/checkout"));
        assert!(paths.iter().any(|p| p.as_str() == "/api/v1/wishlist/{id}/move-to-cart"));
        assert!(paths.iter().any(|p| p.as_str() == "/health"));
        assert!(paths.iter().any(|p| p.as_str() == "/api/v1/admin/users/{id}/deactivate"));
    }
}
