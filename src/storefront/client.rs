use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

use super::{
    error::{StorefrontError, StorefrontResult},
    product::Product,
    session::SessionStore,
};
use crate::{
    dto::{
        auth::{LoginResponse, RefreshRequest, RequestOtpRequest, RequestOtpResponse, TokenPair, VerifyOtpRequest},
        cart::{AddToCartRequest, UpdateCartItemRequest},
        orders::CheckoutRequest,
        wishlist::AddToWishlistRequest,
    },
    models::{Brand, Cart, CartItem, Category, Order, OrderSummary, User, WishlistItem},
    response::{ApiResponse, Meta},
    routes::params::{FeaturedQuery, OrderListQuery, ProductQuery},
};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
const API_PREFIX: &str = "/api/v1";

/// Typed client for the `/api/v1` surface.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> StorefrontResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: None,
        })
    }

    /// `PRANJAY_API_URL`, else `http://localhost:8000`.
    pub fn from_env() -> StorefrontResult<Self> {
        let url = std::env::var("PRANJAY_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Self::new(url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.access_token = token;
        self
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.access_token = token;
    }

    fn url(&self, path: &str) -> String {
        format!("{}{API_PREFIX}{path}", self.base_url)
    }

    async fn request<T, B, Q>(
        &self,
        method: Method,
        path: &str,
        query: Option<&Q>,
        body: Option<&B>,
    ) -> StorefrontResult<(T, Option<Meta>)>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
        Q: Serialize + ?Sized,
    {
        let mut builder = self.http.request(method, self.url(path));
        if let Some(token) = &self.access_token {
            builder = builder.bearer_auth(token);
        }
        if let Some(query) = query {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            return Err(parse_error(status, &bytes));
        }
        if status == StatusCode::NO_CONTENT || bytes.is_empty() {
            return Ok((serde_json::from_value(serde_json::Value::Null)?, None));
        }

        let envelope: ApiResponse<serde_json::Value> = serde_json::from_slice(&bytes)?;
        let data = serde_json::from_value(envelope.data.unwrap_or(serde_json::Value::Null))?;
        Ok((data, envelope.meta))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> StorefrontResult<T> {
        self.request::<T, (), ()>(Method::GET, path, None, None)
            .await
            .map(|(data, _)| data)
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> StorefrontResult<T> {
        self.request::<T, B, ()>(Method::POST, path, None, Some(body))
            .await
            .map(|(data, _)| data)
    }

    async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> StorefrontResult<T> {
        self.request::<T, B, ()>(Method::PATCH, path, None, Some(body))
            .await
            .map(|(data, _)| data)
    }

    async fn delete(&self, path: &str) -> StorefrontResult<()> {
        self.request::<serde_json::Value, (), ()>(Method::DELETE, path, None, None)
            .await
            .map(|_| ())
    }

    pub async fn request_otp(&self, email: &str) -> StorefrontResult<RequestOtpResponse> {
        self.post("/auth/request-otp", &RequestOtpRequest { email: email.to_string() })
            .await
    }

    pub async fn verify_otp(&self, email: &str, otp: &str) -> StorefrontResult<LoginResponse> {
        let body = VerifyOtpRequest {
            email: email.to_string(),
            otp: otp.to_string(),
        };
        self.post("/auth/verify-otp", &body).await
    }

    pub async fn refresh(&self, refresh_token: &str) -> StorefrontResult<TokenPair> {
        let body = RefreshRequest {
            refresh_token: refresh_token.to_string(),
        };
        self.post("/auth/refresh", &body).await
    }

    /// Swaps the stored refresh token for a new pair. Returns `false` without
    /// touching the session when no refresh token is stored; a rejected
    /// refresh signs the session out.
    pub async fn refresh_tokens(&mut self, session: &mut SessionStore) -> StorefrontResult<bool> {
        let Some(refresh_token) = session.refresh_token().map(str::to_string) else {
            return Ok(false);
        };
        match self.refresh(&refresh_token).await {
            Ok(tokens) => {
                session.set_tokens(&tokens)?;
                self.access_token = Some(tokens.access_token);
                Ok(true)
            }
            Err(err) => {
                tracing::warn!(error = %err, "token refresh failed, signing out");
                session.logout()?;
                self.access_token = None;
                Ok(false)
            }
        }
    }

    pub async fn me(&self) -> StorefrontResult<User> {
        self.get("/users/me").await
    }

    pub async fn list_products(
        &self,
        query: &ProductQuery,
    ) -> StorefrontResult<(Vec<Product>, Option<Meta>)> {
        self.request::<_, (), _>(Method::GET, "/products", Some(query), None)
            .await
    }

    pub async fn featured_products(&self, limit: Option<u64>) -> StorefrontResult<Vec<Product>> {
        let query = FeaturedQuery { limit };
        self.request::<_, (), _>(Method::GET, "/products/featured", Some(&query), None)
            .await
            .map(|(data, _)| data)
    }

    pub async fn product_by_slug(&self, slug: &str) -> StorefrontResult<Product> {
        self.get(&product_path(slug)).await
    }

    pub async fn categories(&self) -> StorefrontResult<Vec<Category>> {
        self.get("/categories").await
    }

    pub async fn brands(&self) -> StorefrontResult<Vec<Brand>> {
        self.get("/brands").await
    }

    pub async fn cart(&self) -> StorefrontResult<Cart> {
        self.get("/cart").await
    }

    pub async fn add_to_cart(&self, product_id: Uuid, quantity: i32) -> StorefrontResult<CartItem> {
        self.post("/cart/items", &AddToCartRequest { product_id, quantity })
            .await
    }

    pub async fn update_cart_item(&self, id: Uuid, quantity: i32) -> StorefrontResult<CartItem> {
        self.patch(&format!("/cart/items/{id}"), &UpdateCartItemRequest { quantity })
            .await
    }

    pub async fn remove_cart_item(&self, id: Uuid) -> StorefrontResult<()> {
        self.delete(&format!("/cart/items/{id}")).await
    }

    pub async fn clear_cart(&self) -> StorefrontResult<()> {
        self.delete("/cart").await
    }

    pub async fn wishlist(&self) -> StorefrontResult<Vec<WishlistItem>> {
        self.get("/wishlist").await
    }

    pub async fn add_to_wishlist(&self, product_id: Uuid) -> StorefrontResult<serde_json::Value> {
        self.post("/wishlist", &AddToWishlistRequest { product_id }).await
    }

    pub async fn remove_from_wishlist(&self, id: Uuid) -> StorefrontResult<()> {
        self.delete(&format!("/wishlist/{id}")).await
    }

    pub async fn move_to_cart(&self, id: Uuid) -> StorefrontResult<serde_json::Value> {
        self.post(&format!("/wishlist/{id}/move-to-cart"), &serde_json::json!({}))
            .await
    }

    pub async fn checkout(&self, request: &CheckoutRequest) -> StorefrontResult<Order> {
        self.post("/checkout", request).await
    }

    pub async fn orders(
        &self,
        query: &OrderListQuery,
    ) -> StorefrontResult<(Vec<OrderSummary>, Option<Meta>)> {
        self.request::<_, (), _>(Method::GET, "/orders", Some(query), None)
            .await
    }

    pub async fn order(&self, id: Uuid) -> StorefrontResult<Order> {
        self.get(&format!("/orders/{id}")).await
    }

    pub async fn cancel_order(&self, id: Uuid) -> StorefrontResult<Order> {
        self.post(&format!("/orders/{id}/cancel"), &serde_json::json!({}))
            .await
    }
}

/// Pulls the envelope's `message`, falling back to the raw body.
fn parse_error(status: StatusCode, body: &[u8]) -> StorefrontError {
    let message = serde_json::from_slice::<ApiResponse<serde_json::Value>>(body)
        .map(|envelope| envelope.message)
        .unwrap_or_else(|_| {
            let text = String::from_utf8_lossy(body).trim().to_string();
            if text.is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                text
            }
        });
    StorefrontError::Api {
        status: status.as_u16(),
        message,
    }
}

fn product_path(slug: &str) -> String {
    format!("/products/{}", urlencoding::encode(slug))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_comes_from_envelope() {
        let body = br#"{"message":"Cart is empty","data":{"error":"Cart is empty"},"meta":null}"#;
        let err = parse_error(StatusCode::BAD_REQUEST, body);
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.to_string(), "API error (400): Cart is empty");
    }

    #[test]
    fn error_without_body_uses_reason_phrase() {
        let err = parse_error(StatusCode::UNAUTHORIZED, b"");
        assert_eq!(err.to_string(), "API error (401): Unauthorized");
    }

    #[test]
    fn slugs_are_encoded_as_one_segment() {
        assert_eq!(product_path("velvet-matte-lipstick"), "/products/velvet-matte-lipstick");
        assert_eq!(product_path("a/b?c#d"), "/products/a%2Fb%3Fc%23d");
        assert_eq!(product_path("rose gold"), "/products/rose%20gold");
    }

    #[test]
    fn base_url_drops_trailing_slash() {
        let client = ApiClient::new("http://localhost:8000/").unwrap();
        assert_eq!(client.url("/products"), "http://localhost:8000/api/v1/products");
    }
}
