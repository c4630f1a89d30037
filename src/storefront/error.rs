use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorefrontError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: String, quantity: i32 },

    #[error("Not signed in")]
    NotAuthenticated,
}

impl StorefrontError {
    pub fn status(&self) -> Option<u16> {
        match self {
            StorefrontError::Api { status, .. } => Some(*status),
            StorefrontError::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type StorefrontResult<T> = Result<T, StorefrontError>;
