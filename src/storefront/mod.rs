//! Client-side storefront: persisted local state, the HTTP client for the
//! API, and a static catalog used when the API cannot be reached.

pub mod cart;
pub mod catalog;
pub mod client;
pub mod error;
pub mod orders;
pub mod product;
pub mod session;
pub mod store;
pub mod wishlist;

pub use cart::{CartLine, CartStore};
pub use catalog::CatalogSource;
pub use client::ApiClient;
pub use error::{StorefrontError, StorefrontResult};
pub use orders::{LocalOrder, OrderHistory};
pub use product::Product;
pub use session::{Session, SessionStore};
pub use store::LocalStore;
pub use wishlist::WishlistStore;
