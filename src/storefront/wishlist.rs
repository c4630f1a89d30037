use serde::{Deserialize, Serialize};

use super::{
    error::StorefrontResult,
    product::Product,
    store::{LocalStore, WISHLIST_KEY},
};

#[derive(Debug, Default, Serialize, Deserialize)]
struct WishlistState {
    items: Vec<Product>,
}

/// Saved products, at most one entry per product id.
#[derive(Debug)]
pub struct WishlistStore {
    store: LocalStore,
    state: WishlistState,
}

impl WishlistStore {
    pub fn load(store: LocalStore) -> Self {
        let mut state: WishlistState = store.load(WISHLIST_KEY).unwrap_or_default();
        let mut seen = std::collections::HashSet::new();
        state.items.retain(|p| seen.insert(p.id.clone()));
        Self { store, state }
    }

    pub fn items(&self) -> &[Product] {
        &self.state.items
    }

    pub fn contains(&self, product_id: &str) -> bool {
        self.state.items.iter().any(|p| p.id == product_id)
    }

    /// Returns `false` when the product was already saved.
    pub fn add_item(&mut self, product: Product) -> StorefrontResult<bool> {
        if self.contains(&product.id) {
            return Ok(false);
        }
        self.state.items.push(product);
        self.store.save(WISHLIST_KEY, &self.state)?;
        Ok(true)
    }

    pub fn remove_item(&mut self, product_id: &str) -> StorefrontResult<()> {
        self.state.items.retain(|p| p.id != product_id);
        self.store.save(WISHLIST_KEY, &self.state)
    }

    pub fn clear(&mut self) -> StorefrontResult<()> {
        self.state.items.clear();
        self.store.save(WISHLIST_KEY, &self.state)
    }
}
