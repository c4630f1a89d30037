use serde::{Deserialize, Serialize};

use super::{
    error::StorefrontResult,
    product::Product,
    store::{CART_KEY, LocalStore},
};
use crate::pricing::{self, CartTotals};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    /// Same as the product id; one line per product.
    pub id: String,
    pub product: Product,
    pub quantity: i32,
}

impl CartLine {
    pub fn line_total(&self) -> i64 {
        pricing::line_total(self.product.selling_price, self.quantity)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CartState {
    items: Vec<CartLine>,
}

/// The local cart. Every mutation is written through to the store.
#[derive(Debug)]
pub struct CartStore {
    store: LocalStore,
    state: CartState,
}

impl CartStore {
    pub fn load(store: LocalStore) -> Self {
        let mut state: CartState = store.load(CART_KEY).unwrap_or_default();
        state.items.retain(|line| line.quantity > 0);
        Self { store, state }
    }

    fn persist(&self) -> StorefrontResult<()> {
        self.store.save(CART_KEY, &self.state)
    }

    pub fn items(&self) -> &[CartLine] {
        &self.state.items
    }

    pub fn is_empty(&self) -> bool {
        self.state.items.is_empty()
    }

    /// Adds `quantity` units, merging into an existing line. A new line
    /// needs a positive quantity; a merge that leaves zero or less removes
    /// the line.
    pub fn add_item(&mut self, product: Product, quantity: i32) -> StorefrontResult<()> {
        match self
            .state
            .items
            .iter()
            .position(|line| line.product.id == product.id)
        {
            Some(index) => {
                let merged = self.state.items[index].quantity.saturating_add(quantity);
                if merged <= 0 {
                    self.state.items.remove(index);
                } else {
                    self.state.items[index].quantity = merged;
                }
            }
            None if quantity <= 0 => return Ok(()),
            None => self.state.items.push(CartLine {
                id: product.id.clone(),
                product,
                quantity,
            }),
        }
        self.persist()
    }

    pub fn remove_item(&mut self, product_id: &str) -> StorefrontResult<()> {
        self.state.items.retain(|line| line.product.id != product_id);
        self.persist()
    }

    /// Sets a line's quantity; zero or less removes the line.
    pub fn update_quantity(&mut self, product_id: &str, quantity: i32) -> StorefrontResult<()> {
        if quantity <= 0 {
            return self.remove_item(product_id);
        }
        if let Some(line) = self
            .state
            .items
            .iter_mut()
            .find(|line| line.product.id == product_id)
        {
            line.quantity = quantity;
        }
        self.persist()
    }

    pub fn clear(&mut self) -> StorefrontResult<()> {
        self.state.items.clear();
        self.persist()
    }

    pub fn item_count(&self) -> i64 {
        self.state.items.iter().map(|l| i64::from(l.quantity)).sum()
    }

    pub fn subtotal(&self) -> i64 {
        pricing::subtotal(
            self.state
                .items
                .iter()
                .map(|l| (l.product.selling_price, l.quantity)),
        )
    }

    pub fn tax(&self) -> i64 {
        pricing::gst(self.subtotal())
    }

    pub fn total(&self) -> i64 {
        self.subtotal() + self.tax()
    }

    pub fn totals(&self) -> CartTotals {
        CartTotals::from_lines(
            self.state
                .items
                .iter()
                .map(|l| (l.product.selling_price, l.quantity)),
        )
    }
}
