use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    cart::CartStore,
    error::{StorefrontError, StorefrontResult},
    store::{LocalStore, ORDERS_KEY},
};
use crate::{
    models::{OrderStatus, PaymentStatus, ShippingAddress},
    pricing,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalOrderItem {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub total_price: i64,
    pub image_url: Option<String>,
}

/// An order placed from the local cart without a round trip to the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalOrder {
    pub id: String,
    pub order_number: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: String,
    pub items: Vec<LocalOrderItem>,
    pub subtotal: i64,
    pub tax: i64,
    pub shipping: i64,
    pub total: i64,
    pub shipping_address: ShippingAddress,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct OrderState {
    orders: Vec<LocalOrder>,
}

/// Locally placed orders, newest first.
#[derive(Debug)]
pub struct OrderHistory {
    store: LocalStore,
    state: OrderState,
}

impl OrderHistory {
    pub fn load(store: LocalStore) -> Self {
        let state = store.load(ORDERS_KEY).unwrap_or_default();
        Self { store, state }
    }

    pub fn add_order(&mut self, order: LocalOrder) -> StorefrontResult<()> {
        self.state.orders.insert(0, order);
        self.store.save(ORDERS_KEY, &self.state)
    }

    pub fn orders(&self) -> &[LocalOrder] {
        &self.state.orders
    }

    pub fn order_by_id(&self, id: &str) -> Option<&LocalOrder> {
        self.state
            .orders
            .iter()
            .find(|o| o.id == id || o.order_number == id)
    }

    /// Turns the cart into a confirmed order, records it and empties the cart.
    pub fn place_order(
        &mut self,
        cart: &mut CartStore,
        shipping_address: ShippingAddress,
        payment_method: &str,
    ) -> StorefrontResult<LocalOrder> {
        if cart.is_empty() {
            return Err(StorefrontError::EmptyCart);
        }
        if let Some(line) = cart.items().iter().find(|line| line.quantity <= 0) {
            return Err(StorefrontError::InvalidQuantity {
                product_id: line.product.id.clone(),
                quantity: line.quantity,
            });
        }

        let totals = cart.totals();
        let items = cart
            .items()
            .iter()
            .map(|line| LocalOrderItem {
                product_id: line.product.id.clone(),
                product_name: line.product.name.clone(),
                quantity: line.quantity,
                unit_price: line.product.selling_price,
                total_price: line.line_total(),
                image_url: line.product.image_url().map(str::to_string),
            })
            .collect();

        let payment_status = if payment_method.eq_ignore_ascii_case("cod") {
            PaymentStatus::Cod
        } else {
            PaymentStatus::Pending
        };

        let now = Utc::now();
        let order = LocalOrder {
            id: uuid::Uuid::new_v4().to_string(),
            order_number: pricing::generate_order_number(now),
            status: OrderStatus::Confirmed,
            payment_status,
            payment_method: payment_method.to_lowercase(),
            items,
            subtotal: totals.subtotal,
            tax: totals.tax_amount,
            shipping: totals.shipping_amount,
            total: totals.total_amount,
            shipping_address,
            created_at: now,
        };

        self.add_order(order.clone())?;
        cart.clear()?;
        tracing::info!(order_number = %order.order_number, total = order.total, "local order placed");
        Ok(order)
    }
}
