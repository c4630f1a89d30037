use pranjay_storefront::{
    models::{OrderStatus, PaymentStatus, ShippingAddress},
    storefront::{
        CartStore, LocalStore, OrderHistory, SessionStore, StorefrontError, WishlistStore, catalog,
        store::CART_KEY,
    },
};

fn address() -> ShippingAddress {
    ShippingAddress {
        full_name: "Asha Rao".into(),
        phone: "9876543210".into(),
        address_line1: "12 MG Road".into(),
        address_line2: None,
        city: "Bengaluru".into(),
        state: "Karnataka".into(),
        postal_code: "560001".into(),
        country: "India".into(),
    }
}

#[test]
fn cart_merges_lines_and_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::open(dir.path()).unwrap();
    let lipstick = catalog::by_id("1").unwrap();
    let mist = catalog::by_id("8").unwrap();

    let mut cart = CartStore::load(store.clone());
    cart.add_item(lipstick.clone(), 2).unwrap();
    cart.add_item(lipstick, 3).unwrap();
    cart.add_item(mist, 1).unwrap();
    assert_eq!(cart.items().len(), 2);
    assert_eq!(cart.item_count(), 6);

    let cart = CartStore::load(store);
    assert_eq!(cart.items()[0].quantity, 5);
    // 5 x 449.00 + 249.00
    assert_eq!(cart.subtotal(), 2494_00);
    assert_eq!(cart.tax(), 448_92);
    assert_eq!(cart.total(), 2942_92);
    assert_eq!(cart.totals().total_amount, cart.total());
}

#[test]
fn zero_quantity_removes_the_line() {
    let dir = tempfile::tempdir().unwrap();
    let mut cart = CartStore::load(LocalStore::open(dir.path()).unwrap());
    cart.add_item(catalog::by_id("2").unwrap(), 3).unwrap();
    cart.add_item(catalog::by_id("3").unwrap(), 2).unwrap();

    cart.update_quantity("2", 7).unwrap();
    assert_eq!(cart.items()[0].quantity, 7);

    cart.update_quantity("2", 0).unwrap();
    assert_eq!(cart.items().len(), 1);
    assert_eq!(cart.items()[0].id, "3");

    cart.clear().unwrap();
    assert!(cart.is_empty());
    assert_eq!(cart.total(), 0);
}

#[test]
fn non_positive_quantities_never_leave_a_line() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::open(dir.path()).unwrap();
    let mut cart = CartStore::load(store.clone());

    cart.add_item(catalog::by_id("1").unwrap(), -3).unwrap();
    cart.add_item(catalog::by_id("2").unwrap(), 0).unwrap();
    assert!(cart.is_empty());
    assert_eq!(cart.total(), 0);

    cart.add_item(catalog::by_id("3").unwrap(), 2).unwrap();
    cart.add_item(catalog::by_id("3").unwrap(), -1).unwrap();
    assert_eq!(cart.items()[0].quantity, 1);
    cart.add_item(catalog::by_id("3").unwrap(), -5).unwrap();
    assert!(cart.is_empty());

    let mut orders = OrderHistory::load(store.clone());
    let err = orders.place_order(&mut cart, address(), "cod").unwrap_err();
    assert!(matches!(err, StorefrontError::EmptyCart));
    assert!(orders.orders().is_empty());

    // A hand-edited cart file with a negative line loads without it.
    let product = serde_json::to_value(catalog::by_id("4").unwrap()).unwrap();
    let raw = serde_json::json!({
        "items": [
            { "id": "4", "product": product.clone(), "quantity": -2 },
            { "id": "4b", "product": product, "quantity": 1 },
        ]
    });
    store.save(CART_KEY, &raw).unwrap();
    let cart = CartStore::load(store);
    assert_eq!(cart.items().len(), 1);
    assert!(cart.total() > 0);
}

#[test]
fn wishlist_keeps_one_entry_per_product() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::open(dir.path()).unwrap();
    let mut wishlist = WishlistStore::load(store.clone());

    assert!(wishlist.add_item(catalog::by_id("4").unwrap()).unwrap());
    assert!(!wishlist.add_item(catalog::by_id("4").unwrap()).unwrap());
    assert!(wishlist.add_item(catalog::by_id("5").unwrap()).unwrap());

    let mut wishlist = WishlistStore::load(store);
    assert_eq!(wishlist.items().len(), 2);
    assert!(wishlist.contains("5"));
    wishlist.remove_item("4").unwrap();
    assert!(!wishlist.contains("4"));
}

#[test]
fn placing_an_order_empties_the_cart() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::open(dir.path()).unwrap();
    let mut cart = CartStore::load(store.clone());
    let mut history = OrderHistory::load(store.clone());

    let empty = history.place_order(&mut cart, address(), "cod");
    assert!(matches!(empty, Err(StorefrontError::EmptyCart)));

    cart.add_item(catalog::by_id("6").unwrap(), 10).unwrap();
    let first = history.place_order(&mut cart, address(), "COD").unwrap();
    assert_eq!(first.status, OrderStatus::Confirmed);
    assert_eq!(first.payment_status, PaymentStatus::Cod);
    assert_eq!(first.subtotal, 2990_00);
    assert_eq!(first.tax, 538_20);
    assert_eq!(first.total, 3528_20);
    assert_eq!(first.items[0].total_price, 2990_00);
    assert!(cart.is_empty());

    cart.add_item(catalog::by_id("7").unwrap(), 5).unwrap();
    let second = history.place_order(&mut cart, address(), "upi").unwrap();
    assert_eq!(second.payment_status, PaymentStatus::Pending);

    let history = OrderHistory::load(store);
    assert_eq!(history.orders().len(), 2);
    assert_eq!(history.orders()[0].id, second.id);
    assert_eq!(
        history.order_by_id(&first.order_number).map(|o| o.id.as_str()),
        Some(first.id.as_str())
    );
    assert!(history.order_by_id("missing").is_none());
}

#[test]
fn logout_clears_the_persisted_session() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::open(dir.path()).unwrap();
    let mut session = SessionStore::load(store.clone());
    assert!(!session.is_authenticated());

    session
        .set_tokens(&pranjay_storefront::dto::auth::TokenPair {
            access_token: "access".into(),
            refresh_token: "refresh".into(),
            token_type: "bearer".into(),
            expires_in: 1800,
        })
        .unwrap();
    let reloaded = SessionStore::load(store.clone());
    assert_eq!(reloaded.access_token(), Some("access"));
    assert_eq!(reloaded.refresh_token(), Some("refresh"));

    session.logout().unwrap();
    let reloaded = SessionStore::load(store);
    assert!(!reloaded.is_authenticated());
    assert_eq!(reloaded.access_token(), None);
}
