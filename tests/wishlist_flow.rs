mod common;

use pranjay_storefront::{
    dto::{cart::AddToCartRequest, wishlist::AddToWishlistRequest},
    error::AppError,
    models::UserRole,
    services::{cart_service, wishlist_service},
};

#[tokio::test]
async fn wishlist_holds_each_product_once() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let state = common::setup_state(&url).await?;
    let shopper = common::create_user(&state, UserRole::Customer).await?;
    let product = common::create_product(&state, 349_00, 4).await?;

    let request = || AddToWishlistRequest {
        product_id: product.id,
    };
    wishlist_service::add_item(&state, &shopper, request()).await?;
    let duplicate = wishlist_service::add_item(&state, &shopper, request()).await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))), "got {duplicate:?}");

    let listed = wishlist_service::list_wishlist(&state, &shopper)
        .await?
        .data
        .expect("wishlist");
    assert_eq!(listed.items.len(), 1);
    assert_eq!(listed.items[0].product_id, product.id);
    assert_eq!(listed.items[0].selling_price, 349_00);
    assert!(listed.items[0].is_in_stock);

    // Another account may save the same product.
    let other = common::create_user(&state, UserRole::Customer).await?;
    wishlist_service::add_item(&state, &other, request()).await?;

    let removed = wishlist_service::remove_item(&state, &shopper, listed.items[0].id).await?;
    assert!(removed.data.is_some());
    let gone = wishlist_service::remove_item(&state, &shopper, listed.items[0].id).await;
    assert!(matches!(gone, Err(AppError::NotFound(_))));

    Ok(())
}

#[tokio::test]
async fn move_to_cart_adds_one_unit_and_drops_the_entry() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let state = common::setup_state(&url).await?;
    let shopper = common::create_user(&state, UserRole::Customer).await?;
    let serum = common::create_product(&state, 599_00, 10).await?;
    let cream = common::create_product(&state, 299_00, 10).await?;

    cart_service::add_item(
        &state,
        &shopper,
        AddToCartRequest {
            product_id: serum.id,
            quantity: 2,
        },
    )
    .await?;
    for product_id in [serum.id, cream.id] {
        wishlist_service::add_item(&state, &shopper, AddToWishlistRequest { product_id }).await?;
    }

    let saved = wishlist_service::list_wishlist(&state, &shopper)
        .await?
        .data
        .expect("wishlist");
    assert_eq!(saved.items.len(), 2);

    for item in &saved.items {
        wishlist_service::move_to_cart(&state, &shopper, item.id).await?;
    }

    let cart = cart_service::get_cart(&state, &shopper).await?.data.expect("cart");
    let quantity_of = |id: uuid::Uuid| {
        cart.items
            .iter()
            .find(|line| line.product_id == id)
            .map(|line| line.quantity)
    };
    assert_eq!(quantity_of(serum.id), Some(3));
    assert_eq!(quantity_of(cream.id), Some(1));
    assert_eq!(cart.items_count, 4);

    let saved = wishlist_service::list_wishlist(&state, &shopper)
        .await?
        .data
        .expect("wishlist");
    assert!(saved.items.is_empty());

    let again = wishlist_service::move_to_cart(&state, &shopper, cart.items[0].id).await;
    assert!(matches!(again, Err(AppError::NotFound(_))));

    Ok(())
}
