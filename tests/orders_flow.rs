mod common;

use pranjay_storefront::{
    dto::{
        admin::{UpdateOrderStatusRequest, UpdatePaymentStatusRequest},
        cart::AddToCartRequest,
        orders::CheckoutRequest,
        products::AdjustStockRequest,
    },
    entity::Products,
    error::AppError,
    middleware::auth::AuthUser,
    models::{Order, OrderStatus, PaymentStatus, UserRole},
    routes::params::{LowStockQuery, OrderListQuery},
    services::{admin_service, cart_service, order_service},
    state::AppState,
};
use sea_orm::EntityTrait;
use uuid::Uuid;

// Customer adds to cart, checks out and cancels; stock follows each step.
#[tokio::test]
async fn checkout_then_cancel_restores_stock() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let state = common::setup_state(&url).await?;
    let buyer = common::create_user(&state, UserRole::Customer).await?;
    let address_id = common::create_address(&state, &buyer).await?;
    let product = common::create_product(&state, 449_00, 10).await?;

    cart_service::add_item(
        &state,
        &buyer,
        AddToCartRequest {
            product_id: product.id,
            quantity: 2,
        },
    )
    .await?;

    let order = order_service::checkout(
        &state,
        &buyer,
        CheckoutRequest {
            shipping_address_id: address_id,
            payment_method: Some("cod".into()),
            notes: None,
        },
    )
    .await?
    .data
    .expect("order");

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert_eq!(order.subtotal, 898_00);
    assert_eq!(order.tax_amount, 161_64);
    assert_eq!(order.total_amount, 1059_64);
    assert_eq!(order.items.len(), 1);
    assert!(order.order_number.starts_with("PRJ-"));
    assert_eq!(
        order.shipping_address.as_ref().map(|a| a.city.as_str()),
        Some("Bengaluru")
    );

    let stock = Products::find_by_id(product.id).one(&state.orm).await?.expect("product");
    assert_eq!(stock.stock_quantity, 8);

    let cart = cart_service::get_cart(&state, &buyer).await?.data.expect("cart");
    assert!(cart.items.is_empty());

    let listed = order_service::list_orders(&state, &buyer, OrderListQuery::default())
        .await?
        .data
        .expect("orders");
    assert_eq!(listed.items.len(), 1);
    assert_eq!(listed.items[0].items_count, 1);

    let cancelled = order_service::cancel_order(&state, &buyer, order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    let stock = Products::find_by_id(product.id).one(&state.orm).await?.expect("product");
    assert_eq!(stock.stock_quantity, 10);

    let again = order_service::cancel_order(&state, &buyer, order.id).await;
    assert!(matches!(again, Err(AppError::BadRequest(msg)) if msg.contains("cancelled")));

    Ok(())
}

#[tokio::test]
async fn checkout_rejects_empty_cart_and_short_stock() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let state = common::setup_state(&url).await?;
    let buyer = common::create_user(&state, UserRole::Customer).await?;
    let admin = common::create_user(&state, UserRole::Admin).await?;
    let address_id = common::create_address(&state, &buyer).await?;
    let product = common::create_product(&state, 299_00, 5).await?;

    let request = || CheckoutRequest {
        shipping_address_id: address_id,
        payment_method: None,
        notes: None,
    };

    let empty = order_service::checkout(&state, &buyer, request()).await;
    assert!(matches!(empty, Err(AppError::BadRequest(msg)) if msg == "Cart is empty"));

    cart_service::add_item(
        &state,
        &buyer,
        AddToCartRequest {
            product_id: product.id,
            quantity: 4,
        },
    )
    .await?;

    admin_service::adjust_stock(
        &state,
        &admin,
        product.id,
        AdjustStockRequest {
            adjustment: -3,
            reason: Some("damaged in transit".into()),
        },
    )
    .await?;

    let short = order_service::checkout(&state, &buyer, request()).await;
    assert!(
        matches!(short, Err(AppError::BadRequest(ref msg)) if msg.starts_with("Insufficient stock for product")),
        "got {short:?}"
    );

    // Nothing was written: the cart still holds the line and stock is untouched.
    let cart = cart_service::get_cart(&state, &buyer).await?.data.expect("cart");
    assert_eq!(cart.items_count, 4);
    let stock = Products::find_by_id(product.id).one(&state.orm).await?.expect("product");
    assert_eq!(stock.stock_quantity, 2);

    Ok(())
}

#[tokio::test]
async fn admin_moves_order_through_fulfilment() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let state = common::setup_state(&url).await?;
    let buyer = common::create_user(&state, UserRole::Customer).await?;
    let admin = common::create_user(&state, UserRole::Admin).await?;
    let address_id = common::create_address(&state, &buyer).await?;
    let product = common::create_product(&state, 999_00, 6).await?;

    cart_service::add_item(
        &state,
        &buyer,
        AddToCartRequest {
            product_id: product.id,
            quantity: 3,
        },
    )
    .await?;
    let order = order_service::checkout(
        &state,
        &buyer,
        CheckoutRequest {
            shipping_address_id: address_id,
            payment_method: Some("upi".into()),
            notes: Some("Leave at reception".into()),
        },
    )
    .await?
    .data
    .expect("order");

    let forbidden = admin_service::update_payment_status(
        &state,
        &buyer,
        order.id,
        UpdatePaymentStatusRequest {
            payment_status: PaymentStatus::Paid,
        },
    )
    .await;
    assert!(matches!(forbidden, Err(AppError::Forbidden(_))));

    let paid = admin_service::update_payment_status(
        &state,
        &admin,
        order.id,
        UpdatePaymentStatusRequest {
            payment_status: PaymentStatus::Paid,
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(paid.payment_status, PaymentStatus::Paid);
    assert_eq!(paid.status, OrderStatus::Confirmed);

    let shipped = admin_service::update_order_status(
        &state,
        &admin,
        order.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Shipped,
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(shipped.status, OrderStatus::Shipped);
    assert!(shipped.shipped_at.is_some());

    let late_cancel = order_service::cancel_order(&state, &buyer, order.id).await;
    assert!(matches!(late_cancel, Err(AppError::BadRequest(_))));

    let low = admin_service::list_low_stock(&state, &admin, LowStockQuery { threshold: Some(5) })
        .await?
        .data
        .expect("products");
    assert!(low.items.iter().any(|p| p.id == product.id));

    Ok(())
}

async fn checkout_units(
    state: &AppState,
    buyer: &AuthUser,
    product_id: Uuid,
    address_id: Uuid,
    quantity: i32,
) -> anyhow::Result<Order> {
    cart_service::add_item(state, buyer, AddToCartRequest { product_id, quantity }).await?;
    let order = order_service::checkout(
        state,
        buyer,
        CheckoutRequest {
            shipping_address_id: address_id,
            payment_method: Some("cod".into()),
            notes: None,
        },
    )
    .await?
    .data
    .ok_or_else(|| anyhow::anyhow!("order missing"))?;
    Ok(order)
}

async fn set_status(
    state: &AppState,
    admin: &AuthUser,
    id: Uuid,
    status: OrderStatus,
) -> Result<Order, AppError> {
    let resp = admin_service::update_order_status(state, admin, id, UpdateOrderStatusRequest { status })
        .await?;
    Ok(resp.data.expect("order"))
}

// Once cancelled or delivered, an order's status is fixed.
#[tokio::test]
async fn closed_orders_reject_status_changes() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let state = common::setup_state(&url).await?;
    let buyer = common::create_user(&state, UserRole::Customer).await?;
    let admin = common::create_user(&state, UserRole::Admin).await?;
    let address_id = common::create_address(&state, &buyer).await?;
    let product = common::create_product(&state, 199_00, 5).await?;

    let order = checkout_units(&state, &buyer, product.id, address_id, 5).await?;
    order_service::cancel_order(&state, &buyer, order.id).await?;
    let stock = Products::find_by_id(product.id).one(&state.orm).await?.expect("product");
    assert_eq!(stock.stock_quantity, 5);

    let reopened = set_status(&state, &admin, order.id, OrderStatus::Shipped).await;
    assert!(
        matches!(reopened, Err(AppError::BadRequest(ref msg)) if msg.contains("cancelled")),
        "got {reopened:?}"
    );
    assert!(set_status(&state, &admin, order.id, OrderStatus::Delivered).await.is_err());

    let after = admin_service::get_order_admin(&state, &admin, order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(after.status, OrderStatus::Cancelled);
    assert!(after.shipped_at.is_none());
    let stock = Products::find_by_id(product.id).one(&state.orm).await?.expect("product");
    assert_eq!(stock.stock_quantity, 5);

    let second = checkout_units(&state, &buyer, product.id, address_id, 2).await?;
    set_status(&state, &admin, second.id, OrderStatus::Shipped).await?;
    let delivered = set_status(&state, &admin, second.id, OrderStatus::Delivered).await?;
    assert!(delivered.delivered_at.is_some());
    let rewind = set_status(&state, &admin, second.id, OrderStatus::Processing).await;
    assert!(matches!(rewind, Err(AppError::BadRequest(_))));
    assert!(set_status(&state, &admin, second.id, OrderStatus::Cancelled).await.is_err());
    let stock = Products::find_by_id(product.id).one(&state.orm).await?.expect("product");
    assert_eq!(stock.stock_quantity, 3);

    Ok(())
}
