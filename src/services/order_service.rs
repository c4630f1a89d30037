use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use uuid::Uuid;

use crate::{
    audit,
    dto::orders::{CheckoutRequest, OrderList},
    entity::{
        cart_items::{Column as CartCol, Entity as CartItems},
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Column as ProdCol, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderStatus, OrderSummary, PaymentStatus, ShippingAddress},
    pricing::{self, CartTotals},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::user_service::find_owned_address,
    state::AppState,
};

pub async fn items_for<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
) -> AppResult<Vec<OrderItemModel>> {
    Ok(OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(conn)
        .await?)
}

/// Number of lines on each of `order_ids`.
pub async fn line_counts<C: ConnectionTrait>(
    conn: &C,
    order_ids: &[Uuid],
) -> AppResult<HashMap<Uuid, i64>> {
    if order_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = OrderItems::find()
        .filter(OrderItemCol::OrderId.is_in(order_ids.iter().copied()))
        .all(conn)
        .await?;
    let mut counts = HashMap::new();
    for row in rows {
        *counts.entry(row.order_id).or_insert(0) += 1;
    }
    Ok(counts)
}

pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<Order>> {
    let txn = state.orm.begin().await?;

    let address = find_owned_address(&txn, user.user_id, payload.shipping_address_id).await?;

    let lines = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .order_by_asc(CartCol::CreatedAt)
        .all(&txn)
        .await?;
    if lines.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    let product_ids: Vec<Uuid> = lines.iter().map(|l| l.product_id).collect();
    let products: HashMap<Uuid, ProductModel> = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .lock(LockType::Update)
        .all(&txn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let mut checked: Vec<(&ProductModel, i32)> = Vec::with_capacity(lines.len());
    for line in &lines {
        let product = products
            .get(&line.product_id)
            .filter(|p| p.is_active)
            .ok_or_else(|| {
                AppError::BadRequest(format!("Product {} is no longer available", line.product_id))
            })?;
        if product.stock_quantity < line.quantity {
            return Err(AppError::BadRequest(format!(
                "Insufficient stock for product: {}",
                product.name
            )));
        }
        checked.push((product, line.quantity));
    }

    let totals = CartTotals::from_lines(checked.iter().map(|(p, qty)| (p.selling_price, *qty)));
    let now = Utc::now();
    let shipping = serde_json::to_value(ShippingAddress::from(&address))
        .map_err(AppError::internal)?;

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(Some(user.user_id)),
        shipping_address_id: Set(Some(address.id)),
        order_number: Set(pricing::generate_order_number(now)),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        payment_status: Set(PaymentStatus::Pending.as_str().to_string()),
        payment_method: Set(payload.payment_method),
        subtotal: Set(totals.subtotal),
        discount_amount: Set(totals.discount_amount),
        shipping_amount: Set(totals.shipping_amount),
        tax_amount: Set(totals.tax_amount),
        total_amount: Set(totals.total_amount),
        notes: Set(payload.notes),
        shipping_address: Set(shipping),
        placed_at: Set(Some(now.into())),
        shipped_at: Set(None),
        delivered_at: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(checked.len());
    for (product, quantity) in &checked {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(Some(product.id)),
            product_name: Set(product.name.clone()),
            product_sku: Set(product.sku.clone()),
            unit_price: Set(product.selling_price),
            quantity: Set(*quantity),
            total_price: Set(pricing::line_total(product.selling_price, *quantity)),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        items.push(item);

        Products::update_many()
            .col_expr(
                ProdCol::StockQuantity,
                Expr::col(ProdCol::StockQuantity).sub(*quantity),
            )
            .filter(ProdCol::Id.eq(product.id))
            .exec(&txn)
            .await?;
    }

    CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(order_number = %order.order_number, total = order.total_amount, "order placed");
    audit::record(
        &state.pool,
        Some(user.user_id),
        "checkout",
        "orders",
        serde_json::json!({ "order_id": order.id, "order_number": order.order_number }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order placed successfully",
        Order::from_entity(order, items),
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or_default() {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let counts = line_counts(&state.orm, &ids).await?;

    let items = orders
        .into_iter()
        .map(|o| {
            let count = counts.get(&o.id).copied().unwrap_or(0);
            OrderSummary::from_entity(o, count)
        })
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    let order = Orders::find_by_id(id)
        .filter(OrderCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Order"))?;
    let items = items_for(&state.orm, order.id).await?;
    Ok(ApiResponse::success("Order", Order::from_entity(order, items), None))
}

/// Cancels a locked order inside `txn` and puts its units back on the shelf.
pub async fn cancel_locked<C: ConnectionTrait>(
    conn: &C,
    order: OrderModel,
) -> AppResult<(OrderModel, Vec<OrderItemModel>)> {
    let status: OrderStatus = order.status.parse().unwrap_or_default();
    if !status.is_cancellable() {
        return Err(AppError::BadRequest(format!(
            "Cannot cancel order with status: {status}"
        )));
    }

    let items = items_for(conn, order.id).await?;
    for item in &items {
        if let Some(product_id) = item.product_id {
            Products::update_many()
                .col_expr(
                    ProdCol::StockQuantity,
                    Expr::col(ProdCol::StockQuantity).add(item.quantity),
                )
                .filter(ProdCol::Id.eq(product_id))
                .exec(conn)
                .await?;
        }
    }

    let mut active: OrderActive = order.into();
    active.status = Set(OrderStatus::Cancelled.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(conn).await?;
    Ok((order, items))
}

pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(id)
        .filter(OrderCol::UserId.eq(user.user_id))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Order"))?;

    let (order, items) = cancel_locked(&txn, order).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_cancel",
        "orders",
        serde_json::json!({ "order_id": order.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order cancelled",
        Order::from_entity(order, items),
        Some(Meta::empty()),
    ))
}
