use chrono::{TimeZone, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait, sea_query::Expr,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{LockType, SimpleExpr};
use sea_orm::sea_query::extension::postgres::PgExpr;
use uuid::Uuid;

use crate::{
    audit,
    dto::{
        admin::{
            AdminProductList, DashboardStats, RecentOrder, StockLevel, UpdateOrderStatusRequest,
            UpdatePaymentStatusRequest, UpdateUserRoleRequest, UserList,
        },
        orders::OrderList,
        products::{AddImageRequest, AdjustStockRequest, CreateProductRequest, UpdateProductRequest},
    },
    entity::{
        Users,
        users::{ActiveModel as UserActive, Column as UserCol},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        product_images::{
            ActiveModel as ImageActive, Column as ImgCol, Entity as ProductImages,
        },
        products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin, ensure_super_admin},
    models::{Order, OrderStatus, OrderSummary, PaymentStatus, Product, ProductImage, User},
    pricing,
    response::{ApiResponse, Meta},
    routes::params::{AdminOrderQuery, AdminProductQuery, LowStockQuery, UserListQuery},
    services::{
        order_service::{cancel_locked, items_for, line_counts},
        product_service::{images_by_product, product_detail},
    },
    state::AppState,
};

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: AdminOrderQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }
    if let Some(payment_status) = query.payment_status {
        condition = condition.add(OrderCol::PaymentStatus.eq(payment_status.as_str()));
    }

    let finder = Orders::find()
        .filter(condition)
        .order_by_desc(OrderCol::CreatedAt);

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

pub async fn get_order_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Order"))?;
    let items = items_for(&state.orm, order.id).await?;
    Ok(ApiResponse::success("Order", Order::from_entity(order, items), None))
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Order"))?;

    let current: OrderStatus = order.status.parse().unwrap_or_default();
    let (order, items) = if payload.status == OrderStatus::Cancelled {
        cancel_locked(&txn, order).await?
    } else if current.is_closed() {
        return Err(AppError::BadRequest(format!(
            "Cannot change status of order with status: {current}"
        )));
    } else {
        let now = Utc::now();
        let mut active: OrderActive = order.into();
        active.status = Set(payload.status.as_str().to_string());
        match payload.status {
            OrderStatus::Shipped => active.shipped_at = Set(Some(now.into())),
            OrderStatus::Delivered => active.delivered_at = Set(Some(now.into())),
            _ => {}
        }
        active.updated_at = Set(now.into());
        let order = active.update(&txn).await?;
        let items = items_for(&txn, order.id).await?;
        (order, items)
    };

    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_status_update",
        "orders",
        serde_json::json!({ "order_id": order.id, "status": payload.status }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order status updated",
        Order::from_entity(order, items),
        Some(Meta::empty()),
    ))
}

pub async fn update_payment_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdatePaymentStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Order"))?;

    let current: OrderStatus = order.status.parse().unwrap_or_default();
    let mut active: OrderActive = order.into();
    active.payment_status = Set(payload.payment_status.as_str().to_string());
    if payload.payment_status == PaymentStatus::Paid && current == OrderStatus::Pending {
        active.status = Set(OrderStatus::Confirmed.as_str().to_string());
    }
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;
    let items = items_for(&state.orm, order.id).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_payment_update",
        "orders",
        serde_json::json!({ "order_id": order.id, "payment_status": payload.payment_status }),
    )
    .await;

    Ok(ApiResponse::success(
        "Payment status updated",
        Order::from_entity(order, items),
        Some(Meta::empty()),
    ))
}

pub async fn cancel_order_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    update_order_status(
        state,
        user,
        id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Cancelled,
        },
    )
    .await
}

pub async fn list_products_admin(
    state: &AppState,
    user: &AuthUser,
    query: AdminProductQuery,
) -> AppResult<ApiResponse<AdminProductList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(search) = query.search.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(ProdCol::Name).ilike(pattern.clone()))
                .add(Expr::col(ProdCol::Sku).ilike(pattern)),
        );
    }
    if let Some(is_active) = query.is_active {
        condition = condition.add(ProdCol::IsActive.eq(is_active));
    }

    let finder = Products::find()
        .filter(condition)
        .order_by_desc(ProdCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let rows = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let ids: Vec<Uuid> = rows.iter().map(|p| p.id).collect();
    let mut images = images_by_product(&state.orm, &ids).await?;
    let items = rows
        .into_iter()
        .map(|p| {
            let imgs = images.remove(&p.id).unwrap_or_default();
            Product::from_entity(p, imgs, None, None)
        })
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Products", AdminProductList { items }, Some(meta)))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;

    let sku_taken = Products::find()
        .filter(ProdCol::Sku.eq(payload.sku.as_str()))
        .one(&state.orm)
        .await?
        .is_some();
    if sku_taken {
        return Err(AppError::Conflict(format!(
            "Product with SKU {} already exists",
            payload.sku
        )));
    }

    let mut slug = payload
        .slug
        .as_deref()
        .map(pricing::slugify)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| pricing::slugify(&payload.name));
    let slug_taken = Products::find()
        .filter(ProdCol::Slug.eq(slug.as_str()))
        .one(&state.orm)
        .await?
        .is_some();
    if slug_taken {
        slug = format!("{slug}-{}", pricing::slugify(&payload.sku));
    }

    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        category_id: Set(payload.category_id),
        brand_id: Set(payload.brand_id),
        name: Set(payload.name),
        slug: Set(slug),
        sku: Set(payload.sku),
        description: Set(payload.description),
        short_description: Set(payload.short_description),
        mrp: Set(payload.mrp),
        selling_price: Set(payload.selling_price),
        b2b_price: Set(payload.b2b_price),
        stock_quantity: Set(payload.stock_quantity.max(0)),
        min_order_quantity: Set(payload.min_order_quantity.unwrap_or(1).max(1)),
        unit: Set(payload.unit.unwrap_or_else(|| "pcs".to_string())),
        attributes: Set(payload.attributes.unwrap_or_else(|| serde_json::json!({}))),
        is_active: Set(true),
        is_featured: Set(payload.is_featured),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id, "sku": product.sku }),
    )
    .await;

    let detail = product_detail(&state.orm, product).await?;
    Ok(ApiResponse::success("Product created", detail, Some(Meta::empty())))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Product"))?;

    let mut active: ProductActive = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(short_description) = payload.short_description {
        active.short_description = Set(Some(short_description));
    }
    if let Some(mrp) = payload.mrp {
        active.mrp = Set(mrp);
    }
    if let Some(selling_price) = payload.selling_price {
        active.selling_price = Set(selling_price);
    }
    if let Some(b2b_price) = payload.b2b_price {
        active.b2b_price = Set(Some(b2b_price));
    }
    if let Some(stock) = payload.stock_quantity {
        active.stock_quantity = Set(stock.max(0));
    }
    if let Some(min_order) = payload.min_order_quantity {
        active.min_order_quantity = Set(min_order.max(1));
    }
    if let Some(unit) = payload.unit {
        active.unit = Set(unit);
    }
    if let Some(attributes) = payload.attributes {
        active.attributes = Set(attributes);
    }
    if let Some(category_id) = payload.category_id {
        active.category_id = Set(Some(category_id));
    }
    if let Some(brand_id) = payload.brand_id {
        active.brand_id = Set(Some(brand_id));
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    if let Some(is_featured) = payload.is_featured {
        active.is_featured = Set(is_featured);
    }
    active.updated_at = Set(Utc::now().into());
    let product = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    let detail = product_detail(&state.orm, product).await?;
    Ok(ApiResponse::success("Product updated", detail, None))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Products::update_many()
        .col_expr(ProdCol::IsActive, Expr::value(false))
        .col_expr(ProdCol::UpdatedAt, SimpleExpr::from(Expr::current_timestamp()))
        .filter(ProdCol::Id.eq(id))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Product"));
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_delete",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product deactivated",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn add_image(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: AddImageRequest,
) -> AppResult<ApiResponse<ProductImage>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;

    Products::find_by_id(product_id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Product"))?;

    if payload.is_primary {
        ProductImages::update_many()
            .col_expr(ImgCol::IsPrimary, Expr::value(false))
            .filter(ImgCol::ProductId.eq(product_id))
            .exec(&txn)
            .await?;
    }

    let next_sort = ProductImages::find()
        .filter(ImgCol::ProductId.eq(product_id))
        .order_by_desc(ImgCol::SortOrder)
        .one(&txn)
        .await?
        .map(|img| img.sort_order + 1)
        .unwrap_or(0);

    let image = ImageActive {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        image_url: Set(payload.image_url),
        alt_text: Set(payload.alt_text),
        sort_order: Set(next_sort),
        is_primary: Set(payload.is_primary),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    Ok(ApiResponse::success(
        "Image added",
        ProductImage::from(image),
        Some(Meta::empty()),
    ))
}

pub async fn remove_image(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    image_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = ProductImages::delete_many()
        .filter(ImgCol::Id.eq(image_id))
        .filter(ImgCol::ProductId.eq(product_id))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Image"));
    }
    Ok(ApiResponse::success(
        "Image removed",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// New stock level after applying `adjustment`, floored at zero.
pub fn adjusted_stock(current: i32, adjustment: i32) -> i32 {
    current.saturating_add(adjustment).max(0)
}

pub async fn adjust_stock(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: AdjustStockRequest,
) -> AppResult<ApiResponse<StockLevel>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;

    let product = Products::find_by_id(product_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Product"))?;

    let previous = product.stock_quantity;
    let sku = product.sku.clone();
    let mut active: ProductActive = product.into();
    active.stock_quantity = Set(adjusted_stock(previous, payload.adjustment));
    active.updated_at = Set(Utc::now().into());
    let product = active.update(&txn).await?;

    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "stock_adjust",
        "products",
        serde_json::json!({
            "product_id": product_id,
            "adjustment": payload.adjustment,
            "reason": payload.reason,
            "stock_quantity": product.stock_quantity,
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Stock updated",
        StockLevel {
            product_id,
            sku,
            previous_quantity: previous,
            stock_quantity: product.stock_quantity,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_low_stock(
    state: &AppState,
    user: &AuthUser,
    query: LowStockQuery,
) -> AppResult<ApiResponse<AdminProductList>> {
    ensure_admin(user)?;
    let threshold = query.threshold.unwrap_or(state.config.low_stock_threshold);

    let rows = Products::find()
        .filter(ProdCol::IsActive.eq(true))
        .filter(ProdCol::StockQuantity.lt(threshold))
        .order_by_asc(ProdCol::StockQuantity)
        .all(&state.orm)
        .await?;
    let ids: Vec<Uuid> = rows.iter().map(|p| p.id).collect();
    let mut images = images_by_product(&state.orm, &ids).await?;
    let items = rows
        .into_iter()
        .map(|p| {
            let imgs = images.remove(&p.id).unwrap_or_default();
            Product::from_entity(p, imgs, None, None)
        })
        .collect();

    Ok(ApiResponse::success("Low stock products", AdminProductList { items }, None))
}

pub async fn dashboard(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<DashboardStats>> {
    ensure_admin(user)?;

    let total_users = Users::find().count(&state.orm).await? as i64;
    let total_products = Products::find()
        .filter(ProdCol::IsActive.eq(true))
        .count(&state.orm)
        .await? as i64;
    let total_orders = Orders::find().count(&state.orm).await? as i64;
    let pending_orders = Orders::find()
        .filter(OrderCol::Status.eq(OrderStatus::Pending.as_str()))
        .count(&state.orm)
        .await? as i64;

    let revenue: (i64,) = sqlx::query_as(
        "SELECT COALESCE(SUM(total_amount), 0)::BIGINT FROM orders WHERE payment_status = $1",
    )
    .bind(PaymentStatus::Paid.as_str())
    .fetch_one(&state.pool)
    .await?;

    let today = Utc::now().date_naive();
    let midnight = Utc.from_utc_datetime(&today.and_time(chrono::NaiveTime::MIN));
    let orders_today = Orders::find()
        .filter(OrderCol::CreatedAt.gte(midnight))
        .count(&state.orm)
        .await? as i64;

    let low_stock_products = Products::find()
        .filter(ProdCol::IsActive.eq(true))
        .filter(ProdCol::StockQuantity.lt(state.config.low_stock_threshold))
        .count(&state.orm)
        .await? as i64;

    let recent_orders = Orders::find()
        .find_also_related(Users)
        .order_by_desc(OrderCol::CreatedAt)
        .limit(10)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|(order, customer)| RecentOrder {
            id: order.id,
            order_number: order.order_number,
            status: order.status.parse().unwrap_or_default(),
            payment_status: order.payment_status.parse().unwrap_or_default(),
            total_amount: order.total_amount,
            customer_email: customer.map(|c| c.email),
            created_at: order.created_at.with_timezone(&Utc),
        })
        .collect();

    Ok(ApiResponse::success(
        "Dashboard",
        DashboardStats {
            total_users,
            total_products,
            total_orders,
            pending_orders,
            total_revenue: revenue.0,
            orders_today,
            low_stock_products,
            recent_orders,
        },
        None,
    ))
}

pub async fn list_users(
    state: &AppState,
    user: &AuthUser,
    query: UserListQuery,
) -> AppResult<ApiResponse<UserList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(role) = query.role {
        condition = condition.add(UserCol::Role.eq(role.as_str()));
    }
    if let Some(is_active) = query.is_active {
        condition = condition.add(UserCol::IsActive.eq(is_active));
    }

    let finder = Users::find()
        .filter(condition)
        .order_by_desc(UserCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(User::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Users", UserList { items }, Some(meta)))
}

pub async fn get_user_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;
    let model = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    Ok(ApiResponse::success("User", User::from(model), None))
}

/// Applies one change to another account. Super admins only, and never to
/// their own account.
async fn change_user(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    action: &'static str,
    apply: impl FnOnce(&mut UserActive),
) -> AppResult<User> {
    ensure_super_admin(user)?;
    if id == user.user_id {
        return Err(AppError::BadRequest(
            "Cannot change your own role or status".into(),
        ));
    }

    let model = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    let mut active: UserActive = model.into();
    apply(&mut active);
    active.updated_at = Set(Utc::now().into());
    let model = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        action,
        "users",
        serde_json::json!({ "user_id": id, "role": model.role, "is_active": model.is_active }),
    )
    .await;

    Ok(User::from(model))
}

pub async fn set_user_role(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateUserRoleRequest,
) -> AppResult<ApiResponse<User>> {
    let updated = change_user(state, user, id, "user_role_update", |active| {
        active.role = Set(payload.role.as_str().to_string());
    })
    .await?;
    Ok(ApiResponse::success("User role updated", updated, Some(Meta::empty())))
}

pub async fn deactivate_user(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<User>> {
    let updated = change_user(state, user, id, "user_deactivate", |active| {
        active.is_active = Set(false);
    })
    .await?;
    Ok(ApiResponse::success("User deactivated", updated, Some(Meta::empty())))
}

pub async fn reactivate_user(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<User>> {
    let updated = change_user(state, user, id, "user_reactivate", |active| {
        active.is_active = Set(true);
    })
    .await?;
    Ok(ApiResponse::success("User reactivated", updated, Some(Meta::empty())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_adjustment_never_goes_negative() {
        assert_eq!(adjusted_stock(10, -3), 7);
        assert_eq!(adjusted_stock(2, -5), 0);
        assert_eq!(adjusted_stock(0, 25), 25);
        assert_eq!(adjusted_stock(i32::MAX, 1), i32::MAX);
    }
}
