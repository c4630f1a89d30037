use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    audit,
    dto::cart::{AddToCartRequest, UpdateCartItemRequest},
    entity::{
        cart_items::{
            ActiveModel as CartActive, Column as CartCol, Entity as CartItems, Model as CartModel,
        },
        products::{Column as ProdCol, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Cart, CartItem, primary_image_url},
    pricing::{self, CartTotals},
    response::{ApiResponse, Meta},
    services::product_service::images_by_product,
    state::AppState,
};

/// Rejects quantities the product cannot satisfy.
pub fn check_quantity(product: &ProductModel, quantity: i32) -> AppResult<()> {
    if quantity < 1 {
        return Err(AppError::BadRequest("Quantity must be at least 1".into()));
    }
    if quantity > product.stock_quantity {
        return Err(AppError::BadRequest(format!(
            "Only {} units available",
            product.stock_quantity
        )));
    }
    if quantity < product.min_order_quantity {
        return Err(AppError::BadRequest(format!(
            "Minimum order quantity is {}",
            product.min_order_quantity
        )));
    }
    Ok(())
}

pub async fn find_active_product<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
) -> AppResult<ProductModel> {
    Products::find_by_id(product_id)
        .filter(ProdCol::IsActive.eq(true))
        .one(conn)
        .await?
        .ok_or(AppError::NotFound("Product"))
}

/// Adds `quantity` units, merging into an existing line for the same product.
pub async fn add_product_to_cart<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    product_id: Uuid,
    quantity: i32,
) -> AppResult<(CartModel, ProductModel)> {
    let product = find_active_product(conn, product_id).await?;

    let existing = CartItems::find()
        .filter(CartCol::UserId.eq(user_id))
        .filter(CartCol::ProductId.eq(product_id))
        .one(conn)
        .await?;

    let item = match existing {
        Some(item) => {
            let merged = item.quantity + quantity;
            if merged > product.stock_quantity {
                return Err(AppError::BadRequest(format!(
                    "Only {} units available",
                    product.stock_quantity
                )));
            }
            let mut active: CartActive = item.into();
            active.quantity = Set(merged);
            active.updated_at = Set(Utc::now().into());
            active.update(conn).await?
        }
        None => {
            check_quantity(&product, quantity)?;
            CartActive {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                product_id: Set(product_id),
                quantity: Set(quantity),
                created_at: NotSet,
                updated_at: NotSet,
            }
            .insert(conn)
            .await?
        }
    };

    Ok((item, product))
}

async fn item_view<C: ConnectionTrait>(
    conn: &C,
    item: CartModel,
    product: ProductModel,
) -> AppResult<CartItem> {
    let images = images_by_product(conn, &[product.id]).await?;
    let imgs = images.get(&product.id).map(Vec::as_slice).unwrap_or(&[]);
    Ok(build_item(item, &product, primary_image_url(imgs)))
}

fn build_item(item: CartModel, product: &ProductModel, primary_image: Option<String>) -> CartItem {
    CartItem {
        id: item.id,
        product_id: product.id,
        quantity: item.quantity,
        product_name: product.name.clone(),
        product_slug: product.slug.clone(),
        product_sku: product.sku.clone(),
        unit_price: product.selling_price,
        primary_image,
        total_price: pricing::line_total(product.selling_price, item.quantity),
        created_at: item.created_at.with_timezone(&Utc),
        updated_at: item.updated_at.with_timezone(&Utc),
    }
}

pub fn summarize(items: Vec<CartItem>) -> Cart {
    let totals = CartTotals::from_lines(items.iter().map(|i| (i.unit_price, i.quantity)));
    Cart {
        items,
        items_count: totals.item_count,
        subtotal: totals.subtotal,
        tax_amount: totals.tax_amount,
        total_amount: totals.total_amount,
        currency: pricing::CURRENCY.to_string(),
    }
}

pub async fn get_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Cart>> {
    let rows = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .find_also_related(Products)
        .order_by_desc(CartCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let ids: Vec<Uuid> = rows.iter().map(|(item, _)| item.product_id).collect();
    let images = images_by_product(&state.orm, &ids).await?;

    let items = rows
        .into_iter()
        .filter_map(|(item, product)| product.map(|p| (item, p)))
        .map(|(item, product)| {
            let imgs = images.get(&product.id).map(Vec::as_slice).unwrap_or(&[]);
            build_item(item, &product, primary_image_url(imgs))
        })
        .collect();

    Ok(ApiResponse::success("Cart", summarize(items), None))
}

pub async fn add_item(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    if payload.quantity < 1 {
        return Err(AppError::BadRequest("Quantity must be at least 1".into()));
    }

    let txn = state.orm.begin().await?;
    let (item, product) =
        add_product_to_cart(&txn, user.user_id, payload.product_id, payload.quantity).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "cart_add",
        "cart_items",
        serde_json::json!({ "product_id": payload.product_id, "quantity": payload.quantity }),
    )
    .await;

    let view = item_view(&state.orm, item, product).await?;
    Ok(ApiResponse::success("Item added to cart", view, Some(Meta::empty())))
}

pub async fn update_item(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartItem>> {
    let item = CartItems::find_by_id(id)
        .filter(CartCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Cart item"))?;

    let product = find_active_product(&state.orm, item.product_id).await?;
    check_quantity(&product, payload.quantity)?;

    let mut active: CartActive = item.into();
    active.quantity = Set(payload.quantity);
    active.updated_at = Set(Utc::now().into());
    let item = active.update(&state.orm).await?;

    let view = item_view(&state.orm, item, product).await?;
    Ok(ApiResponse::success("Cart item updated", view, None))
}

pub async fn remove_item(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = CartItems::delete_many()
        .filter(CartCol::Id.eq(id))
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Cart item"));
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "cart_remove",
        "cart_items",
        serde_json::json!({ "cart_item_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Removed from cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn clear_cart(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;
    tracing::debug!(user_id = %user.user_id, removed = result.rows_affected, "cart cleared");

    Ok(ApiResponse::success(
        "Cart cleared",
        serde_json::json!({ "removed": result.rows_affected }),
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn product(stock: i32, min_order: i32) -> ProductModel {
        ProductModel {
            id: Uuid::new_v4(),
            category_id: None,
            brand_id: None,
            name: "Matte Velvet Lipstick".into(),
            slug: "matte-velvet-lipstick".into(),
            sku: "LIP-001".into(),
            description: None,
            short_description: None,
            mrp: 599_00,
            selling_price: 449_00,
            b2b_price: Some(320_00),
            stock_quantity: stock,
            min_order_quantity: min_order,
            unit: "pcs".into(),
            attributes: json!({}),
            is_active: true,
            is_featured: false,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[test]
    fn quantity_checks_stock_and_minimum() {
        let p = product(10, 2);
        assert!(check_quantity(&p, 0).is_err());
        assert!(check_quantity(&p, 1).is_err());
        assert!(check_quantity(&p, 2).is_ok());
        assert!(check_quantity(&p, 10).is_ok());
        assert!(check_quantity(&p, 11).is_err());
    }

    #[test]
    fn cart_summary_uses_selling_price_and_gst() {
        let p = product(100, 1);
        let now = Utc::now();
        let line = CartModel {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            product_id: p.id,
            quantity: 2,
            created_at: now.into(),
            updated_at: now.into(),
        };
        let cart = summarize(vec![build_item(line, &p, None)]);
        assert_eq!(cart.items_count, 2);
        assert_eq!(cart.subtotal, 898_00);
        assert_eq!(cart.tax_amount, 161_64);
        assert_eq!(cart.total_amount, 1059_64);
        assert_eq!(cart.currency, "INR");
    }
}
