use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    audit,
    dto::wishlist::{AddToWishlistRequest, WishlistList},
    entity::{
        Products,
        wishlist_items::{ActiveModel as WishActive, Column as WishCol, Entity as WishlistItems},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{WishlistItem, primary_image_url},
    response::{ApiResponse, Meta},
    services::{
        cart_service::{add_product_to_cart, find_active_product},
        product_service::images_by_product,
    },
    state::AppState,
};

pub async fn list_wishlist(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<WishlistList>> {
    let rows = WishlistItems::find()
        .filter(WishCol::UserId.eq(user.user_id))
        .find_also_related(Products)
        .order_by_desc(WishCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let ids: Vec<Uuid> = rows.iter().map(|(row, _)| row.product_id).collect();
    let images = images_by_product(&state.orm, &ids).await?;

    let items = rows
        .into_iter()
        .filter_map(|(row, product)| product.map(|p| (row, p)))
        .map(|(row, product)| {
            let imgs = images.get(&product.id).map(Vec::as_slice).unwrap_or(&[]);
            WishlistItem {
                id: row.id,
                product_id: product.id,
                product_name: product.name,
                product_slug: product.slug,
                product_sku: product.sku,
                selling_price: product.selling_price,
                mrp: product.mrp,
                primary_image: primary_image_url(imgs),
                is_in_stock: product.is_active && product.stock_quantity > 0,
                created_at: row.created_at.with_timezone(&Utc),
            }
        })
        .collect();

    Ok(ApiResponse::success("Wishlist", WishlistList { items }, None))
}

pub async fn add_item(
    state: &AppState,
    user: &AuthUser,
    payload: AddToWishlistRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    find_active_product(&state.orm, payload.product_id).await?;

    let exists = WishlistItems::find()
        .filter(WishCol::UserId.eq(user.user_id))
        .filter(WishCol::ProductId.eq(payload.product_id))
        .one(&state.orm)
        .await?
        .is_some();
    if exists {
        return Err(AppError::Conflict("Product already in wishlist".into()));
    }

    let row = WishActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        product_id: Set(payload.product_id),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "wishlist_add",
        "wishlist_items",
        serde_json::json!({ "product_id": payload.product_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Added to wishlist",
        serde_json::json!({ "id": row.id, "product_id": row.product_id }),
        Some(Meta::empty()),
    ))
}

pub async fn remove_item(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = WishlistItems::delete_many()
        .filter(WishCol::Id.eq(id))
        .filter(WishCol::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Wishlist item"));
    }

    Ok(ApiResponse::success(
        "Removed from wishlist",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn move_to_cart(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let txn = state.orm.begin().await?;

    let row = WishlistItems::find_by_id(id)
        .filter(WishCol::UserId.eq(user.user_id))
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Wishlist item"))?;

    let (cart_item, _) = add_product_to_cart(&txn, user.user_id, row.product_id, 1).await?;

    WishlistItems::delete_by_id(row.id).exec(&txn).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "wishlist_move_to_cart",
        "cart_items",
        serde_json::json!({ "product_id": row.product_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Moved to cart",
        serde_json::json!({ "cart_item_id": cart_item.id, "quantity": cart_item.quantity }),
        Some(Meta::empty()),
    ))
}
