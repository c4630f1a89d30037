use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait, sea_query::Expr,
};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    audit,
    dto::users::{AddressList, CreateAddressRequest, UpdateAddressRequest, UpdateProfileRequest},
    entity::{
        addresses::{self, ActiveModel as AddressActive, Column as AddrCol, Entity as Addresses},
        users::{ActiveModel as UserActive, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Address, User},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn get_profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    let model = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    Ok(ApiResponse::success("Profile", User::from(model), None))
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<User>> {
    let model = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    let mut active: UserActive = model.into();
    if let Some(full_name) = payload.full_name {
        active.full_name = Set(Some(full_name));
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(Some(phone));
    }
    if let Some(business_name) = payload.business_name {
        active.business_name = Set(Some(business_name));
    }
    if let Some(gst_number) = payload.gst_number {
        active.gst_number = Set(Some(gst_number.trim().to_uppercase()));
    }
    if let Some(user_type) = payload.user_type {
        active.user_type = Set(user_type.as_str().to_string());
    }
    active.updated_at = Set(Utc::now().into());
    let model = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "profile_update",
        "users",
        serde_json::json!({ "user_id": user.user_id }),
    )
    .await;

    Ok(ApiResponse::success("Profile updated", User::from(model), None))
}

pub async fn list_addresses(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<AddressList>> {
    let items = Addresses::find()
        .filter(AddrCol::UserId.eq(user.user_id))
        .order_by_desc(AddrCol::IsDefault)
        .order_by_desc(AddrCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Address::from)
        .collect();
    Ok(ApiResponse::success("Addresses", AddressList { items }, None))
}

async fn clear_default<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<()> {
    Addresses::update_many()
        .col_expr(AddrCol::IsDefault, Expr::value(false))
        .filter(AddrCol::UserId.eq(user_id))
        .filter(AddrCol::IsDefault.eq(true))
        .exec(conn)
        .await?;
    Ok(())
}

pub async fn find_owned_address<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    id: Uuid,
) -> AppResult<addresses::Model> {
    Addresses::find_by_id(id)
        .filter(AddrCol::UserId.eq(user_id))
        .one(conn)
        .await?
        .ok_or(AppError::NotFound("Address"))
}

pub async fn create_address(
    state: &AppState,
    user: &AuthUser,
    payload: CreateAddressRequest,
) -> AppResult<ApiResponse<Address>> {
    let txn = state.orm.begin().await?;

    let has_any = Addresses::find()
        .filter(AddrCol::UserId.eq(user.user_id))
        .one(&txn)
        .await?
        .is_some();
    // The first address becomes the default.
    let is_default = payload.is_default || !has_any;
    if is_default {
        clear_default(&txn, user.user_id).await?;
    }

    let model = AddressActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        label: Set(payload.label.unwrap_or_else(|| "home".to_string())),
        full_name: Set(payload.full_name),
        phone: Set(payload.phone),
        address_line1: Set(payload.address_line1),
        address_line2: Set(payload.address_line2),
        city: Set(payload.city),
        state: Set(payload.state),
        postal_code: Set(payload.postal_code),
        country: Set(payload.country.unwrap_or_else(|| "India".to_string())),
        is_default: Set(is_default),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    Ok(ApiResponse::success(
        "Address created",
        Address::from(model),
        Some(Meta::empty()),
    ))
}

pub async fn update_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateAddressRequest,
) -> AppResult<ApiResponse<Address>> {
    let txn = state.orm.begin().await?;
    let existing = find_owned_address(&txn, user.user_id, id).await?;

    if payload.is_default == Some(true) {
        clear_default(&txn, user.user_id).await?;
    }

    let mut active: AddressActive = existing.into();
    if let Some(label) = payload.label {
        active.label = Set(label);
    }
    if let Some(full_name) = payload.full_name {
        active.full_name = Set(full_name);
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(phone);
    }
    if let Some(line1) = payload.address_line1 {
        active.address_line1 = Set(line1);
    }
    if let Some(line2) = payload.address_line2 {
        active.address_line2 = Set(Some(line2));
    }
    if let Some(city) = payload.city {
        active.city = Set(city);
    }
    if let Some(region) = payload.state {
        active.state = Set(region);
    }
    if let Some(postal_code) = payload.postal_code {
        active.postal_code = Set(postal_code);
    }
    if let Some(country) = payload.country {
        active.country = Set(country);
    }
    if let Some(is_default) = payload.is_default {
        active.is_default = Set(is_default);
    }
    let model = active.update(&txn).await?;
    txn.commit().await?;

    Ok(ApiResponse::success("Address updated", Address::from(model), None))
}

pub async fn delete_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = Addresses::delete_many()
        .filter(AddrCol::Id.eq(id))
        .filter(AddrCol::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Address"));
    }
    Ok(ApiResponse::success(
        "Address deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
