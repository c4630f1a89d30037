mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use pranjay_storefront::{
    dto::{
        admin::UpdateUserRoleRequest,
        users::{CreateAddressRequest, UpdateAddressRequest},
    },
    entity::Users,
    error::AppError,
    middleware::auth::AuthUser,
    models::UserRole,
    routes::{create_app, params::UserListQuery},
    services::{admin_service, auth_service, user_service},
    state::AppState,
};
use sea_orm::EntityTrait;
use tower::ServiceExt;
use uuid::Uuid;

fn office_address(is_default: bool) -> CreateAddressRequest {
    CreateAddressRequest {
        label: Some("office".into()),
        full_name: "Asha Rao".into(),
        phone: "9876543210".into(),
        address_line1: "4th Floor, Prestige Tower".into(),
        address_line2: None,
        city: "Pune".into(),
        state: "Maharashtra".into(),
        postal_code: "411001".into(),
        country: None,
        is_default,
    }
}

async fn default_ids(state: &AppState, user: &AuthUser) -> anyhow::Result<Vec<Uuid>> {
    let list = user_service::list_addresses(state, user)
        .await?
        .data
        .ok_or_else(|| anyhow::anyhow!("addresses missing"))?;
    Ok(list
        .items
        .into_iter()
        .filter(|a| a.is_default)
        .map(|a| a.id)
        .collect())
}

#[tokio::test]
async fn only_one_address_is_default() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let state = common::setup_state(&url).await?;
    let user = common::create_user(&state, UserRole::Customer).await?;

    let home = common::create_address(&state, &user).await?;
    assert_eq!(default_ids(&state, &user).await?, vec![home]);

    let spare = user_service::create_address(&state, &user, office_address(false))
        .await?
        .data
        .expect("address");
    assert!(!spare.is_default);
    assert_eq!(default_ids(&state, &user).await?, vec![home]);

    let office = user_service::create_address(&state, &user, office_address(true))
        .await?
        .data
        .expect("address");
    assert!(office.is_default);
    assert_eq!(default_ids(&state, &user).await?, vec![office.id]);

    user_service::update_address(
        &state,
        &user,
        spare.id,
        UpdateAddressRequest {
            is_default: Some(true),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(default_ids(&state, &user).await?, vec![spare.id]);

    // Another account's defaults are untouched.
    let neighbour = common::create_user(&state, UserRole::Customer).await?;
    let theirs = common::create_address(&state, &neighbour).await?;
    user_service::update_address(
        &state,
        &user,
        home,
        UpdateAddressRequest {
            is_default: Some(true),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(default_ids(&state, &user).await?, vec![home]);
    assert_eq!(default_ids(&state, &neighbour).await?, vec![theirs]);

    let foreign = user_service::update_address(&state, &neighbour, home, UpdateAddressRequest::default()).await;
    assert!(matches!(foreign, Err(AppError::NotFound(_))));

    Ok(())
}

#[tokio::test]
async fn super_admin_manages_accounts() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let state = common::setup_state(&url).await?;
    let owner = common::create_user(&state, UserRole::SuperAdmin).await?;
    let admin = common::create_user(&state, UserRole::Admin).await?;
    let customer = common::create_user(&state, UserRole::Customer).await?;

    let listing = admin_service::list_users(
        &state,
        &admin,
        UserListQuery {
            role: Some(UserRole::Customer),
            page_size: Some(100),
            ..Default::default()
        },
    )
    .await?;
    let meta = listing.meta.expect("meta");
    assert!(meta.total.unwrap_or_default() >= 1);
    let users = listing.data.expect("users");
    assert!(users.items.iter().all(|u| u.role == UserRole::Customer));

    let fetched = admin_service::get_user_admin(&state, &admin, customer.user_id)
        .await?
        .data
        .expect("user");
    assert_eq!(fetched.email, customer.email);
    let missing = admin_service::get_user_admin(&state, &admin, Uuid::new_v4()).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    let by_customer = admin_service::list_users(&state, &customer, UserListQuery::default()).await;
    assert!(matches!(by_customer, Err(AppError::Forbidden(_))));
    let by_admin = admin_service::deactivate_user(&state, &admin, customer.user_id).await;
    assert!(matches!(by_admin, Err(AppError::Forbidden(_))));
    let promote_by_admin = admin_service::set_user_role(
        &state,
        &admin,
        customer.user_id,
        UpdateUserRoleRequest { role: UserRole::Admin },
    )
    .await;
    assert!(matches!(promote_by_admin, Err(AppError::Forbidden(_))));

    let self_lockout = admin_service::deactivate_user(&state, &owner, owner.user_id).await;
    assert!(matches!(self_lockout, Err(AppError::BadRequest(_))));

    let promoted = admin_service::set_user_role(
        &state,
        &owner,
        customer.user_id,
        UpdateUserRoleRequest { role: UserRole::Admin },
    )
    .await?
    .data
    .expect("user");
    assert_eq!(promoted.role, UserRole::Admin);

    let disabled = admin_service::deactivate_user(&state, &owner, customer.user_id)
        .await?
        .data
        .expect("user");
    assert!(!disabled.is_active);

    let inactive = admin_service::list_users(
        &state,
        &admin,
        UserListQuery {
            is_active: Some(false),
            page_size: Some(100),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("users");
    assert!(inactive.items.iter().all(|u| !u.is_active));

    // A deactivated account's still-valid token is refused.
    let model = Users::find_by_id(customer.user_id)
        .one(&state.orm)
        .await?
        .expect("user");
    let tokens = auth_service::issue_token_pair(&state.config, &model)?;
    let app = create_app(state.clone());
    let me = || {
        Request::get("/api/v1/users/me")
            .header(header::AUTHORIZATION, format!("Bearer {}", tokens.access_token))
            .body(Body::empty())
            .unwrap()
    };
    let response = app.clone().oneshot(me()).await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let restored = admin_service::reactivate_user(&state, &owner, customer.user_id)
        .await?
        .data
        .expect("user");
    assert!(restored.is_active);
    let response = app.oneshot(me()).await?;
    assert_eq!(response.status(), StatusCode::OK);

    Ok(())
}
