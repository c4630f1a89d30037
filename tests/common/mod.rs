#![allow(dead_code)]

use chrono::Utc;
use pranjay_storefront::{
    config::AppConfig,
    db::{create_pool, orm_from_pool, run_migrations},
    dto::users::CreateAddressRequest,
    entity::{products::ActiveModel as ProductActive, users::ActiveModel as UserActive},
    middleware::auth::AuthUser,
    models::{UserRole, UserType},
    services::user_service,
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, Set};
use tokio::sync::Mutex;
use uuid::Uuid;

static MIGRATED: Mutex<bool> = Mutex::const_new(false);

/// Database tests are skipped unless a connection string is configured.
pub fn database_url() -> Option<String> {
    match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
        Ok(url) => Some(url),
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run database tests.");
            None
        }
    }
}

pub async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    let orm = orm_from_pool(pool.clone());
    {
        let mut migrated = MIGRATED.lock().await;
        if !*migrated {
            run_migrations(&orm).await?;
            *migrated = true;
        }
    }
    let config = AppConfig::with_defaults(database_url, "test-secret");
    Ok(AppState::new(pool, orm, config))
}

/// Short random suffix so parallel tests never collide on unique columns.
pub fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", &Uuid::new_v4().simple().to_string()[..8])
}

pub async fn create_user(state: &AppState, role: UserRole) -> anyhow::Result<AuthUser> {
    let email = format!("{}@pranjay.test", unique(role.as_str()));
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email.clone()),
        phone: Set(None),
        full_name: Set(Some("Test Buyer".into())),
        business_name: Set(None),
        gst_number: Set(None),
        user_type: Set(UserType::B2B.as_str().to_string()),
        role: Set(role.as_str().to_string()),
        is_active: Set(true),
        is_verified: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        email,
        role,
        user_type: UserType::B2B,
    })
}

pub async fn create_product(
    state: &AppState,
    selling_price: i64,
    stock: i32,
) -> anyhow::Result<pranjay_storefront::entity::products::Model> {
    let sku = unique("SKU").to_uppercase();
    let now = Utc::now();
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        category_id: Set(None),
        brand_id: Set(None),
        name: Set(format!("Test Lipstick {sku}")),
        slug: Set(sku.to_lowercase()),
        sku: Set(sku),
        description: Set(None),
        short_description: Set(None),
        mrp: Set(selling_price + 150_00),
        selling_price: Set(selling_price),
        b2b_price: Set(None),
        stock_quantity: Set(stock),
        min_order_quantity: Set(1),
        unit: Set("pcs".into()),
        attributes: Set(serde_json::json!({})),
        is_active: Set(true),
        is_featured: Set(false),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(product)
}

pub async fn create_address(state: &AppState, user: &AuthUser) -> anyhow::Result<Uuid> {
    let response = user_service::create_address(
        state,
        user,
        CreateAddressRequest {
            label: None,
            full_name: "Asha Rao".into(),
            phone: "9876543210".into(),
            address_line1: "12 MG Road".into(),
            address_line2: None,
            city: "Bengaluru".into(),
            state: "Karnataka".into(),
            postal_code: "560001".into(),
            country: None,
            is_default: false,
        },
    )
    .await?;
    let address = response.data.ok_or_else(|| anyhow::anyhow!("address missing"))?;
    assert!(address.is_default, "first address becomes the default");
    Ok(address.id)
}
