use std::collections::HashMap;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use pranjay_storefront::{
    config::AppConfig,
    db::create_pool,
    models::UserRole,
    storefront::catalog,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,pranjay_storefront=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let pool = create_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_email =
        std::env::var("SEED_ADMIN_EMAIL").unwrap_or_else(|_| "admin@pranjay.com".to_string());
    let admin_id = ensure_admin(&pool, &admin_email).await?;

    let categories = seed_categories(&pool).await?;
    let brands = seed_brands(&pool).await?;
    let products = seed_products(&pool, &categories, &brands).await?;

    tracing::info!(%admin_id, products, "seed completed");
    Ok(())
}

async fn ensure_admin(pool: &sqlx::PgPool, email: &str) -> anyhow::Result<Uuid> {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, full_name, role, is_active, is_verified)
        VALUES ($1, $2, 'Store Admin', $3, TRUE, TRUE)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role, is_active = TRUE
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email.trim().to_lowercase())
    .bind(UserRole::SuperAdmin.as_str())
    .fetch_one(pool)
    .await?;

    tracing::info!(email, "ensured admin user");
    Ok(id)
}

/// Bundled category id -> database id.
async fn seed_categories(pool: &sqlx::PgPool) -> anyhow::Result<HashMap<String, Uuid>> {
    let mut ids = HashMap::new();
    for (sort_order, category) in catalog::categories().into_iter().enumerate() {
        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO categories (id, name, slug, sort_order)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&category.name)
        .bind(&category.slug)
        .bind(sort_order as i32)
        .fetch_one(pool)
        .await?;
        ids.insert(category.id, id);
    }
    tracing::info!(count = ids.len(), "seeded categories");
    Ok(ids)
}

async fn seed_brands(pool: &sqlx::PgPool) -> anyhow::Result<HashMap<String, Uuid>> {
    let mut ids = HashMap::new();
    for brand in catalog::brands() {
        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO brands (id, name, slug)
            VALUES ($1, $2, $3)
            ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&brand.name)
        .bind(&brand.slug)
        .fetch_one(pool)
        .await?;
        ids.insert(brand.id, id);
    }
    tracing::info!(count = ids.len(), "seeded brands");
    Ok(ids)
}

async fn seed_products(
    pool: &sqlx::PgPool,
    categories: &HashMap<String, Uuid>,
    brands: &HashMap<String, Uuid>,
) -> anyhow::Result<usize> {
    let mut count = 0;
    for product in catalog::products() {
        let category_id = product.category_id.as_ref().and_then(|id| categories.get(id));
        let brand_id = product.brand_id.as_ref().and_then(|id| brands.get(id));

        let mut tx = pool.begin().await?;
        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO products (
                id, category_id, brand_id, name, slug, sku, description, short_description,
                mrp, selling_price, b2b_price, stock_quantity, min_order_quantity, unit,
                is_active, is_featured
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            ON CONFLICT (sku) DO UPDATE SET
                mrp = EXCLUDED.mrp,
                selling_price = EXCLUDED.selling_price,
                b2b_price = EXCLUDED.b2b_price,
                is_featured = EXCLUDED.is_featured,
                updated_at = now()
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(category_id)
        .bind(brand_id)
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.sku)
        .bind(&product.description)
        .bind(&product.short_description)
        .bind(product.mrp)
        .bind(product.selling_price)
        .bind(product.b2b_price)
        .bind(product.stock_quantity)
        .bind(product.min_order_quantity)
        .bind(&product.unit)
        .bind(product.is_active)
        .bind(product.is_featured)
        .fetch_one(&mut *tx)
        .await?;

        for (sort_order, image) in product.images.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO product_images (id, product_id, image_url, alt_text, sort_order, is_primary)
                SELECT $1, $2, $3, $4, $5, $6
                WHERE NOT EXISTS (
                    SELECT 1 FROM product_images WHERE product_id = $2 AND image_url = $3
                )
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(id)
            .bind(&image.image_url)
            .bind(&image.alt_text)
            .bind(sort_order as i32)
            .bind(image.is_primary)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        count += 1;
    }
    tracing::info!(count, "seeded products");
    Ok(count)
}
