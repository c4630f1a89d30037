use std::collections::HashMap;

use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use uuid::Uuid;

use crate::{
    dto::products::ProductList,
    entity::{
        Brands, Categories,
        product_images::{Column as ImgCol, Entity as ProductImages, Model as ImageModel},
        products::{Column, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    models::{Product, ProductSummary},
    response::{ApiResponse, Meta},
    routes::params::{FeaturedQuery, ProductQuery},
    state::AppState,
};

/// Loads the images of `ids`, grouped by product and ordered by sort order.
pub async fn images_by_product<C: ConnectionTrait>(
    conn: &C,
    ids: &[Uuid],
) -> AppResult<HashMap<Uuid, Vec<ImageModel>>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = ProductImages::find()
        .filter(ImgCol::ProductId.is_in(ids.iter().copied()))
        .order_by_asc(ImgCol::SortOrder)
        .all(conn)
        .await?;

    let mut grouped: HashMap<Uuid, Vec<ImageModel>> = HashMap::new();
    for row in rows {
        grouped.entry(row.product_id).or_default().push(row);
    }
    Ok(grouped)
}

pub async fn summaries<C: ConnectionTrait>(
    conn: &C,
    products: Vec<ProductModel>,
) -> AppResult<Vec<ProductSummary>> {
    let ids: Vec<Uuid> = products.iter().map(|p| p.id).collect();
    let images = images_by_product(conn, &ids).await?;
    Ok(products
        .into_iter()
        .map(|p| {
            let imgs = images.get(&p.id).map(Vec::as_slice).unwrap_or(&[]);
            ProductSummary::from_entity(p, imgs)
        })
        .collect())
}

pub async fn product_detail<C: ConnectionTrait>(
    conn: &C,
    product: ProductModel,
) -> AppResult<Product> {
    let images = ProductImages::find()
        .filter(ImgCol::ProductId.eq(product.id))
        .all(conn)
        .await?;
    let category = match product.category_id {
        Some(id) => Categories::find_by_id(id).one(conn).await?,
        None => None,
    };
    let brand = match product.brand_id {
        Some(id) => Brands::find_by_id(id).one(conn).await?,
        None => None,
    };
    Ok(Product::from_entity(product, images, category, brand))
}

fn catalog_condition(query: &ProductQuery) -> Condition {
    let mut condition = Condition::all().add(Column::IsActive.eq(true));

    if let Some(category_id) = query.category_id {
        condition = condition.add(Column::CategoryId.eq(category_id));
    }
    if let Some(brand_id) = query.brand_id {
        condition = condition.add(Column::BrandId.eq(brand_id));
    }
    if let Some(search) = query.search.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }
    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::SellingPrice.gte(min_price));
    }
    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::SellingPrice.lte(max_price));
    }
    if let Some(is_featured) = query.is_featured {
        condition = condition.add(Column::IsFeatured.eq(is_featured));
    }
    condition
}

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();

    let finder = Products::find()
        .filter(catalog_condition(&query))
        .order_by_desc(Column::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let rows = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = summaries(&state.orm, rows).await?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn featured_products(
    state: &AppState,
    query: FeaturedQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let rows = Products::find()
        .filter(Column::IsActive.eq(true))
        .filter(Column::IsFeatured.eq(true))
        .order_by_desc(Column::CreatedAt)
        .limit(query.limit())
        .all(&state.orm)
        .await?;
    let items = summaries(&state.orm, rows).await?;
    Ok(ApiResponse::success("Featured products", ProductList { items }, None))
}

pub async fn get_product_by_slug(
    state: &AppState,
    slug: &str,
) -> AppResult<ApiResponse<Product>> {
    let product = Products::find()
        .filter(Column::Slug.eq(slug))
        .filter(Column::IsActive.eq(true))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Product"))?;
    let detail = product_detail(&state.orm, product).await?;
    Ok(ApiResponse::success("Product", detail, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, QueryTrait};

    #[test]
    fn catalog_filter_always_hides_inactive_products() {
        let sql = Products::find()
            .filter(catalog_condition(&ProductQuery::default()))
            .build(DbBackend::Postgres)
            .to_string();
        assert!(sql.contains(r#""products"."is_active" = TRUE"#));
    }

    #[test]
    fn search_matches_name_or_description() {
        let query = ProductQuery {
            search: Some("velvet".into()),
            min_price: Some(100),
            ..Default::default()
        };
        let sql = Products::find()
            .filter(catalog_condition(&query))
            .build(DbBackend::Postgres)
            .to_string();
        assert!(sql.contains("ILIKE '%velvet%'"));
        assert!(sql.contains(r#""selling_price" >= 100"#));
    }
}
