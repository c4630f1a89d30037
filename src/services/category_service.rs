use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::{
    dto::products::{BrandList, CategoryList, CategoryTree},
    entity::{
        brands::{Column as BrandCol, Entity as Brands},
        categories::{Column as CatCol, Entity as Categories},
    },
    error::{AppError, AppResult},
    models::{Brand, Category, CategoryWithChildren},
    response::ApiResponse,
    state::AppState,
};

/// Groups a flat list into root categories with their direct children.
/// Input order is kept within each level.
pub fn build_tree(categories: Vec<Category>) -> Vec<CategoryWithChildren> {
    let (roots, children): (Vec<Category>, Vec<Category>) =
        categories.into_iter().partition(|c| c.parent_id.is_none());

    roots
        .into_iter()
        .map(|root| {
            let kids = children
                .iter()
                .filter(|c| c.parent_id == Some(root.id))
                .cloned()
                .collect();
            CategoryWithChildren {
                category: root,
                children: kids,
            }
        })
        .collect()
}

async fn active_categories(state: &AppState) -> AppResult<Vec<Category>> {
    Ok(Categories::find()
        .filter(CatCol::IsActive.eq(true))
        .order_by_asc(CatCol::SortOrder)
        .order_by_asc(CatCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Category::from)
        .collect())
}

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let items = active_categories(state).await?;
    Ok(ApiResponse::success("Categories", CategoryList { items }, None))
}

pub async fn category_tree(state: &AppState) -> AppResult<ApiResponse<CategoryTree>> {
    let items = build_tree(active_categories(state).await?);
    Ok(ApiResponse::success("Category tree", CategoryTree { items }, None))
}

pub async fn get_category_by_slug(
    state: &AppState,
    slug: &str,
) -> AppResult<ApiResponse<CategoryWithChildren>> {
    let category = Categories::find()
        .filter(CatCol::Slug.eq(slug))
        .filter(CatCol::IsActive.eq(true))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Category"))?;

    let children = Categories::find()
        .filter(CatCol::ParentId.eq(category.id))
        .filter(CatCol::IsActive.eq(true))
        .order_by_asc(CatCol::SortOrder)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Category::from)
        .collect();

    Ok(ApiResponse::success(
        "Category",
        CategoryWithChildren {
            category: Category::from(category),
            children,
        },
        None,
    ))
}

pub async fn list_brands(state: &AppState) -> AppResult<ApiResponse<BrandList>> {
    let items = Brands::find()
        .filter(BrandCol::IsActive.eq(true))
        .order_by_asc(BrandCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Brand::from)
        .collect();
    Ok(ApiResponse::success("Brands", BrandList { items }, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn category(name: &str, parent_id: Option<Uuid>) -> Category {
        Category {
            id: Uuid::new_v4(),
            parent_id,
            name: name.into(),
            slug: crate::pricing::slugify(name),
            description: None,
            image_url: None,
            sort_order: 0,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn tree_nests_children_under_their_parent() {
        let makeup = category("Makeup", None);
        let skincare = category("Skincare", None);
        let lips = category("Lipsticks", Some(makeup.id));
        let eyes = category("Eye Makeup", Some(makeup.id));

        let tree = build_tree(vec![makeup.clone(), lips.clone(), skincare.clone(), eyes.clone()]);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].category.id, makeup.id);
        assert_eq!(tree[0].children, vec![lips, eyes]);
        assert!(tree[1].children.is_empty());
    }

    #[test]
    fn orphans_with_missing_parent_are_dropped_from_tree() {
        let orphan = category("Orphan", Some(Uuid::new_v4()));
        assert!(build_tree(vec![orphan]).is_empty());
    }
}
