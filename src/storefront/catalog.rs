//! Bundled catalog. Serves the storefront when the API is down or not
//! configured, and seeds a fresh database.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use super::{
    client::ApiClient,
    product::{Product, ProductImageRef},
};
use crate::routes::params::ProductQuery;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: String,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandRef {
    pub id: String,
    pub name: String,
    pub slug: String,
}

struct Row {
    id: &'static str,
    name: &'static str,
    sku: &'static str,
    short: &'static str,
    description: &'static str,
    mrp: i64,
    selling: i64,
    b2b: i64,
    stock: i32,
    min_order: i32,
    category: usize,
    brand: usize,
    featured: bool,
    photo: &'static str,
    alt: &'static str,
}

const CATEGORIES: [(&str, &str, &str); 4] = [
    ("cat-1", "Lipsticks", "lipsticks"),
    ("cat-2", "Foundations", "foundations"),
    ("cat-3", "Eye Makeup", "eye-makeup"),
    ("cat-4", "Skincare", "skincare"),
];

const BRANDS: [(&str, &str, &str); 3] = [
    ("brand-1", "Pranjay Beauty", "pranjay-beauty"),
    ("brand-2", "Glow Studio", "glow-studio"),
    ("brand-3", "Pure Glow", "pure-glow"),
];

const ROWS: [Row; 8] = [
    Row {
        id: "1",
        name: "Matte Velvet Lipstick - Ruby Red",
        sku: "LIP-001",
        short: "Long-lasting matte finish, 8-hour wear",
        description: "A richly pigmented matte lipstick with a velvety feel that stays put through the day.",
        mrp: 599_00,
        selling: 449_00,
        b2b: 320_00,
        stock: 150,
        min_order: 5,
        category: 0,
        brand: 0,
        featured: true,
        photo: "1586495777744-4413f21062fa",
        alt: "Ruby Red Lipstick",
    },
    Row {
        id: "2",
        name: "HD Foundation - Natural Beige",
        sku: "FND-001",
        short: "Buildable coverage, vitamin E enriched",
        description: "Lightweight HD foundation with buildable coverage and a natural finish.",
        mrp: 899_00,
        selling: 699_00,
        b2b: 480_00,
        stock: 200,
        min_order: 3,
        category: 1,
        brand: 0,
        featured: true,
        photo: "1631214540553-ff044a3ff1d4",
        alt: "HD Foundation",
    },
    Row {
        id: "3",
        name: "Smokey Eye Palette - Midnight",
        sku: "EYE-001",
        short: "12 shades, matte & shimmer",
        description: "Twelve blendable shades for day-to-night smokey looks.",
        mrp: 1299_00,
        selling: 999_00,
        b2b: 650_00,
        stock: 80,
        min_order: 2,
        category: 2,
        brand: 1,
        featured: true,
        photo: "1512496015851-a90fb38ba796",
        alt: "Smokey Eye Palette",
    },
    Row {
        id: "4",
        name: "Hydrating Face Serum",
        sku: "SKN-001",
        short: "Hyaluronic acid + Vitamin C",
        description: "A daily serum that hydrates and brightens.",
        mrp: 799_00,
        selling: 599_00,
        b2b: 420_00,
        stock: 120,
        min_order: 5,
        category: 3,
        brand: 2,
        featured: false,
        photo: "1620916566398-39f1143ab7be",
        alt: "Face Serum",
    },
    Row {
        id: "5",
        name: "Volumizing Mascara - Jet Black",
        sku: "EYE-002",
        short: "Clump-free, water-resistant",
        description: "Builds volume and length without clumping.",
        mrp: 499_00,
        selling: 399_00,
        b2b: 280_00,
        stock: 250,
        min_order: 10,
        category: 2,
        brand: 0,
        featured: false,
        photo: "1631214500115-598fc2cb8c8f",
        alt: "Mascara",
    },
    Row {
        id: "6",
        name: "Nude Lip Gloss - Honey",
        sku: "LIP-002",
        short: "Non-sticky, hydrating formula",
        description: "A sheer honey gloss with a non-sticky finish.",
        mrp: 399_00,
        selling: 299_00,
        b2b: 210_00,
        stock: 180,
        min_order: 10,
        category: 0,
        brand: 1,
        featured: false,
        photo: "1619451334792-150fd785ee74",
        alt: "Lip Gloss",
    },
    Row {
        id: "7",
        name: "Setting Powder - Translucent",
        sku: "FND-002",
        short: "Oil control, blurs imperfections",
        description: "Finely milled translucent powder that sets makeup and controls shine.",
        mrp: 649_00,
        selling: 499_00,
        b2b: 350_00,
        stock: 90,
        min_order: 5,
        category: 1,
        brand: 0,
        featured: false,
        photo: "1596462502278-27bfdc403348",
        alt: "Setting Powder",
    },
    Row {
        id: "8",
        name: "Rose Face Mist",
        sku: "SKN-002",
        short: "Hydrating rose water formula",
        description: "A refreshing rose water mist for a quick pick-me-up.",
        mrp: 349_00,
        selling: 249_00,
        b2b: 180_00,
        stock: 300,
        min_order: 12,
        category: 3,
        brand: 2,
        featured: true,
        photo: "1556228720-195a672e8a03",
        alt: "Face Mist",
    },
];

static PRODUCTS: LazyLock<Vec<Product>> = LazyLock::new(|| ROWS.iter().map(product_from_row).collect());

fn product_from_row(row: &Row) -> Product {
    let (category_id, category_name, _) = CATEGORIES[row.category];
    let (brand_id, brand_name, _) = BRANDS[row.brand];
    let image_url = format!("https://images.unsplash.com/photo-{}?w=500", row.photo);
    Product {
        id: row.id.to_string(),
        name: row.name.to_string(),
        slug: crate::pricing::slugify(row.name),
        sku: row.sku.to_string(),
        description: Some(row.description.to_string()),
        short_description: Some(row.short.to_string()),
        mrp: row.mrp,
        selling_price: row.selling,
        b2b_price: Some(row.b2b),
        stock_quantity: row.stock,
        min_order_quantity: row.min_order,
        unit: "pcs".to_string(),
        category_id: Some(category_id.to_string()),
        category_name: Some(category_name.to_string()),
        brand_id: Some(brand_id.to_string()),
        brand_name: Some(brand_name.to_string()),
        is_active: true,
        is_featured: row.featured,
        primary_image: Some(image_url.clone()),
        images: vec![ProductImageRef {
            id: format!("img-{}", row.id),
            image_url,
            alt_text: Some(row.alt.to_string()),
            is_primary: true,
        }],
    }
}

pub fn products() -> &'static [Product] {
    &PRODUCTS
}

pub fn categories() -> Vec<CategoryRef> {
    CATEGORIES
        .iter()
        .map(|(id, name, slug)| CategoryRef {
            id: id.to_string(),
            name: name.to_string(),
            slug: slug.to_string(),
        })
        .collect()
}

pub fn brands() -> Vec<BrandRef> {
    BRANDS
        .iter()
        .map(|(id, name, slug)| BrandRef {
            id: id.to_string(),
            name: name.to_string(),
            slug: slug.to_string(),
        })
        .collect()
}

pub fn by_slug(slug: &str) -> Option<Product> {
    PRODUCTS.iter().find(|p| p.slug == slug).cloned()
}

pub fn by_id(id: &str) -> Option<Product> {
    PRODUCTS.iter().find(|p| p.id == id).cloned()
}

pub fn featured() -> Vec<Product> {
    PRODUCTS.iter().filter(|p| p.is_featured).cloned().collect()
}

/// Unknown slugs yield an empty list.
pub fn by_category_slug(slug: &str) -> Vec<Product> {
    let Some((id, _, _)) = CATEGORIES.iter().find(|(_, _, s)| *s == slug) else {
        return Vec::new();
    };
    PRODUCTS
        .iter()
        .filter(|p| p.category_id.as_deref() == Some(*id))
        .cloned()
        .collect()
}

/// Case-insensitive match on name, short description or SKU.
pub fn search(term: &str) -> Vec<Product> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return products().to_vec();
    }
    PRODUCTS
        .iter()
        .filter(|p| {
            p.name.to_lowercase().contains(&needle)
                || p.sku.to_lowercase().contains(&needle)
                || p
                    .short_description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect()
}

/// Reads the catalog from the API, falling back to the bundled data on any
/// failure.
#[derive(Debug, Clone)]
pub struct CatalogSource {
    client: Option<ApiClient>,
}

impl CatalogSource {
    pub fn new(client: Option<ApiClient>) -> Self {
        Self { client }
    }

    pub fn offline() -> Self {
        Self { client: None }
    }

    pub async fn products(&self, search_term: Option<&str>) -> Vec<Product> {
        if let Some(client) = &self.client {
            let query = ProductQuery {
                search: search_term.map(str::to_string),
                page_size: Some(100),
                ..Default::default()
            };
            match client.list_products(&query).await {
                Ok((items, _)) => return items,
                Err(err) => tracing::warn!(error = %err, "product listing failed, using bundled catalog"),
            }
        }
        match search_term {
            Some(term) => search(term),
            None => products().to_vec(),
        }
    }

    pub async fn featured(&self) -> Vec<Product> {
        if let Some(client) = &self.client {
            match client.featured_products(None).await {
                Ok(items) => return items,
                Err(err) => tracing::warn!(error = %err, "featured listing failed, using bundled catalog"),
            }
        }
        featured()
    }

    pub async fn product(&self, slug: &str) -> Option<Product> {
        if let Some(client) = &self.client {
            match client.product_by_slug(slug).await {
                Ok(product) => return Some(product),
                Err(err) if err.status() == Some(404) => return None,
                Err(err) => tracing::warn!(error = %err, slug, "product lookup failed, using bundled catalog"),
            }
        }
        by_slug(slug)
    }

    pub async fn categories(&self) -> Vec<CategoryRef> {
        if let Some(client) = &self.client {
            match client.categories().await {
                Ok(items) => {
                    return items
                        .into_iter()
                        .map(|c| CategoryRef {
                            id: c.id.to_string(),
                            name: c.name,
                            slug: c.slug,
                        })
                        .collect();
                }
                Err(err) => tracing::warn!(error = %err, "category listing failed, using bundled catalog"),
            }
        }
        categories()
    }

    pub async fn by_category(&self, slug: &str) -> Vec<Product> {
        if let Some(client) = &self.client {
            match self.api_category_products(client, slug).await {
                Ok(items) => return items,
                Err(err) => tracing::warn!(error = %err, slug, "category listing failed, using bundled catalog"),
            }
        }
        by_category_slug(slug)
    }

    async fn api_category_products(
        &self,
        client: &ApiClient,
        slug: &str,
    ) -> super::StorefrontResult<Vec<Product>> {
        let Some(category) = client.categories().await?.into_iter().find(|c| c.slug == slug) else {
            return Ok(Vec::new());
        };
        let query = ProductQuery {
            category_id: Some(category.id),
            page_size: Some(100),
            ..Default::default()
        };
        Ok(client.list_products(&query).await?.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_catalog_has_eight_products() {
        assert_eq!(products().len(), 8);
        let ruby = by_slug("matte-velvet-lipstick-ruby-red").unwrap();
        assert_eq!(ruby.id, "1");
        assert_eq!(ruby.selling_price, 449_00);
        assert_eq!(ruby.discount_percentage(), 25);
        assert_eq!(by_id("8").unwrap().slug, "rose-face-mist");
    }

    #[test]
    fn featured_and_category_filters() {
        let ids: Vec<String> = featured().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["1", "2", "3", "8"]);

        let eyes: Vec<String> = by_category_slug("eye-makeup").into_iter().map(|p| p.sku).collect();
        assert_eq!(eyes, vec!["EYE-001", "EYE-002"]);
        assert!(by_category_slug("perfume").is_empty());
    }

    #[test]
    fn search_matches_name_and_sku() {
        assert_eq!(search("MASCARA").len(), 1);
        assert_eq!(search("lip-00").len(), 2);
        assert_eq!(search("  ").len(), 8);
    }
}
