//! Catalog-side product service: listing, pagination, filtering, and CRUD.
//! Also the production implementation of the [`Catalog`] capability the
//! basket service reads from.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::catalog::Catalog;
use crate::domain::product::{Brand, Category, Color, Product, Size};
use crate::error::{Error, Result};

#[derive(Clone)]
pub struct ProductService {
    pool: PgPool,
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductFilter {
    pub brand_id: Option<Uuid>,
    pub colors: Option<Vec<Color>>,
    pub sizes: Option<Vec<Size>>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProduct {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    #[validate(custom = "non_negative")]
    pub price: Decimal,
    #[validate(length(min = 1))]
    pub colors: Vec<Color>,
    #[validate(length(min = 1))]
    pub sizes: Vec<Size>,
    pub category_id: Uuid,
    pub brand_id: Uuid,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProduct {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    #[validate(custom = "non_negative")]
    pub price: Option<Decimal>,
    #[validate(length(min = 1))]
    pub colors: Option<Vec<Color>>,
    #[validate(length(min = 1))]
    pub sizes: Option<Vec<Size>>,
    pub category_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
}

fn non_negative(price: &Decimal) -> std::result::Result<(), ValidationError> {
    if price.is_sign_negative() {
        return Err(ValidationError::new("negative_price"));
    }
    Ok(())
}

impl ProductService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Product>> {
        let products =
            sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?;
        Ok(products)
    }

    pub async fn page(&self, params: PageParams) -> Result<Page<Product>> {
        let page = params.page.unwrap_or(1).max(1);
        let limit = params.limit.unwrap_or(10).clamp(1, 100);
        let offset = (page - 1) * limit;

        let data = sqlx::query_as::<_, Product>(
            "SELECT * FROM products ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        let total_pages = ((total.0 as u32) + limit - 1) / limit;
        Ok(Page {
            data,
            total: total.0,
            page,
            limit,
            total_pages,
        })
    }

    pub async fn get(&self, id: Uuid) -> Result<Product> {
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(Error::ProductNotFound)
    }

    pub async fn filter(&self, filter: ProductFilter) -> Result<Vec<Product>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM products WHERE TRUE");
        if let Some(brand_id) = filter.brand_id {
            qb.push(" AND brand_id = ").push_bind(brand_id);
        }
        if let Some(colors) = filter.colors.filter(|c| !c.is_empty()) {
            qb.push(" AND colors && ").push_bind(colors);
        }
        if let Some(sizes) = filter.sizes.filter(|s| !s.is_empty()) {
            qb.push(" AND sizes && ").push_bind(sizes);
        }
        if let Some(min) = filter.min_price {
            qb.push(" AND price >= ").push_bind(min);
        }
        if let Some(max) = filter.max_price {
            qb.push(" AND price <= ").push_bind(max);
        }

        let products = qb
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await?;
        if products.is_empty() {
            return Err(Error::NoMatchingProducts);
        }
        Ok(products)
    }

    pub async fn by_category(&self, category_id: Uuid) -> Result<Vec<Product>> {
        sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
            .bind(category_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(Error::CategoryNotFound)?;

        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE category_id = $1 ORDER BY created_at DESC",
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;
        if products.is_empty() {
            return Err(Error::NoMatchingProducts);
        }
        Ok(products)
    }

    pub async fn create(&self, params: CreateProduct) -> Result<Product> {
        params.validate()?;
        self.ensure_category(params.category_id).await?;
        self.ensure_brand(params.brand_id).await?;

        let slug = params
            .slug
            .unwrap_or_else(|| slugify(&params.name));
        if self.slug_taken(&slug, None).await? {
            return Err(Error::SlugTaken(slug));
        }

        let product = sqlx::query_as::<_, Product>(
            "INSERT INTO products \
             (id, name, slug, description, price, colors, sizes, category_id, brand_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW(), NOW()) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(&params.name)
        .bind(&slug)
        .bind(&params.description)
        .bind(params.price)
        .bind(&params.colors)
        .bind(&params.sizes)
        .bind(params.category_id)
        .bind(params.brand_id)
        .fetch_one(&self.pool)
        .await?;
        tracing::info!(product_id = %product.id, slug = %product.slug, "product created");
        Ok(product)
    }

    pub async fn update(&self, id: Uuid, params: UpdateProduct) -> Result<Product> {
        params.validate()?;
        let mut product = self.get(id).await?;

        if let Some(category_id) = params.category_id {
            self.ensure_category(category_id).await?;
            product.category_id = category_id;
        }
        if let Some(brand_id) = params.brand_id {
            self.ensure_brand(brand_id).await?;
            product.brand_id = brand_id;
        }
        if let Some(name) = params.name {
            product.slug = params.slug.clone().unwrap_or_else(|| slugify(&name));
            product.name = name;
        } else if let Some(slug) = params.slug {
            product.slug = slug;
        }
        if let Some(description) = params.description {
            product.description = Some(description);
        }
        if let Some(price) = params.price {
            product.price = price;
        }
        if let Some(colors) = params.colors {
            product.colors = colors;
        }
        if let Some(sizes) = params.sizes {
            product.sizes = sizes;
        }

        if self.slug_taken(&product.slug, Some(id)).await? {
            return Err(Error::SlugTaken(product.slug));
        }

        let product = sqlx::query_as::<_, Product>(
            "UPDATE products SET name = $2, slug = $3, description = $4, price = $5, \
             colors = $6, sizes = $7, category_id = $8, brand_id = $9, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.colors)
        .bind(&product.sizes)
        .bind(product.category_id)
        .bind(product.brand_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(product)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::ProductNotFound);
        }
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }

    pub async fn categories(&self) -> Result<Vec<Category>> {
        let categories =
            sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name")
                .fetch_all(&self.pool)
                .await?;
        Ok(categories)
    }

    pub async fn brands(&self) -> Result<Vec<Brand>> {
        let brands = sqlx::query_as::<_, Brand>("SELECT * FROM brands ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(brands)
    }

    async fn ensure_category(&self, id: Uuid) -> Result<()> {
        sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(Error::CategoryNotFound)?;
        Ok(())
    }

    async fn ensure_brand(&self, id: Uuid) -> Result<()> {
        sqlx::query_as::<_, Brand>("SELECT * FROM brands WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(Error::BrandNotFound)?;
        Ok(())
    }

    async fn slug_taken(&self, slug: &str, exclude: Option<Uuid>) -> Result<bool> {
        let existing: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM products WHERE slug = $1")
                .bind(slug)
                .fetch_optional(&self.pool)
                .await?;
        Ok(matches!(existing, Some((id,)) if Some(id) != exclude))
    }
}

#[async_trait]
impl Catalog for ProductService {
    async fn product(&self, id: Uuid) -> Result<Product> {
        self.get(id).await
    }
}

/// URL slug from a display name: lowercase, hyphen-separated, alphanumeric.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for ch in text.trim().to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(ch);
            pending_dash = false;
        } else if ch.is_whitespace() || ch == '-' || ch == '_' {
            pending_dash = true;
        }
    }
    slug
}
