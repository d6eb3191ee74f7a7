//! `PostgreSQL` product repository.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use greencart_core::{NewProduct, Price, Product, ProductId, Rating};

use super::{ProductRepository, RepositoryError};

const PRODUCT_COLUMNS: &str = "id, name, description, category, price, offer_price, in_stock, \
                               rating, images, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    description: Vec<String>,
    category: String,
    price: Decimal,
    offer_price: Decimal,
    in_stock: bool,
    rating: i16,
    images: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let corrupt = |field: &str, e: &dyn std::fmt::Display| {
            RepositoryError::DataCorruption(format!("product {} has invalid {field}: {e}", row.id))
        };

        let price = Price::new(row.price).map_err(|e| corrupt("price", &e))?;
        let offer_price = Price::new(row.offer_price).map_err(|e| corrupt("offer price", &e))?;
        let rating = u8::try_from(row.rating)
            .map_err(|e| corrupt("rating", &e))
            .and_then(|stars| Rating::new(stars).map_err(|e| corrupt("rating", &e)))?;

        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            category: row.category,
            price,
            offer_price,
            in_stock: row.in_stock,
            rating,
            images: row.images,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_products(rows: Vec<ProductRow>) -> Result<Vec<Product>, RepositoryError> {
    rows.into_iter().map(Product::try_from).collect()
}

/// Products stored in `PostgreSQL`.
pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn create(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, ProductRow>(&format!(
            "INSERT INTO products
                 (name, description, category, price, offer_price, in_stock, rating, images)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.price)
        .bind(product.offer_price)
        .bind(product.in_stock)
        .bind(i16::from(product.rating.stars()))
        .bind(&product.images)
        .fetch_one(&self.pool)
        .await?
        .try_into()
    }

    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        into_products(rows)
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Product::try_from)
        .transpose()
    }

    async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        into_products(rows)
    }

    async fn existing_ids(&self, ids: &[ProductId]) -> Result<HashSet<ProductId>, RepositoryError> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }

        let found: Vec<i32> = sqlx::query_scalar("SELECT id FROM products WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(found.into_iter().map(ProductId::new).collect())
    }

    async fn update(&self, id: ProductId, product: NewProduct) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, ProductRow>(&format!(
            "UPDATE products
             SET name = $2, description = $3, category = $4, price = $5, offer_price = $6,
                 in_stock = $7, rating = $8, images = $9, updated_at = now()
             WHERE id = $1
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.price)
        .bind(product.offer_price)
        .bind(product.in_stock)
        .bind(i16::from(product.rating.stars()))
        .bind(&product.images)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?
        .try_into()
    }

    async fn set_stock(&self, id: ProductId, in_stock: bool) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, ProductRow>(&format!(
            "UPDATE products SET in_stock = $2, updated_at = now()
             WHERE id = $1
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(in_stock)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?
        .try_into()
    }

    async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
