// src/db/product_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::ProductStore,
    models::product::{NewProduct, Product, ProductFilter, ProductListing},
};

const PRODUCT_COLUMNS: &str = "id, name, image, product_code, price, category, \
     manufacture_date, expiry_date, owner_id, status, created_at, updated_at";

#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Padrão ILIKE de "contém", escapando os curingas digitados pelo usuário.
pub(crate) fn contains_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

// Converte violação de unicidade em erro de negócio.
fn map_unique_violation(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::DuplicateProductCode;
        }
    }
    e.into()
}

#[async_trait]
impl ProductStore for ProductRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    async fn find_by_code(&self, product_code: &str) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE product_code = $1"
        ))
        .bind(product_code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    async fn count(&self, filter: &ProductFilter) -> Result<i64, AppError> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM products
            WHERE name ILIKE $1
              AND ($2::text IS NULL OR category = $2)
            "#,
        )
        .bind(contains_pattern(&filter.search))
        .bind(filter.category.as_deref())
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    async fn list(
        &self,
        filter: &ProductFilter,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<ProductListing>, AppError> {
        // O dono é resolvido para a projeção mínima { id, name, email }
        let products = sqlx::query_as::<_, ProductListing>(
            r#"
            SELECT
                p.id, p.name, p.image, p.product_code, p.price, p.category,
                p.manufacture_date, p.expiry_date, p.status, p.created_at, p.updated_at,
                u.id AS owner_id, u.name AS owner_name, u.email AS owner_email
            FROM products p
            JOIN users u ON u.id = p.owner_id
            WHERE p.name ILIKE $1
              AND ($2::text IS NULL OR p.category = $2)
            ORDER BY p.created_at DESC, p.id
            OFFSET $3
            LIMIT $4
            "#,
        )
        .bind(contains_pattern(&filter.search))
        .bind(filter.category.as_deref())
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    async fn insert(&self, product: NewProduct) -> Result<Product, AppError> {
        sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products
                (name, image, product_code, price, category, manufacture_date, expiry_date, owner_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(&product.name)
        .bind(&product.image)
        .bind(&product.product_code)
        .bind(product.price)
        .bind(&product.category)
        .bind(product.manufacture_date)
        .bind(product.expiry_date)
        .bind(product.owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique_violation)
    }

    async fn update(&self, product: &Product) -> Result<Product, AppError> {
        sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products SET
                name = $2,
                image = $3,
                product_code = $4,
                price = $5,
                category = $6,
                manufacture_date = $7,
                expiry_date = $8,
                status = $9,
                updated_at = $10
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.image)
        .bind(&product.product_code)
        .bind(product.price)
        .bind(&product.category)
        .bind(product.manufacture_date)
        .bind(product.expiry_date)
        .bind(product.status)
        .bind(product.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_unique_violation)?
        // Pode ter sido removido (ex.: pelo reaper) entre a leitura e a escrita
        .ok_or(AppError::ProductNotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM products WHERE expiry_date::timestamp < $1")
            .bind(now.naive_utc())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
