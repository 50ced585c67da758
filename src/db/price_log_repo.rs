// src/db/price_log_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{common::error::AppError, db::PriceChangeLogStore, models::product::PriceChangeLog};

#[derive(Clone)]
pub struct PriceChangeLogRepository {
    pool: PgPool,
}

impl PriceChangeLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PriceChangeLogStore for PriceChangeLogRepository {
    async fn latest_for(
        &self,
        product_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<PriceChangeLog>, AppError> {
        let entry = sqlx::query_as::<_, PriceChangeLog>(
            r#"
            SELECT id, product_id, user_id, new_price, changed_at
            FROM price_change_logs
            WHERE product_id = $1 AND user_id = $2
            ORDER BY changed_at DESC
            LIMIT 1
            "#,
        )
        .bind(product_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entry)
    }

    /// Registra uma alteração de preço no livro-razão (auditoria).
    async fn append(
        &self,
        product_id: Uuid,
        user_id: Uuid,
        new_price: Decimal,
        changed_at: DateTime<Utc>,
    ) -> Result<PriceChangeLog, AppError> {
        let entry = sqlx::query_as::<_, PriceChangeLog>(
            r#"
            INSERT INTO price_change_logs (product_id, user_id, new_price, changed_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, product_id, user_id, new_price, changed_at
            "#,
        )
        .bind(product_id)
        .bind(user_id)
        .bind(new_price)
        .bind(changed_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(entry)
    }

    async fn list_for_product(&self, product_id: Uuid) -> Result<Vec<PriceChangeLog>, AppError> {
        let entries = sqlx::query_as::<_, PriceChangeLog>(
            r#"
            SELECT id, product_id, user_id, new_price, changed_at
            FROM price_change_logs
            WHERE product_id = $1
            ORDER BY changed_at DESC
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }
}
