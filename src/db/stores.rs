// src/db/stores.rs
//
// Contratos de persistência usados pelos serviços. As implementações
// Postgres ficam nos *_repo.rs; os testes usam as versões em memória.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        auth::{Role, User},
        product::{NewProduct, PriceChangeLog, Product, ProductFilter, ProductListing},
    },
};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Falha com `EmailAlreadyExists` se o e-mail já estiver em uso.
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, AppError>;
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, AppError>;

    async fn find_by_code(&self, product_code: &str) -> Result<Option<Product>, AppError>;

    /// Total de produtos que casam com o filtro, ignorando a paginação.
    async fn count(&self, filter: &ProductFilter) -> Result<i64, AppError>;

    async fn list(
        &self,
        filter: &ProductFilter,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<ProductListing>, AppError>;

    /// A unicidade de `product_code` é garantida aqui (constraint do banco).
    async fn insert(&self, product: NewProduct) -> Result<Product, AppError>;

    /// Persiste todos os campos mutáveis; `owner_id` e `created_at` nunca mudam.
    async fn update(&self, product: &Product) -> Result<Product, AppError>;

    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;

    /// Remove todo produto cuja validade (meia-noite UTC) é anterior a `now`.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError>;
}

#[async_trait]
pub trait PriceChangeLogStore: Send + Sync {
    /// Registro mais recente para o par (produto, ator).
    async fn latest_for(
        &self,
        product_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<PriceChangeLog>, AppError>;

    async fn append(
        &self,
        product_id: Uuid,
        user_id: Uuid,
        new_price: Decimal,
        changed_at: DateTime<Utc>,
    ) -> Result<PriceChangeLog, AppError>;

    /// Histórico completo do produto, do mais recente para o mais antigo.
    async fn list_for_product(&self, product_id: Uuid) -> Result<Vec<PriceChangeLog>, AppError>;
}
