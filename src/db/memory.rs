// src/db/memory.rs
//
// Implementação em memória dos stores, usada apenas nos testes.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{PriceChangeLogStore, ProductStore, UserStore},
    models::{
        auth::{Role, User},
        product::{
            NewProduct, OwnerSummary, PriceChangeLog, Product, ProductFilter, ProductListing,
            ProductStatus,
        },
    },
    services::expiry_reaper::is_expired,
};

#[derive(Default)]
pub struct MemoryDb {
    users: Mutex<Vec<User>>,
    products: Mutex<Vec<Product>>,
    price_logs: Mutex<Vec<PriceChangeLog>>,
    fail_product_writes: AtomicBool,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Faz `insert`/`update`/`delete_expired` falharem como um erro de banco.
    pub fn fail_product_writes(&self, fail: bool) {
        self.fail_product_writes.store(fail, Ordering::SeqCst);
    }

    pub fn price_logs(&self) -> Vec<PriceChangeLog> {
        self.price_logs.lock().unwrap().clone()
    }

    pub fn products(&self) -> Vec<Product> {
        self.products.lock().unwrap().clone()
    }

    pub fn seed_product(&self, product: Product) {
        self.products.lock().unwrap().push(product);
    }

    fn check_writable(&self) -> Result<(), AppError> {
        if self.fail_product_writes.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseError(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    fn matches(product: &Product, filter: &ProductFilter) -> bool {
        let name_ok = product
            .name
            .to_lowercase()
            .contains(&filter.search.to_lowercase());
        let category_ok = filter
            .category
            .as_deref()
            .is_none_or(|category| product.category == category);
        name_ok && category_ok
    }
}

#[async_trait]
impl UserStore for MemoryDb {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, AppError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == email) {
            return Err(AppError::EmailAlreadyExists);
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            role,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }
}

#[async_trait]
impl ProductStore for MemoryDb {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        let products = self.products.lock().unwrap();
        Ok(products.iter().find(|p| p.id == id).cloned())
    }

    async fn find_by_code(&self, product_code: &str) -> Result<Option<Product>, AppError> {
        let products = self.products.lock().unwrap();
        Ok(products
            .iter()
            .find(|p| p.product_code == product_code)
            .cloned())
    }

    async fn count(&self, filter: &ProductFilter) -> Result<i64, AppError> {
        let products = self.products.lock().unwrap();
        Ok(products.iter().filter(|p| Self::matches(p, filter)).count() as i64)
    }

    async fn list(
        &self,
        filter: &ProductFilter,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<ProductListing>, AppError> {
        let products = self.products.lock().unwrap();
        let users = self.users.lock().unwrap();
        let listing = products
            .iter()
            .rev()
            .filter(|p| Self::matches(p, filter))
            .skip(offset as usize)
            .take(limit as usize)
            .filter_map(|p| {
                let owner = users.iter().find(|u| u.id == p.owner_id)?;
                Some(ProductListing {
                    id: p.id,
                    name: p.name.clone(),
                    image: p.image.clone(),
                    product_code: p.product_code.clone(),
                    price: p.price,
                    category: p.category.clone(),
                    manufacture_date: p.manufacture_date,
                    expiry_date: p.expiry_date,
                    status: p.status,
                    created_at: p.created_at,
                    updated_at: p.updated_at,
                    owner: OwnerSummary {
                        id: owner.id,
                        name: owner.name.clone(),
                        email: owner.email.clone(),
                    },
                })
            })
            .collect();
        Ok(listing)
    }

    async fn insert(&self, product: NewProduct) -> Result<Product, AppError> {
        self.check_writable()?;
        let mut products = self.products.lock().unwrap();
        if products.iter().any(|p| p.product_code == product.product_code) {
            return Err(AppError::DuplicateProductCode);
        }
        let now = Utc::now();
        let created = Product {
            id: Uuid::new_v4(),
            name: product.name,
            image: product.image,
            product_code: product.product_code,
            price: product.price,
            category: product.category,
            manufacture_date: product.manufacture_date,
            expiry_date: product.expiry_date,
            owner_id: product.owner_id,
            status: ProductStatus::Active,
            created_at: now,
            updated_at: now,
        };
        products.push(created.clone());
        Ok(created)
    }

    async fn update(&self, product: &Product) -> Result<Product, AppError> {
        self.check_writable()?;
        let mut products = self.products.lock().unwrap();
        if products
            .iter()
            .any(|p| p.id != product.id && p.product_code == product.product_code)
        {
            return Err(AppError::DuplicateProductCode);
        }
        let stored = products
            .iter_mut()
            .find(|p| p.id == product.id)
            .ok_or(AppError::ProductNotFound)?;
        let owner_id = stored.owner_id;
        let created_at = stored.created_at;
        *stored = Product {
            owner_id,
            created_at,
            ..product.clone()
        };
        Ok(stored.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut products = self.products.lock().unwrap();
        let before = products.len();
        products.retain(|p| p.id != id);
        Ok(products.len() < before)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        self.check_writable()?;
        let mut products = self.products.lock().unwrap();
        let before = products.len();
        products.retain(|p| !is_expired(p.expiry_date, now));
        Ok((before - products.len()) as u64)
    }
}

#[async_trait]
impl PriceChangeLogStore for MemoryDb {
    async fn latest_for(
        &self,
        product_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<PriceChangeLog>, AppError> {
        let logs = self.price_logs.lock().unwrap();
        Ok(logs
            .iter()
            .filter(|l| l.product_id == product_id && l.user_id == user_id)
            .max_by_key(|l| l.changed_at)
            .cloned())
    }

    async fn append(
        &self,
        product_id: Uuid,
        user_id: Uuid,
        new_price: Decimal,
        changed_at: DateTime<Utc>,
    ) -> Result<PriceChangeLog, AppError> {
        let entry = PriceChangeLog {
            id: Uuid::new_v4(),
            product_id,
            user_id,
            new_price,
            changed_at,
        };
        self.price_logs.lock().unwrap().push(entry.clone());
        Ok(entry)
    }

    async fn list_for_product(&self, product_id: Uuid) -> Result<Vec<PriceChangeLog>, AppError> {
        let logs = self.price_logs.lock().unwrap();
        let mut entries: Vec<_> = logs
            .iter()
            .filter(|l| l.product_id == product_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.changed_at.cmp(&a.changed_at));
        Ok(entries)
    }
}
