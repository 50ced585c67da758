// src/services/product_service.rs

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{
    common::error::AppError,
    db::ProductStore,
    models::{
        auth::Actor,
        product::{
            validate_date_order, CreateProductInput, PageRequest, PriceChangeLog, Product,
            ProductFilter, ProductPage, UpdateProductInput,
        },
    },
    services::{
        image_lifecycle::ImageLifecycle,
        price_governance::{PriceDecision, PriceGovernance},
    },
    storage::ImageUpload,
};

/// Orquestra o CRUD de produtos em volta da governança de preço e do
/// ciclo de vida das imagens. Nada é persistido antes de todas as regras passarem.
#[derive(Clone)]
pub struct ProductService {
    products: Arc<dyn ProductStore>,
    governance: PriceGovernance,
    images: ImageLifecycle,
}

impl ProductService {
    pub fn new(
        products: Arc<dyn ProductStore>,
        governance: PriceGovernance,
        images: ImageLifecycle,
    ) -> Self {
        Self {
            products,
            governance,
            images,
        }
    }

    pub fn store(&self) -> Arc<dyn ProductStore> {
        self.products.clone()
    }

    // --- CREATE ---
    pub async fn create(
        &self,
        input: CreateProductInput,
        image: Option<ImageUpload>,
        actor: &Actor,
    ) -> Result<Product, AppError> {
        let mut new_product = input.into_new_product(actor.id)?;

        // Verificação amigável; a constraint do banco é quem garante de fato.
        if self
            .products
            .find_by_code(&new_product.product_code)
            .await?
            .is_some()
        {
            return Err(AppError::DuplicateProductCode);
        }

        if let Some(upload) = &image {
            new_product.image = Some(self.images.store(upload).await?);
        }
        let stored_image = new_product.image.clone();

        match self.products.insert(new_product).await {
            Ok(product) => {
                tracing::info!(product_id = %product.id, owner = %actor.id, "product created");
                Ok(product)
            }
            Err(e) => {
                self.images.release(stored_image.as_deref());
                Err(e)
            }
        }
    }

    // --- READ ---
    pub async fn get(&self, id: Uuid) -> Result<Product, AppError> {
        self.products
            .find_by_id(id)
            .await?
            .ok_or(AppError::ProductNotFound)
    }

    pub async fn list(&self, page: PageRequest, filter: ProductFilter) -> Result<ProductPage, AppError> {
        let total = self.products.count(&filter).await?;
        let products = self
            .products
            .list(&filter, page.offset(), page.limit)
            .await?;

        Ok(ProductPage {
            products,
            total,
            page: page.page,
            total_pages: page.total_pages(total),
        })
    }

    pub async fn price_history(&self, id: Uuid) -> Result<Vec<PriceChangeLog>, AppError> {
        let product = self.get(id).await?;
        self.governance.history(product.id).await
    }

    // --- UPDATE ---
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateProductInput,
        image: Option<ImageUpload>,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<Product, AppError> {
        let current = self.get(id).await?;
        input.validate()?;

        // 1. Governança de preço: qualquer falha aborta o update inteiro
        let decision = self
            .governance
            .evaluate(&current, input.price, actor, now)
            .await?;

        // 2. Código novo não pode pertencer a outro produto
        if let Some(code) = input.product_code.as_deref() {
            if code != current.product_code && self.products.find_by_code(code).await?.is_some() {
                return Err(AppError::DuplicateProductCode);
            }
        }

        // 3. Aplica os campos informados e valida o resultado
        let mut updated = current.clone();
        input.apply_to(&mut updated);
        if let Err(e) = validate_date_order(updated.manufacture_date, updated.expiry_date) {
            let mut errors = ValidationErrors::new();
            errors.add("expiry_date", e);
            return Err(errors.into());
        }
        if let PriceDecision::Accepted(price) = decision {
            updated.price = price;
        }

        // 4. Nova imagem só é gravada depois que tudo acima passou
        let new_image = match &image {
            Some(upload) => Some(self.images.store(upload).await?),
            None => None,
        };
        if new_image.is_some() {
            updated.image = new_image.clone();
        }
        updated.updated_at = now;

        let saved = match self.products.update(&updated).await {
            Ok(saved) => saved,
            Err(e) => {
                self.images.release(new_image.as_deref());
                return Err(e);
            }
        };

        // 5. Efeitos posteriores à escrita do registro
        self.images
            .reconcile(current.image.as_deref(), saved.image.as_deref());

        if let PriceDecision::Accepted(price) = decision {
            self.governance
                .record_price_change(saved.id, actor.id, price, now)
                .await?;
        }

        tracing::info!(product_id = %saved.id, user_id = %actor.id, "product updated");
        Ok(saved)
    }

    // --- DELETE ---
    pub async fn delete(&self, id: Uuid) -> Result<Product, AppError> {
        let product = self.get(id).await?;

        if !self.products.delete(id).await? {
            return Err(AppError::ProductNotFound);
        }
        // O registro já foi removido; a imagem sai em segundo plano.
        self.images.release(product.image.as_deref());

        tracing::info!(product_id = %product.id, "product deleted");
        Ok(product)
    }
}
